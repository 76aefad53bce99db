//! Configuration-file encoding of a command line.
//!
//! The resolved parameters are written to a file in the work directory and
//! the tool receives only `<switch> <path>`.

use super::{CommandGenerator, ResolvedArgument, resolve_arguments};
use crate::descriptor::write_parameters;
use crate::error::{BoxError, CommandError};
use crate::model::NodeConfiguration;
use crate::params::{KEY_SEPARATOR, Parameter};
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Layout of the generated configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFileFormat {
    /// A bare `PARAMETERS` XML document.
    #[default]
    Params,
    /// A JSON object nested along the dot-joined keys.
    Json,
}

/// Writes the resolved parameters to a file and passes its path.
#[derive(Debug, Clone)]
pub struct ConfigFileCommandGenerator {
    switch: String,
    work_dir: PathBuf,
    file_name: String,
    format: ConfigFileFormat,
}

impl ConfigFileCommandGenerator {
    /// Creates a generator writing `file_name` into `work_dir` and passing
    /// it after `switch`, e.g. `-ini`.
    #[must_use]
    pub fn new(
        switch: impl Into<String>,
        work_dir: impl Into<PathBuf>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            switch: switch.into(),
            work_dir: work_dir.into(),
            file_name: file_name.into(),
            format: ConfigFileFormat::default(),
        }
    }

    /// Selects the file layout.
    #[must_use]
    pub fn with_format(mut self, format: ConfigFileFormat) -> Self {
        self.format = format;
        self
    }

    /// Path of the file that [`CommandGenerator::generate_command`] writes.
    #[must_use]
    pub fn file_path(&self) -> PathBuf {
        self.work_dir.join(&self.file_name)
    }

    fn write_file(
        &self,
        path: &Path,
        config: &NodeConfiguration,
        exposed: &[Parameter],
    ) -> Result<(), BoxError> {
        fs::create_dir_all(&self.work_dir)?;
        let file = BufWriter::new(File::create(path)?);
        match self.format {
            ConfigFileFormat::Params => write_parameters(config, exposed, file)?,
            ConfigFileFormat::Json => serde_json::to_writer_pretty(file, &json_tree(exposed)?)?,
        }
        Ok(())
    }
}

impl CommandGenerator for ConfigFileCommandGenerator {
    fn generate_command(&self, config: &NodeConfiguration) -> Result<Vec<String>, CommandError> {
        let path = self.file_path();
        let resolved = resolve_arguments(config)?;
        let exposed = exposed_parameters(&resolved).map_err(|source| CommandError::ConfigFile {
            path: path.clone(),
            source,
        })?;

        self.write_file(&path, config, &exposed)
            .map_err(|source| CommandError::ConfigFile {
                path: path.clone(),
                source,
            })?;

        info!(
            tool = %config.name,
            path = %path.display(),
            parameters = exposed.len(),
            "Wrote configuration file"
        );
        Ok(vec![self.switch.clone(), path.display().to_string()])
    }
}

/// Copies of the mapped parameters holding exactly the resolved values.
///
/// Each parameter appears once, in first-mapping order.
fn exposed_parameters(resolved: &[ResolvedArgument<'_>]) -> Result<Vec<Parameter>, BoxError> {
    let mut exposed: Vec<Parameter> = Vec::new();

    for value in resolved.iter().flat_map(|argument| argument.values.iter()) {
        if exposed.iter().any(|p| p.key() == value.parameter.key()) {
            continue;
        }
        let mut parameter = value.parameter.clone();
        parameter.unset();
        if parameter.is_list() {
            for element in &value.values {
                parameter.set_multi_value(element)?;
            }
        } else if let Some(first) = value.values.first() {
            parameter.set_value_from_string(first)?;
        }
        exposed.push(parameter);
    }

    Ok(exposed)
}

fn json_tree(parameters: &[Parameter]) -> Result<Value, BoxError> {
    let mut root = Map::new();

    for parameter in parameters {
        let leaf = if parameter.is_list() {
            Value::Array(
                parameter
                    .values()
                    .into_iter()
                    .map(|v| Value::String(v.to_string()))
                    .collect(),
            )
        } else {
            Value::String(parameter.string_representation())
        };

        let segments: Vec<&str> = parameter.key().split(KEY_SEPARATOR).collect();
        let Some((last, parents)) = segments.split_last() else {
            continue;
        };
        let mut node = &mut root;
        for segment in parents {
            let child = node
                .entry((*segment).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            node = child.as_object_mut().ok_or_else(|| {
                format!(
                    "key '{}' nests below a value at '{segment}'",
                    parameter.key()
                )
            })?;
        }
        if node.insert((*last).to_string(), leaf).is_some() {
            return Err(format!("key '{}' collides with a section", parameter.key()).into());
        }
    }

    debug!(entries = parameters.len(), "Built JSON parameter tree");
    Ok(Value::Object(root))
}
