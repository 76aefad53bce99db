//! Serialises a [`NodeConfiguration`] back into CTD documents.

use super::{escape_attribute, escape_text, names};
use crate::error::{DescriptorError, ParameterError};
use crate::model::NodeConfiguration;
use crate::params::{KEY_SEPARATOR, Parameter, ParameterValue, ValueKind};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

/// Stages parameter values and writes the configuration as a CTD.
///
/// Reading the written document reproduces every parameter's string
/// representation; the XML itself is not guaranteed to be byte-identical
/// to the original.
#[derive(Debug, Clone)]
pub struct DescriptorWriter {
    config: NodeConfiguration,
}

impl DescriptorWriter {
    /// Creates a writer that owns `config`.
    #[must_use]
    pub fn new(config: NodeConfiguration) -> Self {
        Self { config }
    }

    /// Stages a value for a parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError`] if the key is unknown or the value is
    /// rejected; nothing is staged in that case.
    pub fn set_parameter_value(&mut self, key: &str, value: &str) -> Result<(), ParameterError> {
        self.config.set_value_from_string(key, value)
    }

    /// Appends one element to a list parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError`] if the key is unknown, not a list, or the
    /// element is rejected.
    pub fn set_multi_parameter_value(
        &mut self,
        key: &str,
        value: &str,
    ) -> Result<(), ParameterError> {
        self.config.set_multi_value(key, value)
    }

    /// The configuration including staged values.
    #[must_use]
    pub fn config(&self) -> &NodeConfiguration {
        &self.config
    }

    /// Returns the configuration including staged values.
    #[must_use]
    pub fn into_inner(self) -> NodeConfiguration {
        self.config
    }

    /// Writes the full descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::Io`] if the destination fails.
    pub fn write(&self, destination: impl Write) -> Result<(), DescriptorError> {
        write_descriptor(&self.config, destination)
    }

    /// Writes the full descriptor to a file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::Io`] if the file cannot be written.
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<(), DescriptorError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.write(std::fs::File::create(path)?)
    }

    /// Writes only the `PARAMETERS` tree, the tool's configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::Io`] if the destination fails.
    pub fn write_params(&self, destination: impl Write) -> Result<(), DescriptorError> {
        write_parameters(&self.config, self.config.parameters.iter(), destination)
    }

    /// The full descriptor as a string.
    #[must_use]
    pub fn to_xml_string(&self) -> String {
        descriptor_xml(&self.config)
    }
}

/// Writes a full descriptor for `config` to `destination`.
///
/// # Errors
///
/// Returns [`DescriptorError::Io`] if the destination fails.
pub fn write_descriptor(
    config: &NodeConfiguration,
    mut destination: impl Write,
) -> Result<(), DescriptorError> {
    destination.write_all(descriptor_xml(config).as_bytes())?;
    destination.flush()?;
    Ok(())
}

/// Writes a bare `PARAMETERS` document holding `parameters`.
///
/// `config` supplies the `NODE` descriptions.
///
/// # Errors
///
/// Returns [`DescriptorError::Io`] if the destination fails.
pub fn write_parameters<'p>(
    config: &NodeConfiguration,
    parameters: impl IntoIterator<Item = &'p Parameter>,
    mut destination: impl Write,
) -> Result<(), DescriptorError> {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    parameters_xml(&mut out, config, parameters, 0);
    destination.write_all(out.as_bytes())?;
    destination.flush()?;
    Ok(())
}

fn descriptor_xml(config: &NodeConfiguration) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        out,
        r#"<{} name="{}" version="{}" category="{}" docurl="{}">"#,
        names::TOOL,
        escape_attribute(&config.name),
        escape_attribute(&config.version),
        escape_attribute(&config.category),
        escape_attribute(&config.doc_url),
    );

    for (tag, text) in [
        (names::DESCRIPTION, &config.description),
        (names::MANUAL, &config.manual),
        (names::EXECUTABLE_NAME, &config.executable_name),
        (names::EXECUTABLE_PATH, &config.executable_path),
    ] {
        if !text.is_empty() {
            let _ = writeln!(out, "  <{tag}>{}</{tag}>", escape_text(text));
        }
    }

    if !config.citations.is_empty() {
        let _ = writeln!(out, "  <{}>", names::CITATIONS);
        for citation in &config.citations {
            let _ = writeln!(
                out,
                r#"    <{} doi="{}" url="{}"/>"#,
                names::CITATION,
                escape_attribute(&citation.doi),
                escape_attribute(&citation.url),
            );
        }
        let _ = writeln!(out, "  </{}>", names::CITATIONS);
    }

    let _ = writeln!(out, "  <{}>", names::CLI);
    for element in &config.cli {
        let _ = writeln!(
            out,
            r#"    <{} optionIdentifier="{}" isList="{}" isRequired="{}">"#,
            names::CLI_ELEMENT,
            escape_attribute(&element.option_identifier),
            element.is_list,
            element.is_required,
        );
        for mapping in &element.mappings {
            let _ = writeln!(
                out,
                r#"      <{} referenceName="{}"/>"#,
                names::MAPPING,
                escape_attribute(&mapping.reference_name),
            );
        }
        let _ = writeln!(out, "    </{}>", names::CLI_ELEMENT);
    }
    let _ = writeln!(out, "  </{}>", names::CLI);

    parameters_xml(&mut out, config, config.parameters.iter(), 1);
    let _ = writeln!(out, "</{}>", names::TOOL);
    out
}

/// Nested `NODE` section rebuilt from dot-joined keys.
#[derive(Default)]
struct Section<'p> {
    entries: Vec<Entry<'p>>,
}

enum Entry<'p> {
    Node(String, Section<'p>),
    Item(&'p Parameter),
}

impl<'p> Section<'p> {
    fn insert(&mut self, segments: &[&str], parameter: &'p Parameter) {
        let [head, rest @ ..] = segments else {
            return;
        };
        if rest.is_empty() {
            self.entries.push(Entry::Item(parameter));
            return;
        }

        let position = self
            .entries
            .iter()
            .position(|entry| matches!(entry, Entry::Node(name, _) if name == head));
        match position {
            Some(i) => {
                if let Entry::Node(_, section) = &mut self.entries[i] {
                    section.insert(rest, parameter);
                }
            }
            None => {
                let mut section = Section::default();
                section.insert(rest, parameter);
                self.entries.push(Entry::Node((*head).to_string(), section));
            }
        }
    }
}

fn parameters_xml<'p>(
    out: &mut String,
    config: &NodeConfiguration,
    parameters: impl IntoIterator<Item = &'p Parameter>,
    depth: usize,
) {
    let mut root = Section::default();
    for parameter in parameters {
        let segments: Vec<&str> = parameter.key().split(KEY_SEPARATOR).collect();
        root.insert(&segments, parameter);
    }

    let indent = "  ".repeat(depth);
    let _ = writeln!(
        out,
        r#"{indent}<{} version="{}">"#,
        names::PARAMETERS,
        names::PARAMETERS_VERSION
    );
    section_xml(out, &config.node_descriptions, &root, "", depth + 1);
    let _ = writeln!(out, "{indent}</{}>", names::PARAMETERS);
}

fn section_xml(
    out: &mut String,
    descriptions: &BTreeMap<String, String>,
    section: &Section<'_>,
    prefix: &str,
    depth: usize,
) {
    let indent = "  ".repeat(depth);
    for entry in &section.entries {
        match entry {
            Entry::Node(name, child) => {
                let key = crate::params::join_key(prefix, name);
                let description = descriptions.get(&key).map_or("", String::as_str);
                let _ = writeln!(
                    out,
                    r#"{indent}<{} name="{}" description="{}">"#,
                    names::NODE,
                    escape_attribute(name),
                    escape_attribute(description),
                );
                section_xml(out, descriptions, child, &key, depth + 1);
                let _ = writeln!(out, "{indent}</{}>", names::NODE);
            }
            Entry::Item(parameter) => item_xml(out, parameter, &indent),
        }
    }
}

fn item_xml(out: &mut String, parameter: &Parameter, indent: &str) {
    let kind = parameter.kind();
    let mut attributes = format!(
        r#"name="{}" type="{}" description="{}" required="{}" advanced="{}""#,
        escape_attribute(parameter.name()),
        kind.mnemonic(),
        escape_attribute(parameter.description()),
        !parameter.is_optional(),
        parameter.is_advanced(),
    );
    let restrictions = kind.restrictions();
    if !restrictions.is_empty() {
        let _ = write!(
            attributes,
            r#" restrictions="{}""#,
            escape_attribute(&restrictions)
        );
    }
    if let ValueKind::File { formats, .. } = kind
        && !formats.is_empty()
    {
        let formats = formats
            .iter()
            .map(|f| format!("*.{f}"))
            .collect::<Vec<_>>()
            .join(",");
        let _ = write!(
            attributes,
            r#" supported_formats="{}""#,
            escape_attribute(&formats)
        );
    }

    match parameter.value() {
        ParameterValue::List(items) => {
            if let Some(size) = parameter.declared_size() {
                let _ = write!(attributes, r#" size="{size}""#);
            }
            let _ = writeln!(out, "{indent}<{} {attributes}>", names::ITEMLIST);
            for item in items {
                let _ = writeln!(
                    out,
                    r#"{indent}  <{} value="{}"/>"#,
                    names::LISTITEM,
                    escape_attribute(item)
                );
            }
            let _ = writeln!(out, "{indent}</{}>", names::ITEMLIST);
        }
        scalar => {
            let value = match scalar {
                ParameterValue::Scalar(s) => s.as_str(),
                _ => "",
            };
            let _ = writeln!(
                out,
                r#"{indent}<{} value="{}" {attributes}/>"#,
                names::ITEM,
                escape_attribute(value)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DescriptorReader;
    use crate::model::CliElement;
    use crate::params::{Bounds, FileDirection};

    fn config() -> NodeConfiguration {
        let mut config = NodeConfiguration::new("RoundTrip").unwrap();
        config.version = "2.0".to_string();
        config.manual = "Reads <input> & writes \"output\"".to_string();
        config
            .add_parameter(
                Parameter::new(
                    "rt.1.algorithm.threshold",
                    ValueKind::Double {
                        bounds: Bounds::parse("0:1").unwrap(),
                    },
                )
                .with_default("0.25")
                .unwrap(),
            )
            .unwrap();
        config
            .add_parameter(Parameter::new(
                "rt.1.mode",
                ValueKind::Choice {
                    allowed: vec!["fast".to_string(), "exact".to_string()],
                },
            ))
            .unwrap();
        config
            .add_parameter(Parameter::list(
                "rt.in",
                ValueKind::File {
                    direction: FileDirection::Input,
                    formats: vec!["fasta".to_string()],
                },
            ))
            .unwrap();
        config
            .add_parameter(Parameter::new("rt.note", ValueKind::String))
            .unwrap();
        config.cli.push(CliElement::new("-in", ["rt.in"]).list());
        config
    }

    #[test]
    fn test_round_trip_preserves_values() {
        let mut writer = DescriptorWriter::new(config());
        writer.set_parameter_value("rt.1.mode", "exact").unwrap();
        writer.set_multi_parameter_value("rt.in", "a b.fasta").unwrap();
        writer.set_multi_parameter_value("rt.in", "").unwrap();
        writer
            .set_parameter_value("rt.note", "line one\nline <two>")
            .unwrap();

        let reread = DescriptorReader::new(writer.to_xml_string()).read().unwrap();
        for parameter in writer.config().parameters.iter() {
            assert_eq!(
                reread.string_representation(parameter.key()).unwrap(),
                parameter.string_representation(),
                "value of {}",
                parameter.key()
            );
        }
        assert_eq!(reread.manual, writer.config().manual);
        assert_eq!(reread.cli, writer.config().cli);
        assert_eq!(reread.inputs, writer.config().inputs);
    }

    #[test]
    fn test_control_characters_never_reach_the_document() {
        let mut writer = DescriptorWriter::new(config());
        assert!(matches!(
            writer.set_parameter_value("rt.note", "a\u{1}b"),
            Err(ParameterError::Validation { .. })
        ));
        assert!(writer.set_multi_parameter_value("rt.in", "x\u{7}.fasta").is_err());

        writer
            .set_parameter_value("rt.note", "tab\tcr\r\nend \u{e9}")
            .unwrap();
        let reread = DescriptorReader::new(writer.to_xml_string()).read().unwrap();
        assert_eq!(
            reread.string_representation("rt.note").unwrap(),
            "tab\tcr\r\nend \u{e9}"
        );
        assert_eq!(reread.string_representation("rt.in").unwrap(), "");
    }

    #[test]
    fn test_unset_optional_written_empty() {
        let writer = DescriptorWriter::new(config());
        let xml = writer.to_xml_string();
        assert!(xml.contains(r#"<ITEM value="" name="note" type="string""#));
    }

    #[test]
    fn test_rejected_stage_leaves_value() {
        let mut writer = DescriptorWriter::new(config());
        assert!(writer.set_parameter_value("rt.1.algorithm.threshold", "3").is_err());
        assert_eq!(
            writer
                .config()
                .string_representation("rt.1.algorithm.threshold")
                .unwrap(),
            "0.25"
        );
    }

    #[test]
    fn test_params_document_applies_back() {
        let mut writer = DescriptorWriter::new(config());
        writer.set_parameter_value("rt.1.mode", "fast").unwrap();
        let mut params = Vec::new();
        writer.write_params(&mut params).unwrap();

        let mut fresh = config();
        DescriptorReader::new(String::from_utf8(params).unwrap())
            .apply_parameters(&mut fresh)
            .unwrap();
        assert_eq!(fresh.string_representation("rt.1.mode").unwrap(), "fast");
    }

    #[test]
    fn test_write_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/tool.ctd");
        DescriptorWriter::new(config()).write_to_path(&path).unwrap();
        let reread = DescriptorReader::open(&path).unwrap().read().unwrap();
        assert_eq!(reread.name, "RoundTrip");
    }
}
