//! Assigning incoming files to input ports.
//!
//! Content types are resolved through an injected [`ContentTypeResolver`];
//! [`ExtensionRegistry`] is the extension-based implementation.

use crate::error::ImportError;
use crate::model::NodeConfiguration;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maps a file to a MIME-like content type string.
pub trait ContentTypeResolver {
    /// Content type of `file`, or `None` if it is not recognised.
    fn content_type(&self, file: &Path) -> Option<String>;
}

/// Resolves content types by file-name extension.
///
/// The longest matching extension wins, so `reads.fasta.gz` resolves by
/// `fasta.gz` before `gz`. Types registered for the same extension are
/// tried in lexicographic order.
///
/// # Example
///
/// ```
/// use ctd_sdk::import::{ContentTypeResolver, ExtensionRegistry};
/// use std::path::Path;
///
/// let registry = ExtensionRegistry::new()
///     .with("gz", "application/gzip")
///     .with("fasta.gz", "chemical/x-fasta-gz");
/// assert_eq!(
///     registry.content_type(Path::new("reads.fasta.gz")).as_deref(),
///     Some("chemical/x-fasta-gz")
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExtensionRegistry {
    types: BTreeMap<String, Vec<String>>,
}

impl ExtensionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `content_type` for `extension`, given without the dot.
    pub fn register(&mut self, extension: &str, content_type: impl Into<String>) {
        let types = self
            .types
            .entry(extension.trim_start_matches('.').to_ascii_lowercase())
            .or_default();
        let content_type = content_type.into();
        if let Err(position) = types.binary_search(&content_type) {
            types.insert(position, content_type);
        }
    }

    /// Builder form of [`ExtensionRegistry::register`].
    #[must_use]
    pub fn with(mut self, extension: &str, content_type: impl Into<String>) -> Self {
        self.register(extension, content_type);
        self
    }
}

impl ContentTypeResolver for ExtensionRegistry {
    fn content_type(&self, file: &Path) -> Option<String> {
        let name = file.file_name()?.to_string_lossy().to_ascii_lowercase();
        self.types
            .iter()
            .filter(|(ext, _)| {
                name.len() > ext.len() + 1
                    && name.ends_with(ext.as_str())
                    && name.as_bytes()[name.len() - ext.len() - 1] == b'.'
            })
            .max_by_key(|(ext, _)| ext.len())
            .and_then(|(_, types)| types.first().cloned())
    }
}

/// Files of one content type, in the order they were offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBatch {
    /// Content type shared by every file.
    pub content_type: String,
    /// The files.
    pub files: Vec<PathBuf>,
}

/// Groups incoming files into a single-typed batch.
#[derive(Debug)]
pub struct FileImporter<'r, R: ContentTypeResolver> {
    resolver: &'r R,
}

impl<'r, R: ContentTypeResolver> FileImporter<'r, R> {
    /// Creates an importer using `resolver`.
    pub fn new(resolver: &'r R) -> Self {
        Self { resolver }
    }

    /// Resolves every file and checks that they share the first file's
    /// content type.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::NoFiles`] for an empty batch,
    /// [`ImportError::UnknownContentType`] for an unrecognised file and
    /// [`ImportError::MixedContentTypes`] if the types differ.
    pub fn import<I, P>(&self, files: I) -> Result<FileBatch, ImportError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let files: Vec<PathBuf> = files.into_iter().map(Into::into).collect();
        let mut expected: Option<String> = None;

        for file in &files {
            let found = self
                .resolver
                .content_type(file)
                .ok_or_else(|| ImportError::UnknownContentType { file: file.clone() })?;
            match &expected {
                None => expected = Some(found),
                Some(first) if *first != found => {
                    return Err(ImportError::MixedContentTypes {
                        expected: first.clone(),
                        found,
                        file: file.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        let content_type = expected.ok_or(ImportError::NoFiles)?;
        debug!(content_type = %content_type, files = files.len(), "Imported file batch");
        Ok(FileBatch {
            content_type,
            files,
        })
    }
}

/// Sets the parameter behind `port_name` to the files of `batch`.
///
/// # Errors
///
/// Returns [`ImportError::UnknownPort`], [`ImportError::TooManyFiles`] for
/// several files on a single-file port, [`ImportError::UnsupportedFormat`]
/// for a file the port does not accept, or [`ImportError::Parameter`] if
/// the value is rejected. The configuration is unchanged on error.
pub fn populate_port(
    config: &mut NodeConfiguration,
    port_name: &str,
    batch: &FileBatch,
) -> Result<(), ImportError> {
    let port = config
        .port(port_name)
        .ok_or_else(|| ImportError::UnknownPort {
            port: port_name.to_string(),
        })?;

    if !port.multiple && batch.files.len() > 1 {
        return Err(ImportError::TooManyFiles {
            port: port.name.clone(),
            count: batch.files.len(),
        });
    }
    if let Some(file) = batch
        .files
        .iter()
        .find(|file| !port.accepts(&file.to_string_lossy()))
    {
        return Err(ImportError::UnsupportedFormat {
            port: port.name.clone(),
            file: file.clone(),
        });
    }

    let key = port.parameter_key.clone();
    let mut staged = config.parameters.parameter(&key)?.clone();
    staged.unset();
    if port.multiple {
        for file in &batch.files {
            staged.set_multi_value(&file.to_string_lossy())?;
        }
    } else if let Some(file) = batch.files.first() {
        staged.set_value_from_string(&file.to_string_lossy())?;
    }
    config.set_value_from_string(&key, &staged.string_representation())?;
    debug!(port = port_name, key = %key, files = batch.files.len(), "Populated port");
    Ok(())
}
