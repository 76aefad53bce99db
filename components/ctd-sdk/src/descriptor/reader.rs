//! Parses CTD documents into a [`NodeConfiguration`].

use super::names;
use crate::error::DescriptorError;
use crate::model::{Citation, CliElement, Mapping, NodeConfiguration, validate_tool_name};
use crate::params::{Bounds, FileDirection, Parameter, ValueKind, join_key};
use roxmltree::{Document, Node};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Reads a CTD document.
///
/// # Example
///
/// ```
/// use ctd_sdk::descriptor::DescriptorReader;
///
/// let xml = r#"<tool name="Echo">
///   <PARAMETERS>
///     <NODE name="echo">
///       <ITEM name="text" value="hello" type="string"/>
///     </NODE>
///   </PARAMETERS>
/// </tool>"#;
///
/// let config = DescriptorReader::new(xml).read().unwrap();
/// assert_eq!(config.string_representation("echo.text").unwrap(), "hello");
/// ```
#[derive(Debug, Clone)]
pub struct DescriptorReader {
    document: String,
}

impl DescriptorReader {
    /// Creates a reader over an in-memory document.
    #[must_use]
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
        }
    }

    /// Creates a reader over a document on disk.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::Io`] if the file cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DescriptorError> {
        Ok(Self::new(std::fs::read_to_string(path)?))
    }

    /// Opens and parses a descriptor file in one step.
    ///
    /// # Errors
    ///
    /// See [`DescriptorReader::open`] and [`DescriptorReader::read`].
    pub fn read_file(path: impl AsRef<Path>) -> Result<NodeConfiguration, DescriptorError> {
        Self::open(path)?.read()
    }

    /// Parses the document into a fully populated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::Invalid`] with the offending element path
    /// for malformed documents, [`DescriptorError::InvalidNodeName`] for a
    /// tool name outside the naming grammar and
    /// [`DescriptorError::DuplicateNode`] for repeated `NODE` identifiers.
    pub fn read(&self) -> Result<NodeConfiguration, DescriptorError> {
        let doc = Document::parse(&self.document)
            .map_err(|e| DescriptorError::invalid(names::TOOL, e))?;
        let root = doc.root_element();
        if root.tag_name().name() != names::TOOL {
            return Err(DescriptorError::invalid(
                root.tag_name().name(),
                format!("expected root element <{}>", names::TOOL),
            ));
        }

        let name = required_attribute(root, "name", names::TOOL)?;
        validate_tool_name(name)?;

        let mut config = NodeConfiguration {
            name: name.to_string(),
            version: root.attribute("version").unwrap_or_default().to_string(),
            category: root.attribute("category").unwrap_or_default().to_string(),
            doc_url: root.attribute("docurl").unwrap_or_default().to_string(),
            ..NodeConfiguration::default()
        };

        let mut cli = None;
        for child in root.children().filter(Node::is_element) {
            match child.tag_name().name() {
                names::DESCRIPTION => config.description = element_text(child),
                names::MANUAL => config.manual = element_text(child),
                names::EXECUTABLE_NAME => config.executable_name = element_text(child),
                names::EXECUTABLE_PATH => config.executable_path = element_text(child),
                names::CITATIONS => config.citations = read_citations(child),
                names::PARAMETERS => {
                    ParameterWalker::new(&mut config).walk_section(child, "", "tool/PARAMETERS")?;
                }
                names::CLI => cli = Some(child),
                other => debug!(element = other, "Ignoring unknown descriptor element"),
            }
        }

        // Mappings are checked against the parameter tree, so the cli
        // section is read last whatever its position in the document.
        if let Some(cli) = cli {
            config.cli = read_cli(cli, &config)?;
        }

        debug!(
            tool = %config.name,
            parameters = config.parameters.len(),
            cli_elements = config.cli.len(),
            "Read descriptor"
        );
        Ok(config)
    }

    /// Loads the values of a parameters document into an existing
    /// configuration.
    ///
    /// The document is a bare `PARAMETERS` tree as produced by
    /// [`super::write_parameters`]. Every item must exist in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::Invalid`] if the document is malformed,
    /// names an unknown parameter or carries a value the parameter rejects.
    /// On error `config` is left unchanged.
    pub fn apply_parameters(
        &self,
        config: &mut NodeConfiguration,
    ) -> Result<(), DescriptorError> {
        let doc = Document::parse(&self.document)
            .map_err(|e| DescriptorError::invalid(names::PARAMETERS, e))?;
        let root = doc.root_element();
        if root.tag_name().name() != names::PARAMETERS {
            return Err(DescriptorError::invalid(
                root.tag_name().name(),
                format!("expected root element <{}>", names::PARAMETERS),
            ));
        }

        let mut loaded = NodeConfiguration::default();
        ParameterWalker::new(&mut loaded).walk_section(root, "", names::PARAMETERS)?;

        let mut updated = config.parameters.clone();
        for parameter in &loaded.parameters {
            updated
                .set_value_from_string(parameter.key(), &parameter.string_representation())
                .map_err(|e| DescriptorError::invalid(names::PARAMETERS, e))?;
        }
        config.parameters = updated;
        Ok(())
    }
}

/// Walks nested `NODE` sections, collecting parameters into a configuration.
struct ParameterWalker<'c> {
    config: &'c mut NodeConfiguration,
    seen_nodes: HashSet<String>,
}

impl<'c> ParameterWalker<'c> {
    fn new(config: &'c mut NodeConfiguration) -> Self {
        Self {
            config,
            seen_nodes: HashSet::new(),
        }
    }

    fn walk_section(
        &mut self,
        section: Node<'_, '_>,
        prefix: &str,
        path: &str,
    ) -> Result<(), DescriptorError> {
        for child in section.children().filter(Node::is_element) {
            match child.tag_name().name() {
                names::NODE => self.walk_node(child, prefix, path)?,
                names::ITEM => self.read_item(child, prefix, path, false)?,
                names::ITEMLIST => self.read_item(child, prefix, path, true)?,
                other => {
                    return Err(DescriptorError::invalid(
                        format!("{path}/{other}"),
                        format!(
                            "unexpected element, expected {}, {} or {}",
                            names::NODE,
                            names::ITEM,
                            names::ITEMLIST
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    fn walk_node(
        &mut self,
        node: Node<'_, '_>,
        prefix: &str,
        path: &str,
    ) -> Result<(), DescriptorError> {
        let element_path = format!("{path}/{}", names::NODE);
        let name = segment_name(node, &element_path)?;
        let key = join_key(prefix, name);
        let element_path = format!("{element_path}[@name='{name}']");

        if !self.seen_nodes.insert(key.clone()) {
            return Err(DescriptorError::DuplicateNode { path: key });
        }
        if let Some(description) = node.attribute("description")
            && !description.is_empty()
        {
            self.config
                .node_descriptions
                .insert(key.clone(), description.to_string());
        }

        self.walk_section(node, &key, &element_path)
    }

    fn read_item(
        &mut self,
        item: Node<'_, '_>,
        prefix: &str,
        path: &str,
        is_list: bool,
    ) -> Result<(), DescriptorError> {
        let tag = item.tag_name().name();
        let name = segment_name(item, &format!("{path}/{tag}"))?;
        let element_path = format!("{path}/{tag}[@name='{name}']");
        let key = join_key(prefix, name);

        let kind = value_kind(item, &element_path)?;
        let mut parameter = if is_list {
            Parameter::list(&key, kind)
        } else {
            Parameter::new(&key, kind)
        }
        .with_description(item.attribute("description").unwrap_or_default())
        .with_advanced(bool_attribute(item, "advanced", &element_path)?)
        .with_required(bool_attribute(item, "required", &element_path)?);

        if is_list {
            let size = item
                .attribute("size")
                .map(|s| {
                    s.trim()
                        .parse::<usize>()
                        .map_err(|e| DescriptorError::invalid(&element_path, e))
                })
                .transpose()?;
            parameter = parameter.with_declared_size(size);

            for list_item in item.children().filter(Node::is_element) {
                if list_item.tag_name().name() != names::LISTITEM {
                    return Err(DescriptorError::invalid(
                        format!("{element_path}/{}", list_item.tag_name().name()),
                        format!("expected {}", names::LISTITEM),
                    ));
                }
                parameter
                    .set_multi_value(list_item.attribute("value").unwrap_or_default())
                    .map_err(|e| DescriptorError::invalid(&element_path, e))?;
            }
            if let Some(size) = size {
                parameter.pad_list(size);
            }
        } else {
            parameter
                .set_value_from_string(item.attribute("value").unwrap_or_default())
                .map_err(|e| DescriptorError::invalid(&element_path, e))?;
        }
        parameter.store_as_default();

        self.config
            .add_parameter(parameter)
            .map_err(|e| DescriptorError::invalid(&element_path, e))
    }
}

fn value_kind(item: Node<'_, '_>, path: &str) -> Result<ValueKind, DescriptorError> {
    let restrictions = item.attribute("restrictions").unwrap_or_default().trim();
    let formats = || parse_formats(item.attribute("supported_formats").unwrap_or_default());

    let kind = match item.attribute("type").unwrap_or("string") {
        "int" | "integer" => ValueKind::Int {
            bounds: Bounds::parse(restrictions).map_err(|e| DescriptorError::invalid(path, e))?,
        },
        "double" | "float" => ValueKind::Double {
            bounds: Bounds::parse(restrictions).map_err(|e| DescriptorError::invalid(path, e))?,
        },
        "bool" | "boolean" => ValueKind::Bool,
        "string" if restrictions.is_empty() => ValueKind::String,
        "string" => ValueKind::Choice {
            allowed: restrictions
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        },
        "input-file" => ValueKind::File {
            direction: FileDirection::Input,
            formats: formats(),
        },
        "output-file" => ValueKind::File {
            direction: FileDirection::Output,
            formats: formats(),
        },
        "file" => ValueKind::File {
            direction: FileDirection::Unspecified,
            formats: formats(),
        },
        other => {
            return Err(DescriptorError::invalid(
                path,
                format!("unknown parameter type '{other}'"),
            ));
        }
    };
    Ok(kind)
}

/// Parses `"*.fasta,*.fa"` into `["fasta", "fa"]`.
fn parse_formats(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|f| f.trim().trim_start_matches('*').trim_start_matches('.'))
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

fn read_citations(citations: Node<'_, '_>) -> Vec<Citation> {
    citations
        .children()
        .filter(|c| c.is_element() && c.tag_name().name() == names::CITATION)
        .map(|c| Citation {
            doi: c.attribute("doi").unwrap_or_default().to_string(),
            url: c.attribute("url").unwrap_or_default().to_string(),
        })
        .collect()
}

fn read_cli(
    cli: Node<'_, '_>,
    config: &NodeConfiguration,
) -> Result<Vec<CliElement>, DescriptorError> {
    let mut elements = Vec::new();
    for (index, element) in cli.children().filter(Node::is_element).enumerate() {
        let path = format!("tool/cli/{}[{index}]", element.tag_name().name());
        if element.tag_name().name() != names::CLI_ELEMENT {
            return Err(DescriptorError::invalid(
                path,
                format!("expected {}", names::CLI_ELEMENT),
            ));
        }

        let mut mappings = Vec::new();
        for mapping in element.children().filter(Node::is_element) {
            let mapping_path = format!("{path}/{}", mapping.tag_name().name());
            if mapping.tag_name().name() != names::MAPPING {
                return Err(DescriptorError::invalid(
                    mapping_path,
                    format!("expected {}", names::MAPPING),
                ));
            }
            let key = required_attribute(mapping, "referenceName", &mapping_path)?;
            if !config.parameters.contains(key) {
                return Err(DescriptorError::invalid(
                    mapping_path,
                    format!("mapping references unknown parameter '{key}'"),
                ));
            }
            mappings.push(Mapping::new(key));
        }

        elements.push(CliElement {
            option_identifier: element
                .attribute("optionIdentifier")
                .unwrap_or_default()
                .to_string(),
            is_list: bool_attribute(element, "isList", &path)?,
            is_required: bool_attribute(element, "isRequired", &path)?,
            mappings,
        });
    }
    Ok(elements)
}

fn required_attribute<'a>(
    node: Node<'a, '_>,
    attribute: &str,
    path: &str,
) -> Result<&'a str, DescriptorError> {
    node.attribute(attribute).ok_or_else(|| {
        DescriptorError::invalid(path, format!("missing attribute '{attribute}'"))
    })
}

/// Name of a `NODE`, `ITEM` or `ITEMLIST`: non-empty and dot-free so that
/// keys split back into their segments.
fn segment_name<'a>(node: Node<'a, '_>, path: &str) -> Result<&'a str, DescriptorError> {
    let name = required_attribute(node, "name", path)?;
    if name.is_empty() || name.contains(crate::params::KEY_SEPARATOR) {
        return Err(DescriptorError::invalid(
            path,
            format!("invalid name '{name}', expected a non-empty name without '.'"),
        ));
    }
    Ok(name)
}

fn bool_attribute(node: Node<'_, '_>, attribute: &str, path: &str) -> Result<bool, DescriptorError> {
    match node.attribute(attribute).map(str::trim) {
        None | Some("") => Ok(false),
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(true),
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(false),
        Some(v) => Err(DescriptorError::invalid(
            path,
            format!("attribute '{attribute}' must be 'true' or 'false', got '{v}'"),
        )),
    }
}

fn element_text(node: Node<'_, '_>) -> String {
    node.text().unwrap_or_default().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::LIST_SEPARATOR;

    const NESTED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tool name="Nested" version="1.0" category="Test" docurl="http://example.org">
  <description>Nested parameters</description>
  <manual>Use with care &amp; patience</manual>
  <executableName>nested</executableName>
  <citations><citation doi="10.1/abc" url="http://doi.org/10.1/abc"/></citations>
  <cli>
    <clielement optionIdentifier="-z" isList="false" isRequired="true">
      <mapping referenceName="1.2.z"/>
    </clielement>
  </cli>
  <PARAMETERS version="1.7.0">
    <NODE name="1" description="outer">
      <NODE name="2">
        <ITEM name="z" value="3" type="int" restrictions="0:5" required="true"/>
        <ITEMLIST name="l" type="string" size="3">
          <LISTITEM value="a"/>
          <LISTITEM value="b"/>
        </ITEMLIST>
      </NODE>
      <ITEM name="mode" value="fast" type="string" restrictions="fast,exact" advanced="true"/>
    </NODE>
  </PARAMETERS>
</tool>"#;

    #[test]
    fn test_reads_nested_keys() {
        let config = DescriptorReader::new(NESTED).read().unwrap();
        assert_eq!(config.name, "Nested");
        assert_eq!(config.version, "1.0");
        assert_eq!(config.manual, "Use with care & patience");
        assert_eq!(config.citations[0].doi, "10.1/abc");
        assert_eq!(
            config.parameters.keys().collect::<Vec<_>>(),
            vec!["1.2.z", "1.2.l", "1.mode"]
        );
        assert_eq!(config.string_representation("1.2.z").unwrap(), "3");
        assert!(config.parameters.is_advanced("1.mode").unwrap());
        assert!(!config.parameters.is_optional("1.2.z").unwrap());
        assert_eq!(config.node_descriptions.get("1").unwrap(), "outer");
    }

    #[test]
    fn test_declared_list_size_pads_empty_slot() {
        let config = DescriptorReader::new(NESTED).read().unwrap();
        let list = config.parameters.get("1.2.l").unwrap();
        assert_eq!(list.values(), vec!["a", "b", ""]);
        let sep = LIST_SEPARATOR;
        assert_eq!(list.string_representation(), format!("a{sep}b{sep}{sep}"));
    }

    #[test]
    fn test_reads_cli() {
        let config = DescriptorReader::new(NESTED).read().unwrap();
        assert_eq!(config.cli.len(), 1);
        assert_eq!(config.cli[0].option_identifier, "-z");
        assert!(config.cli[0].is_required);
        assert_eq!(config.cli[0].mappings[0].reference_name, "1.2.z");
    }

    #[test]
    fn test_rejects_invalid_tool_name() {
        let err = DescriptorReader::new(r#"<tool name="9lives"/>"#)
            .read()
            .unwrap_err();
        assert!(matches!(err, DescriptorError::InvalidNodeName { name, .. } if name == "9lives"));
    }

    #[test]
    fn test_rejects_duplicate_node() {
        let xml = r#"<tool name="Dup"><PARAMETERS>
            <NODE name="a"><ITEM name="x" value="1" type="int"/></NODE>
            <NODE name="a"><ITEM name="y" value="1" type="int"/></NODE>
        </PARAMETERS></tool>"#;
        let err = DescriptorReader::new(xml).read().unwrap_err();
        assert!(matches!(err, DescriptorError::DuplicateNode { path } if path == "a"));
    }

    #[test]
    fn test_rejects_out_of_bounds_default_with_path() {
        let xml = r#"<tool name="Bad"><PARAMETERS>
            <NODE name="a"><ITEM name="x" value="9" type="int" restrictions="0:5"/></NODE>
        </PARAMETERS></tool>"#;
        let err = DescriptorReader::new(xml).read().unwrap_err();
        match err {
            DescriptorError::Invalid { path, .. } => {
                assert_eq!(path, "tool/PARAMETERS/NODE[@name='a']/ITEM[@name='x']");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_dangling_mapping() {
        let xml = r#"<tool name="Bad">
            <cli><clielement optionIdentifier="-x"><mapping referenceName="nope"/></clielement></cli>
            <PARAMETERS/></tool>"#;
        let err = DescriptorReader::new(xml).read().unwrap_err();
        assert!(err.to_string().contains("unknown parameter 'nope'"));
    }

    #[test]
    fn test_rejects_malformed_xml_and_unknown_type() {
        assert!(matches!(
            DescriptorReader::new("<tool name=").read(),
            Err(DescriptorError::Invalid { .. })
        ));
        let xml = r#"<tool name="T"><PARAMETERS><ITEM name="x" type="matrix"/></PARAMETERS></tool>"#;
        assert!(DescriptorReader::new(xml).read().is_err());
    }

    #[test]
    fn test_file_items_become_ports() {
        let xml = r#"<tool name="Ports"><PARAMETERS><NODE name="p">
            <ITEMLIST name="in" type="input-file" supported_formats="*.fasta,*.fa" required="true"/>
            <ITEM name="out" value="" type="output-file" supported_formats="*.xml"/>
        </NODE></PARAMETERS></tool>"#;
        let config = DescriptorReader::new(xml).read().unwrap();
        assert_eq!(config.inputs[0].name, "p.in");
        assert_eq!(config.inputs[0].formats, vec!["fasta", "fa"]);
        assert!(config.inputs[0].multiple);
        assert_eq!(config.outputs[0].formats, vec!["xml"]);
    }
}
