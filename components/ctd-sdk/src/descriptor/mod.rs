//! Reading and writing Common Tool Descriptor documents.
//!
//! A descriptor is an XML document rooted at `<tool>`:
//!
//! ```xml
//! <tool name="Blast" version="2.2" category="Alignment" docurl="https://...">
//!   <description>Local alignment search</description>
//!   <executableName>blastall</executableName>
//!   <cli>
//!     <clielement optionIdentifier="-i" isList="false" isRequired="true">
//!       <mapping referenceName="blast.i"/>
//!     </clielement>
//!   </cli>
//!   <PARAMETERS version="1.7.0">
//!     <NODE name="blast" description="">
//!       <ITEM name="i" value="" type="input-file" supported_formats="*.fasta"/>
//!     </NODE>
//!   </PARAMETERS>
//! </tool>
//! ```
//!
//! Nested `NODE` names are joined with `.` into parameter keys, so the
//! item above has the key `blast.i`.

pub mod reader;
pub mod writer;

pub use reader::DescriptorReader;
pub use writer::{DescriptorWriter, write_descriptor, write_parameters};

/// Element and attribute names of the CTD layout.
pub(crate) mod names {
    pub const TOOL: &str = "tool";
    pub const DESCRIPTION: &str = "description";
    pub const MANUAL: &str = "manual";
    pub const EXECUTABLE_NAME: &str = "executableName";
    pub const EXECUTABLE_PATH: &str = "executablePath";
    pub const CITATIONS: &str = "citations";
    pub const CITATION: &str = "citation";
    pub const PARAMETERS: &str = "PARAMETERS";
    pub const NODE: &str = "NODE";
    pub const ITEM: &str = "ITEM";
    pub const ITEMLIST: &str = "ITEMLIST";
    pub const LISTITEM: &str = "LISTITEM";
    pub const CLI: &str = "cli";
    pub const CLI_ELEMENT: &str = "clielement";
    pub const MAPPING: &str = "mapping";

    pub const PARAMETERS_VERSION: &str = "1.7.0";
}

/// Escapes a value for use inside a double-quoted attribute.
///
/// Whitespace control characters are written as character references so
/// that attribute normalisation on re-read does not alter the value.
pub(crate) fn escape_attribute(value: &str) -> String {
    html_escape::encode_double_quoted_attribute(value)
        .replace('\n', "&#10;")
        .replace('\r', "&#13;")
        .replace('\t', "&#9;")
}

/// Escapes character data.
pub(crate) fn escape_text(value: &str) -> String {
    html_escape::encode_text(value).into_owned()
}
