//! Typed, validatable parameter values forming a keyed tree.
//!
//! Every parameter is one [`Parameter`] whose [`ValueKind`] carries the
//! type tag plus its bounds or allowed set. Values are validated on every
//! mutation and stored in canonical string form, so
//! [`Parameter::string_representation`] is the exact inverse of
//! [`Parameter::set_value_from_string`].
//!
//! # Example
//!
//! ```
//! use ctd_sdk::params::{Bounds, Parameter, ParameterTree, ValueKind};
//!
//! let mut tree = ParameterTree::new();
//! tree.insert(Parameter::new(
//!     "tool.threshold",
//!     ValueKind::Int { bounds: Bounds::parse("0:10").unwrap() },
//! ))
//! .unwrap();
//!
//! tree.set_value_from_string("tool.threshold", "7").unwrap();
//! assert!(tree.set_value_from_string("tool.threshold", "70").is_err());
//! assert_eq!(tree.string_representation("tool.threshold").unwrap(), "7");
//! ```

pub mod kind;
pub mod parameter;
pub mod tree;

pub use kind::{Bounds, FileDirection, ValueKind};
pub use parameter::{LIST_SEPARATOR, Parameter, ParameterValue};
pub use tree::ParameterTree;

/// Separator between the segments of a parameter key.
pub const KEY_SEPARATOR: char = '.';

/// Joins a parent path and a child name into a key.
#[must_use]
pub fn join_key(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}{KEY_SEPARATOR}{name}")
    }
}
