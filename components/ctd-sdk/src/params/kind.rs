//! Value kinds and their restrictions.

use crate::error::ParameterError;
use std::fmt;
use std::str::FromStr;

/// Inclusive numeric bounds parsed from a `"lo:hi"` restriction.
///
/// An empty side is unbounded, so `":10"`, `"0:"` and `""` are all valid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds<T> {
    /// Inclusive lower bound.
    pub lower: Option<T>,
    /// Inclusive upper bound.
    pub upper: Option<T>,
}

impl<T> Bounds<T>
where
    T: FromStr + PartialOrd + Copy + fmt::Display,
{
    /// Bounds that accept every value.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            lower: None,
            upper: None,
        }
    }

    /// Creates bounds from explicit sides.
    #[must_use]
    pub fn new(lower: Option<T>, upper: Option<T>) -> Self {
        Self { lower, upper }
    }

    /// Parses a `"lo:hi"` restriction string.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::InvalidRestriction`] if the string has no
    /// `:` separator, a side does not parse, or the lower bound exceeds the
    /// upper bound.
    pub fn parse(restriction: &str) -> Result<Self, ParameterError> {
        let restriction = restriction.trim();
        if restriction.is_empty() {
            return Ok(Self::unbounded());
        }

        let invalid = |reason: String| ParameterError::InvalidRestriction {
            restriction: restriction.to_string(),
            reason,
        };

        let (lo, hi) = restriction
            .split_once(':')
            .ok_or_else(|| invalid("expected 'lo:hi'".to_string()))?;

        let parse_side = |side: &str| -> Result<Option<T>, ParameterError> {
            let side = side.trim();
            if side.is_empty() {
                return Ok(None);
            }
            side.parse::<T>()
                .map(Some)
                .map_err(|_| invalid(format!("'{side}' is not a number")))
        };

        let bounds = Self::new(parse_side(lo)?, parse_side(hi)?);
        if let (Some(lo), Some(hi)) = (bounds.lower, bounds.upper)
            && lo > hi
        {
            return Err(invalid(format!("lower bound {lo} exceeds upper bound {hi}")));
        }
        Ok(bounds)
    }

    /// Returns a reason if `value` lies outside the bounds.
    pub(crate) fn check(&self, value: T) -> Result<(), String> {
        if let Some(lo) = self.lower
            && value < lo
        {
            return Err(format!("below lower bound {lo}"));
        }
        if let Some(hi) = self.upper
            && value > hi
        {
            return Err(format!("above upper bound {hi}"));
        }
        Ok(())
    }

    /// Whether `value` lies within the bounds.
    #[must_use]
    pub fn contains(&self, value: T) -> bool {
        self.check(value).is_ok()
    }

    /// Whether neither side is bounded.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }
}

impl<T: fmt::Display> fmt::Display for Bounds<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lower.is_none() && self.upper.is_none() {
            return Ok(());
        }
        if let Some(lo) = &self.lower {
            write!(f, "{lo}")?;
        }
        f.write_str(":")?;
        if let Some(hi) = &self.upper {
            write!(f, "{hi}")?;
        }
        Ok(())
    }
}

/// Direction of a file-valued parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileDirection {
    /// The tool reads the file; backs an input port.
    Input,
    /// The tool writes the file; backs an output port.
    Output,
    /// A plain path with no port attached.
    Unspecified,
}

/// Type tag plus restriction payload of a parameter value.
///
/// List parameters use the same kinds for their elements.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    /// Signed integer with optional bounds.
    Int {
        /// Accepted range.
        bounds: Bounds<i64>,
    },
    /// Floating point number with optional bounds.
    Double {
        /// Accepted range.
        bounds: Bounds<f64>,
    },
    /// `true` or `false`.
    Bool,
    /// Free text.
    String,
    /// Text restricted to an enumerated set.
    Choice {
        /// Allowed values in descriptor order.
        allowed: Vec<String>,
    },
    /// A path.
    File {
        /// Whether the tool reads or writes it.
        direction: FileDirection,
        /// Accepted extensions without the `*.` prefix, e.g. `fasta`.
        formats: Vec<String>,
    },
}

impl ValueKind {
    /// Mnemonic type tag as used in the descriptor `type` attribute.
    #[must_use]
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Int { .. } => "int",
            Self::Double { .. } => "double",
            Self::Bool => "bool",
            Self::String | Self::Choice { .. } => "string",
            Self::File {
                direction: FileDirection::Input,
                ..
            } => "input-file",
            Self::File {
                direction: FileDirection::Output,
                ..
            } => "output-file",
            Self::File {
                direction: FileDirection::Unspecified,
                ..
            } => "file",
        }
    }

    /// The restriction string for this kind, empty when unrestricted.
    #[must_use]
    pub fn restrictions(&self) -> String {
        match self {
            Self::Int { bounds } => bounds.to_string(),
            Self::Double { bounds } => bounds.to_string(),
            Self::Choice { allowed } => allowed.join(","),
            Self::Bool | Self::String | Self::File { .. } => String::new(),
        }
    }

    /// Validates one non-empty raw value and returns its canonical form.
    pub(crate) fn canonicalize(&self, raw: &str) -> Result<String, String> {
        match self {
            Self::Int { bounds } => {
                let value: i64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| "not an integer".to_string())?;
                bounds.check(value)?;
                Ok(value.to_string())
            }
            Self::Double { bounds } => {
                let trimmed = raw.trim();
                let value: f64 = trimmed
                    .parse()
                    .map_err(|_| "not a floating point number".to_string())?;
                if value.is_nan() {
                    return Err("NaN is not a valid value".to_string());
                }
                bounds.check(value)?;
                Ok(trimmed.to_string())
            }
            Self::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Ok("true".to_string()),
                "false" => Ok("false".to_string()),
                _ => Err("expected 'true' or 'false'".to_string()),
            },
            Self::Choice { allowed } => {
                if allowed.iter().any(|a| a == raw) {
                    Ok(raw.to_string())
                } else {
                    Err(format!("not one of [{}]", allowed.join(", ")))
                }
            }
            Self::String | Self::File { .. } => match raw.chars().find(|c| !is_xml_char(*c)) {
                Some(c) => Err(format!("character {c:?} cannot be stored in a descriptor")),
                None => Ok(raw.to_string()),
            },
        }
    }
}

/// Whether `c` is allowed in an XML 1.0 document.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_parse() {
        let b = Bounds::<i64>::parse("0:10").unwrap();
        assert_eq!(b, Bounds::new(Some(0), Some(10)));
        assert!(b.contains(0));
        assert!(b.contains(10));
        assert!(!b.contains(11));
        assert!(!b.contains(-1));
    }

    #[test]
    fn test_bounds_open_sides() {
        assert_eq!(Bounds::<i64>::parse(":5").unwrap(), Bounds::new(None, Some(5)));
        assert_eq!(Bounds::<i64>::parse("5:").unwrap(), Bounds::new(Some(5), None));
        assert!(Bounds::<f64>::parse("").unwrap().is_unbounded());
        assert!(Bounds::<f64>::parse(":").unwrap().is_unbounded());
    }

    #[test]
    fn test_bounds_invalid() {
        assert!(Bounds::<i64>::parse("5").is_err());
        assert!(Bounds::<i64>::parse("a:b").is_err());
        assert!(Bounds::<i64>::parse("10:1").is_err());
    }

    #[test]
    fn test_bounds_display_round_trip() {
        for text in ["0:10", ":3.5", "-1:", ""] {
            let b = Bounds::<f64>::parse(text).unwrap();
            assert_eq!(b.to_string(), text);
        }
    }

    #[test]
    fn test_canonicalize_int() {
        let kind = ValueKind::Int {
            bounds: Bounds::parse("1:3").unwrap(),
        };
        assert_eq!(kind.canonicalize(" 2 ").unwrap(), "2");
        assert!(kind.canonicalize("4").is_err());
        assert!(kind.canonicalize("2.5").is_err());
    }

    #[test]
    fn test_canonicalize_bool_and_choice() {
        assert_eq!(ValueKind::Bool.canonicalize("TRUE").unwrap(), "true");
        assert!(ValueKind::Bool.canonicalize("yes").is_err());

        let choice = ValueKind::Choice {
            allowed: vec!["fast".to_string(), "exact".to_string()],
        };
        assert_eq!(choice.canonicalize("exact").unwrap(), "exact");
        assert!(choice.canonicalize("slow").is_err());
    }

    #[test]
    fn test_canonicalize_double_rejects_nan() {
        let kind = ValueKind::Double {
            bounds: Bounds::unbounded(),
        };
        assert_eq!(kind.canonicalize("1e-3").unwrap(), "1e-3");
        assert!(kind.canonicalize("NaN").is_err());
    }

    #[test]
    fn test_canonicalize_text_rejects_non_xml_characters() {
        let kind = ValueKind::String;
        assert_eq!(kind.canonicalize("tab\there\nnext").unwrap(), "tab\there\nnext");
        assert_eq!(kind.canonicalize("caf\u{e9} \u{1F600}").unwrap(), "caf\u{e9} \u{1F600}");
        assert!(kind.canonicalize("a\u{1}b").is_err());
        assert!(kind.canonicalize("nul\0").is_err());
        assert!(kind.canonicalize("\u{FFFE}").is_err());

        let file = ValueKind::File {
            direction: FileDirection::Input,
            formats: vec![],
        };
        assert!(file.canonicalize("in\u{1b}.fasta").is_err());
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(
            ValueKind::File {
                direction: FileDirection::Input,
                formats: vec![]
            }
            .mnemonic(),
            "input-file"
        );
        assert_eq!(ValueKind::Choice { allowed: vec![] }.mnemonic(), "string");
    }
}
