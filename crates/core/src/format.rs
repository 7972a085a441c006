//! Composite format strings for numbered display names.
//!
//! A format is parsed once into segments so rendering cannot fail. Argument
//! `0` is the test number, argument `1` is the display name. Supported item
//! syntax is `{index[,alignment][:Dn]}` with `{{` and `}}` escapes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;

pub const DEFAULT_NUMBER_FORMAT: &str = "{0,3:D}) {1}";

/// Largest alignment or zero-padding width a format item may request.
pub const MAX_FORMAT_WIDTH: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Number { alignment: i32, digits: usize },
    Name { alignment: i32 },
}

/// A parsed test-number display-name format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFormat {
    source: String,
    segments: Vec<Segment>,
}

impl NumberFormat {
    pub fn parse(format: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidFormat {
            format: format.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = format.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(invalid("unmatched '}'")),
                '{' => {
                    let mut item = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') => return Err(invalid("nested '{' in format item")),
                            Some(ch) => item.push(ch),
                            None => return Err(invalid("unterminated format item")),
                        }
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(parse_item(&item).map_err(|reason| invalid(&reason))?);
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(NumberFormat {
            source: format.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Render the format with `(number, name)` as positional arguments.
    pub fn render(&self, number: i64, name: &str) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Number { alignment, digits } => {
                    let digits_text = number.unsigned_abs().to_string();
                    let zeros = digits.saturating_sub(digits_text.len());
                    let mut text = String::new();
                    if number < 0 {
                        text.push('-');
                    }
                    text.push_str(&"0".repeat(zeros));
                    text.push_str(&digits_text);
                    push_aligned(&mut out, &text, *alignment);
                }
                Segment::Name { alignment } => push_aligned(&mut out, name, *alignment),
            }
        }
        out
    }
}

fn parse_item(item: &str) -> Result<Segment, String> {
    let (head, spec) = match item.split_once(':') {
        Some((head, spec)) => (head, Some(spec)),
        None => (item, None),
    };
    let (index, alignment) = match head.split_once(',') {
        Some((index, alignment)) => {
            let alignment = alignment
                .trim()
                .parse::<i32>()
                .map_err(|_| format!("invalid alignment '{}'", alignment.trim()))?;
            if alignment.unsigned_abs() as usize > MAX_FORMAT_WIDTH {
                return Err(format!(
                    "alignment {} exceeds the maximum width of {}",
                    alignment, MAX_FORMAT_WIDTH
                ));
            }
            (index, alignment)
        }
        None => (head, 0),
    };
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("invalid argument index '{}'", index.trim()))?;

    match index {
        0 => {
            let digits = match spec {
                None | Some("") => 0,
                Some(spec) => parse_decimal_spec(spec)?,
            };
            Ok(Segment::Number { alignment, digits })
        }
        // string arguments ignore format specifiers
        1 => Ok(Segment::Name { alignment }),
        n => Err(format!(
            "argument index {} is out of range; only {{0}} (number) and {{1}} (name) are available",
            n
        )),
    }
}

fn parse_decimal_spec(spec: &str) -> Result<usize, String> {
    let mut chars = spec.chars();
    match chars.next() {
        Some('D') | Some('d') => {
            let rest = chars.as_str();
            if rest.is_empty() {
                return Ok(0);
            }
            let digits = rest
                .parse::<usize>()
                .map_err(|_| format!("invalid precision in '{}'", spec))?;
            if digits > MAX_FORMAT_WIDTH {
                return Err(format!(
                    "precision {} exceeds the maximum width of {}",
                    digits, MAX_FORMAT_WIDTH
                ));
            }
            Ok(digits)
        }
        _ => Err(format!("unsupported number format '{}'", spec)),
    }
}

fn push_aligned(out: &mut String, text: &str, alignment: i32) {
    let width = alignment.unsigned_abs() as usize;
    let len = text.chars().count();
    let pad = " ".repeat(width.saturating_sub(len));
    if alignment < 0 {
        out.push_str(text);
        out.push_str(&pad);
    } else {
        out.push_str(&pad);
        out.push_str(text);
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat {
            source: DEFAULT_NUMBER_FORMAT.to_string(),
            segments: vec![
                Segment::Number {
                    alignment: 3,
                    digits: 0,
                },
                Segment::Literal(") ".to_string()),
                Segment::Name { alignment: 0 },
            ],
        }
    }
}

impl FromStr for NumberFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NumberFormat::parse(s)
    }
}

impl fmt::Display for NumberFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for NumberFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for NumberFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        NumberFormat::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_format_pads_to_three() {
        let format = NumberFormat::default();
        assert_eq!(format.render(1, "Add"), "  1) Add");
        assert_eq!(format.render(42, "Add"), " 42) Add");
        assert_eq!(format.render(1234, "Add"), "1234) Add");
    }

    #[test]
    fn default_matches_parsed_default() {
        assert_eq!(
            NumberFormat::parse(DEFAULT_NUMBER_FORMAT).unwrap(),
            NumberFormat::default()
        );
    }

    #[test]
    fn zero_padding_with_precision() {
        let format = NumberFormat::parse("[{0:D4}] {1}").unwrap();
        assert_eq!(format.render(7, "x"), "[0007] x");
        assert_eq!(format.render(-7, "x"), "[-0007] x");
    }

    #[test]
    fn left_alignment_and_escapes() {
        let format = NumberFormat::parse("{{{0,-3}}} {1}").unwrap();
        assert_eq!(format.render(5, "t"), "{5  } t");
    }

    #[test]
    fn name_first_formats() {
        let format = NumberFormat::parse("{1} #{0}").unwrap();
        assert_eq!(format.render(3, "Sum"), "Sum #3");
    }

    #[test]
    fn oversized_widths_are_rejected() {
        for bad in ["{0,2000000000} {1}", "{1,-1001}", "{0:D2000000000}"] {
            match NumberFormat::parse(bad) {
                Err(ConfigError::InvalidFormat { reason, .. }) => {
                    assert!(reason.contains("exceeds the maximum width"), "{}", reason)
                }
                other => panic!("expected {} to be rejected, got {:?}", bad, other),
            }
        }

        let widest = NumberFormat::parse("{0,-1000}").unwrap();
        assert_eq!(widest.render(1, "x").len(), MAX_FORMAT_WIDTH);
    }

    #[test]
    fn malformed_formats_are_rejected() {
        for bad in ["{0", "{2} {1}", "{0:X}", "}", "{a}", "{0,x}"] {
            let err = NumberFormat::parse(bad).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidFormat { .. }),
                "expected InvalidFormat for {:?}",
                bad
            );
        }
    }

    #[test]
    fn serde_uses_the_source_string() {
        let format: NumberFormat = serde_json::from_str("\"{0:D2}. {1}\"").unwrap();
        assert_eq!(format.render(3, "x"), "03. x");
        assert_eq!(serde_json::to_string(&format).unwrap(), "\"{0:D2}. {1}\"");
    }
}
