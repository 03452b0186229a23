//! Structured parsing of command output.
//!
//! A [`StructuredParser`] turns the text of a command into records, keyed by
//! device type and command. With the `textfsm` feature, [`TextFsmParser`]
//! implements it on top of `textfsm-rust`, selecting templates the way
//! ntc-templates indexes do: a device type plus a command pattern where
//! `[[...]]` marks an optional completion (`sh[[ow]] ver[[sion]]`).

use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;

/// One parsed row, keyed by value name.
pub type Record = HashMap<String, String>;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("no template for {device_type} command {command:?}")]
    NoTemplate {
        device_type: String,
        command: String,
    },

    #[error("invalid template: {0}")]
    Template(String),

    #[error("invalid command pattern {pattern:?}: {source}")]
    CommandPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to parse output: {0}")]
    Parse(String),
}

/// Converts command output into records.
pub trait StructuredParser: Send + Sync {
    fn parse(&self, device_type: &str, command: &str, output: &str)
    -> Result<Vec<Record>, ParseError>;
}

/// Compile an index style command pattern.
///
/// Text inside `[[` `]]` may be typed partially: `sh[[ow]]` accepts `sh`,
/// `sho` and `show`. Whitespace between words matches any run of spaces.
pub fn command_pattern(pattern: &str) -> Result<Regex, ParseError> {
    let mut source = String::from("^");
    let mut rest = pattern.trim();

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("[[") {
            let Some((optional, tail)) = after.split_once("]]") else {
                return Err(ParseError::Template(format!(
                    "unterminated completion in {:?}",
                    pattern
                )));
            };
            for c in optional.chars() {
                source.push_str("(?:");
                source.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4])));
            }
            source.push_str(&")?".repeat(optional.chars().count()));
            rest = tail;
        } else if rest.starts_with(char::is_whitespace) {
            source.push_str(r"\s+");
            rest = rest.trim_start();
        } else {
            let word_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let end = rest.find("[[").map_or(word_end, |i| i.min(word_end));
            source.push_str(&regex::escape(&rest[..end]));
            rest = &rest[end..];
        }
    }
    source.push_str(r"\s*$");

    Regex::new(&source).map_err(|source| ParseError::CommandPattern {
        pattern: pattern.to_string(),
        source,
    })
}

#[cfg(feature = "textfsm")]
pub use textfsm::TextFsmParser;

#[cfg(feature = "textfsm")]
mod textfsm {
    use textfsm_rust::Template;

    use super::{ParseError, Record, StructuredParser, command_pattern};

    struct Entry {
        device_type: String,
        command: regex::Regex,
        source: String,
    }

    /// TextFSM templates indexed by device type and command.
    #[derive(Default)]
    pub struct TextFsmParser {
        entries: Vec<Entry>,
    }

    impl TextFsmParser {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register a template. The template is compiled once to validate it.
        pub fn with_template(
            mut self,
            device_type: impl Into<String>,
            command: &str,
            source: impl Into<String>,
        ) -> Result<Self, ParseError> {
            let source = source.into();
            Template::parse_str(&source).map_err(|e| ParseError::Template(e.to_string()))?;
            self.entries.push(Entry {
                device_type: device_type.into(),
                command: command_pattern(command)?,
                source,
            });
            Ok(self)
        }

        pub fn len(&self) -> usize {
            self.entries.len()
        }

        pub fn is_empty(&self) -> bool {
            self.entries.is_empty()
        }
    }

    impl StructuredParser for TextFsmParser {
        fn parse(
            &self,
            device_type: &str,
            command: &str,
            output: &str,
        ) -> Result<Vec<Record>, ParseError> {
            let command = command.trim();
            let entry = self
                .entries
                .iter()
                .find(|e| e.device_type == device_type && e.command.is_match(command))
                .ok_or_else(|| ParseError::NoTemplate {
                    device_type: device_type.to_string(),
                    command: command.to_string(),
                })?;

            let template = Template::parse_str(&entry.source)
                .map_err(|e| ParseError::Template(e.to_string()))?;
            let mut parser = template.parser();
            parser
                .parse_text_to_dicts(output)
                .map_err(|e| ParseError::Parse(e.to_string()))
        }
    }

    impl std::fmt::Debug for TextFsmParser {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("TextFsmParser")
                .field(
                    "templates",
                    &self
                        .entries
                        .iter()
                        .map(|e| (e.device_type.as_str(), e.command.as_str()))
                        .collect::<Vec<_>>(),
                )
                .finish()
        }
    }

}
