//! Prompt pattern construction.
//!
//! Prompt templates are regex source with three placeholders:
//! `{prompt}` (the escaped base prompt), `{delimiters}` (the escaped
//! terminator characters, meant to sit inside a `[...]` class) and
//! `{left_delimiters}` (characters that open a prompt, e.g. Comware `<` / `[`).

use regex::bytes::{Regex, RegexBuilder};

/// Number of base prompt characters that take part in matching.
///
/// Long hostnames are often truncated in configuration prompts, so only the
/// head of the prompt is required to match.
pub const PROMPT_MATCH_LEN: usize = 12;

/// Escape every character for use inside a regex character class.
pub fn delimiter_class(delimiters: &[char]) -> String {
    delimiters
        .iter()
        .map(|d| regex::escape(d.encode_utf8(&mut [0u8; 4])))
        .collect()
}

/// Regex matching any single delimiter, used to flush banners and to
/// discover the prompt before the base prompt is known.
pub fn discovery_pattern(delimiters: &[char]) -> Result<Regex, regex::Error> {
    Regex::new(&format!("[{}]", delimiter_class(delimiters)))
}

/// Render a prompt template and compile it.
///
/// Only the first [`PROMPT_MATCH_LEN`] characters of `base_prompt` are used.
pub fn base_pattern(
    template: &str,
    base_prompt: &str,
    delimiters: &[char],
    left_delimiters: &[char],
) -> Result<Regex, regex::Error> {
    Regex::new(&render_template(
        template,
        base_prompt,
        delimiters,
        left_delimiters,
    ))
}

/// Substitute the placeholders of a prompt template.
pub fn render_template(
    template: &str,
    base_prompt: &str,
    delimiters: &[char],
    left_delimiters: &[char],
) -> String {
    let head: String = base_prompt.chars().take(PROMPT_MATCH_LEN).collect();
    template
        .replace("{prompt}", &regex::escape(&head))
        .replace("{delimiters}", &delimiter_class(delimiters))
        .replace("{left_delimiters}", &delimiter_class(left_delimiters))
}

/// Regex flags for caller supplied patterns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchFlags {
    pub case_insensitive: bool,
    pub multi_line: bool,
    pub dot_matches_new_line: bool,
}

impl MatchFlags {
    pub fn case_insensitive() -> Self {
        Self {
            case_insensitive: true,
            ..Self::default()
        }
    }

    /// Compile `pattern` with these flags.
    pub fn compile(&self, pattern: &str) -> Result<Regex, regex::Error> {
        RegexBuilder::new(pattern)
            .case_insensitive(self.case_insensitive)
            .multi_line(self.multi_line)
            .dot_matches_new_line(self.dot_matches_new_line)
            .build()
    }
}
