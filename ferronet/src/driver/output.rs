//! Command and output normalization.

use once_cell::sync::Lazy;
use regex::Regex;

static LINEFEEDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\r\n|\r\n|\n\r").unwrap());

const BACKSPACE: char = '\x08';

/// Give a command exactly one trailing newline.
pub fn normalize_cmd(command: &str) -> String {
    let mut command = command.trim_end_matches('\n').to_string();
    command.push('\n');
    command
}

/// Convert `\r\r\n`, `\r\n` and `\n\r` to `\n`.
pub fn normalize_linefeeds(text: &str) -> String {
    LINEFEEDS.replace_all(text, "\n").into_owned()
}

/// Remove the last line when it contains the base prompt.
pub fn strip_prompt(text: &str, base_prompt: &str) -> String {
    match text.rsplit_once('\n') {
        Some((head, last)) if last.contains(base_prompt) => head.to_string(),
        Some(_) => text.to_string(),
        None if text.contains(base_prompt) => String::new(),
        None => text.to_string(),
    }
}

pub fn strip_backspaces(text: &str) -> String {
    text.replace(BACKSPACE, "")
}

/// Remove the echoed command from the start of the output.
///
/// Long commands are echoed with backspaces when the device wraps them; in
/// that case the whole first line is dropped instead.
pub fn strip_command(command: &str, output: &str) -> String {
    if output.contains(BACKSPACE) {
        let output = strip_backspaces(output);
        return match output.split_once('\n') {
            Some((_, rest)) => rest.to_string(),
            None => String::new(),
        };
    }

    let command = normalize_cmd(command);
    if let Some(rest) = output.strip_prefix(command.as_str()) {
        return rest.to_string();
    }
    // unmatched echo: skip as many characters as the command has
    match output.char_indices().nth(command.chars().count()) {
        Some((at, _)) => output[at..].to_string(),
        None => String::new(),
    }
}

/// Last non-blank line of `text`, trimmed.
pub fn last_line(text: &str) -> &str {
    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .unwrap_or_default()
}
