//! Vendor profiles: the per-family data the session engine runs on.

use std::fmt;
use std::sync::Arc;

use regex::bytes::Regex;

use super::VendorBehavior;
use crate::channel::patterns;

/// How the base prompt is cut out of the discovered prompt line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PromptStyle {
    /// Drop the trailing terminator: `router1#` → `router1`.
    #[default]
    Plain,
    /// Drop the terminator and keep what follows `@`: `admin@mx1>` → `mx1`.
    UserAtHost,
    /// Text inside the first parentheses: `(sw1) #` → `sw1`.
    Parenthesized,
    /// Drop the opening and closing character: `<HPE>` → `HPE`.
    Enclosed,
    /// Text inside the first square brackets: `[admin@MikroTik] >` → `admin@MikroTik`.
    Bracketed,
    /// Drop the terminator and any security context: `asa/admin#` → `asa`.
    Context,
}

impl PromptStyle {
    /// Derive the base prompt from a discovered prompt line.
    pub fn base_prompt(self, prompt: &str) -> String {
        let without_terminator = || {
            let mut chars = prompt.chars();
            chars.next_back();
            chars.as_str()
        };

        match self {
            PromptStyle::Plain => without_terminator().to_string(),
            PromptStyle::UserAtHost => {
                let prompt = without_terminator();
                match prompt.split_once('@') {
                    Some((_, host)) => host.to_string(),
                    None => prompt.to_string(),
                }
            }
            PromptStyle::Parenthesized => between(prompt, '(', ')'),
            PromptStyle::Enclosed => {
                let mut chars = prompt.chars();
                chars.next();
                chars.next_back();
                chars.as_str().to_string()
            }
            PromptStyle::Bracketed => between(prompt, '[', ']'),
            PromptStyle::Context => {
                let prompt = without_terminator();
                prompt.split('/').next().unwrap_or(prompt).to_string()
            }
        }
    }
}

/// Text between the first `open` and the next `close`, or the whole prompt.
fn between(prompt: &str, open: char, close: char) -> String {
    prompt
        .split_once(open)
        .and_then(|(_, rest)| rest.split_once(close))
        .map(|(inner, _)| inner.to_string())
        .unwrap_or_else(|| prompt.to_string())
}

/// Reply to an interactive question raised by a mode command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Send this text.
    Text(String),
    /// Send the `secret` from the connection parameters.
    Secret,
}

/// A question the device may ask and the reply to give.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirm {
    /// Regex (case-insensitive) that identifies the question.
    pub pattern: String,
    pub answer: Answer,
}

impl Confirm {
    pub fn new(pattern: impl Into<String>, answer: Answer) -> Self {
        Self {
            pattern: pattern.into(),
            answer,
        }
    }

    /// Answer with the privilege secret when a password is requested.
    pub fn password() -> Self {
        Self::new(r"password", Answer::Secret)
    }
}

/// Commands that enter, leave and detect one mode tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeCommands {
    pub enter: String,
    /// `None` when the tier cannot be left (JunOS cli).
    pub exit: Option<String>,
    /// Substring of the prompt that is present only inside the tier.
    pub check: String,
    pub enter_confirm: Option<Confirm>,
    pub exit_confirm: Option<Confirm>,
}

impl ModeCommands {
    pub fn new(enter: impl Into<String>, exit: impl Into<String>, check: impl Into<String>) -> Self {
        Self {
            enter: enter.into(),
            exit: Some(exit.into()),
            check: check.into(),
            enter_confirm: None,
            exit_confirm: None,
        }
    }

    /// A tier that is entered but never explicitly left.
    pub fn enter_only(enter: impl Into<String>, check: impl Into<String>) -> Self {
        Self {
            enter: enter.into(),
            exit: None,
            check: check.into(),
            enter_confirm: None,
            exit_confirm: None,
        }
    }

    pub fn with_enter_confirm(mut self, confirm: Confirm) -> Self {
        self.enter_confirm = Some(confirm);
        self
    }

    pub fn with_exit_confirm(mut self, confirm: Confirm) -> Self {
        self.exit_confirm = Some(confirm);
        self
    }
}

/// Output marker that means a commit was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitFailure {
    pub marker: String,
    /// Command whose output explains the failure.
    pub detail_command: Option<String>,
}

impl CommitFailure {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            detail_command: None,
        }
    }

    pub fn with_detail(mut self, command: impl Into<String>) -> Self {
        self.detail_command = Some(command.into());
        self
    }
}

/// Commit handling for families with a candidate configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitCommands {
    pub command: String,
    /// Template with a `{}` placeholder for the comment.
    pub comment_command: Option<String>,
    pub confirm: Option<Confirm>,
    pub failures: Vec<CommitFailure>,
}

impl CommitCommands {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            comment_command: None,
            confirm: None,
            failures: Vec::new(),
        }
    }

    pub fn with_comment_command(mut self, template: impl Into<String>) -> Self {
        self.comment_command = Some(template.into());
        self
    }

    pub fn with_confirm(mut self, confirm: Confirm) -> Self {
        self.confirm = Some(confirm);
        self
    }

    pub fn with_failure(mut self, failure: CommitFailure) -> Self {
        self.failures.push(failure);
        self
    }

    /// The commit command for an optional comment.
    pub fn command_for(&self, comment: Option<&str>) -> String {
        match (comment.filter(|c| !c.is_empty()), &self.comment_command) {
            (Some(comment), Some(template)) => template.replacen("{}", comment, 1),
            _ => self.command.clone(),
        }
    }
}

/// Everything that distinguishes one device family from another.
///
/// Profiles are immutable once built and shared between sessions via `Arc`.
#[derive(Clone)]
pub struct VendorProfile {
    /// Device type identifier (e.g. `cisco_ios`).
    pub name: String,

    /// Characters that terminate a prompt.
    pub delimiters: Vec<char>,

    /// Characters that open a prompt (Comware `<` and `[`).
    pub left_delimiters: Vec<char>,

    /// Regex template with `{prompt}`, `{delimiters}` and `{left_delimiters}`.
    pub prompt_template: String,

    pub prompt_style: PromptStyle,

    pub paging_command: Option<String>,

    /// Fixed pattern that ends every command instead of the base pattern.
    pub command_pattern: Option<String>,

    pub cli: Option<ModeCommands>,
    pub privilege: Option<ModeCommands>,
    pub configuration: Option<ModeCommands>,
    pub commit: Option<CommitCommands>,

    /// Strip cursor control sequences from output.
    pub ansi_escape_codes: bool,

    /// Appended to the login username (Mikrotik terminal options).
    pub username_suffix: Option<String>,

    /// Substrings that mark a command as failed.
    pub failed_when_contains: Vec<String>,

    /// Optional vendor-specific behavior.
    pub behavior: Option<Arc<dyn VendorBehavior>>,
}

impl VendorProfile {
    /// Create a profile with the common IOS-like defaults.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            delimiters: vec!['>', '#'],
            left_delimiters: Vec::new(),
            prompt_template: r"{prompt}.*?(\(.*?\))?[{delimiters}]".to_string(),
            prompt_style: PromptStyle::Plain,
            paging_command: Some("terminal length 0".to_string()),
            command_pattern: None,
            cli: None,
            privilege: None,
            configuration: None,
            commit: None,
            ansi_escape_codes: false,
            username_suffix: None,
            failed_when_contains: Vec::new(),
            behavior: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_delimiters(mut self, delimiters: &[char]) -> Self {
        self.delimiters = delimiters.to_vec();
        self
    }

    pub fn with_left_delimiters(mut self, delimiters: &[char]) -> Self {
        self.left_delimiters = delimiters.to_vec();
        self
    }

    pub fn with_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = template.into();
        self
    }

    pub fn with_prompt_style(mut self, style: PromptStyle) -> Self {
        self.prompt_style = style;
        self
    }

    pub fn with_paging_command(mut self, command: impl Into<String>) -> Self {
        self.paging_command = Some(command.into());
        self
    }

    pub fn without_paging_command(mut self) -> Self {
        self.paging_command = None;
        self
    }

    pub fn with_command_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.command_pattern = Some(pattern.into());
        self
    }

    pub fn with_cli_mode(mut self, mode: ModeCommands) -> Self {
        self.cli = Some(mode);
        self
    }

    pub fn with_privilege_mode(mut self, mode: ModeCommands) -> Self {
        self.privilege = Some(mode);
        self
    }

    pub fn with_config_mode(mut self, mode: ModeCommands) -> Self {
        self.configuration = Some(mode);
        self
    }

    pub fn without_config_mode(mut self) -> Self {
        self.configuration = None;
        self
    }

    pub fn with_commit(mut self, commit: CommitCommands) -> Self {
        self.commit = Some(commit);
        self
    }

    pub fn with_ansi_escape_codes(mut self, enabled: bool) -> Self {
        self.ansi_escape_codes = enabled;
        self
    }

    pub fn with_username_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.username_suffix = Some(suffix.into());
        self
    }

    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    pub fn with_behavior(mut self, behavior: Arc<dyn VendorBehavior>) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// Regex matching any prompt terminator of this family.
    pub fn discovery_pattern(&self) -> Result<Regex, regex::Error> {
        patterns::discovery_pattern(&self.delimiters)
    }

    /// Compile the prompt template for a discovered base prompt.
    pub fn base_pattern(&self, base_prompt: &str) -> Result<Regex, regex::Error> {
        patterns::base_pattern(
            &self.prompt_template,
            base_prompt,
            &self.delimiters,
            &self.left_delimiters,
        )
    }

    /// First failure substring contained in `output`.
    pub fn detect_failure(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|pattern| output.contains(pattern.as_str()))
            .map(String::as_str)
    }
}

impl fmt::Debug for VendorProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VendorProfile")
            .field("name", &self.name)
            .field("delimiters", &self.delimiters)
            .field("left_delimiters", &self.left_delimiters)
            .field("prompt_template", &self.prompt_template)
            .field("prompt_style", &self.prompt_style)
            .field("paging_command", &self.paging_command)
            .field("command_pattern", &self.command_pattern)
            .field("cli", &self.cli)
            .field("privilege", &self.privilege)
            .field("configuration", &self.configuration)
            .field("commit", &self.commit)
            .field("ansi_escape_codes", &self.ansi_escape_codes)
            .field("username_suffix", &self.username_suffix)
            .field("failed_when_contains", &self.failed_when_contains)
            .field(
                "behavior",
                &self.behavior.as_ref().map(|_| "<VendorBehavior>"),
            )
            .finish()
    }
}
