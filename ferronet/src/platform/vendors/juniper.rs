//! Juniper JunOS profile.
//!
//! # Prompt Examples
//!
//! ```text
//! root@mx960:RE:0%                   # Unix shell
//! admin@mx960>                       # operational mode
//! admin@mx960#                       # configuration mode
//! ```
//!
//! The base pattern does not contain the hostname: `user@host` prompts
//! change with the login user, so any `word[@host]` followed by a delimiter
//! ends a command.

use std::sync::Arc;

use super::junos_like::JunosLike;
use crate::platform::{CommitCommands, CommitFailure, ModeCommands, PromptStyle, VendorProfile};

/// Juniper JunOS.
pub fn junos() -> VendorProfile {
    let commit = CommitCommands::new("commit")
        .with_comment_command("commit comment {}")
        .with_failure(CommitFailure::new("error: commit failed"))
        .with_failure(CommitFailure::new("error: configuration check-out failed"));

    VendorProfile::new("juniper_junos")
        .with_delimiters(&['%', '>', '#'])
        .with_prompt_template(r"\w+(@[\-\w]*)?[{delimiters}]")
        .with_prompt_style(PromptStyle::UserAtHost)
        .with_paging_command("set cli screen-length 0")
        .with_cli_mode(ModeCommands::enter_only("cli", ">"))
        .with_config_mode(ModeCommands::new("configure", "exit configuration-mode", "#"))
        .with_commit(commit)
        .with_failure_pattern("error:")
        .with_failure_pattern("is ambiguous")
        .with_failure_pattern("syntax error")
        .with_failure_pattern("unknown command")
        .with_behavior(Arc::new(JunosLike))
}
