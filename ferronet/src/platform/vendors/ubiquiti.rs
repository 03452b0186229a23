//! Ubiquiti EdgeSwitch profile.

use super::ios_like;
use crate::platform::{Confirm, ModeCommands, PromptStyle, VendorProfile};

/// Ubiquiti EdgeSwitch: `(UBNT) >` prompts.
pub fn edge() -> VendorProfile {
    ios_like::profile("ubiquity_edge")
        .with_prompt_template(r"\({prompt}.*?\) (\(.*?\))?[{delimiters}]")
        .with_prompt_style(PromptStyle::Parenthesized)
        .with_privilege_mode(
            ModeCommands::new("enable", "exit", "#").with_enter_confirm(Confirm::password()),
        )
        .with_config_mode(ModeCommands::new("configure", "exit", ")#"))
}
