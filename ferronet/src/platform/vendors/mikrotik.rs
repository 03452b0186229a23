//! Mikrotik RouterOS profile.
//!
//! # Prompt Examples
//!
//! ```text
//! [admin@MikroTik] >
//! [admin@MikroTik] /interface>
//! ```

use crate::platform::{PromptStyle, VendorProfile};

/// Login suffix that disables colors and sets a wide terminal.
pub const USERNAME_SUFFIX: &str = "+ct511w4098h";

/// Mikrotik RouterOS. Output is full of cursor control sequences.
pub fn routeros() -> VendorProfile {
    VendorProfile::new("mikrotik_routeros")
        .with_delimiters(&['>'])
        .with_prompt_template(r"\[.*?\] (/.*?)?>")
        .with_prompt_style(PromptStyle::Bracketed)
        .without_paging_command()
        .with_ansi_escape_codes(true)
        .with_username_suffix(USERNAME_SUFFIX)
        .with_failure_pattern("bad command name")
        .with_failure_pattern("syntax error")
        .with_failure_pattern("expected end of command")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routeros_prompts() {
        let profile = routeros();
        assert_eq!(
            profile.prompt_style.base_prompt("[admin@MikroTik] >"),
            "admin@MikroTik"
        );

        let pattern = profile.base_pattern("admin@MikroTik").unwrap();
        assert!(pattern.is_match(b"[admin@MikroTik] > "));
        assert!(pattern.is_match(b"[admin@MikroTik] /interface> "));
        assert!(!pattern.is_match(b"admin@MikroTik"));
    }

    #[test]
    fn test_routeros_login() {
        let profile = routeros();
        assert!(profile.ansi_escape_codes);
        assert_eq!(profile.username_suffix.as_deref(), Some("+ct511w4098h"));
        assert!(profile.paging_command.is_none());
    }
}
