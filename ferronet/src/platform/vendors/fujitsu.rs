//! Fujitsu switch profile.

use super::ios_like;
use crate::platform::{ModeCommands, PromptStyle, VendorProfile};

/// Fujitsu blade switches: `(sw1) #` prompts.
pub fn switch() -> VendorProfile {
    ios_like::profile("fujitsu_switch")
        .with_prompt_template(r"\({prompt}.*?\) (\(.*?\))?[{delimiters}]")
        .with_prompt_style(PromptStyle::Parenthesized)
        .with_paging_command("no pager")
        .with_config_mode(ModeCommands::new("conf", "end", ")#"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fujitsu_prompts() {
        let profile = switch();
        assert_eq!(profile.prompt_style.base_prompt("(sw1) #"), "sw1");

        let pattern = profile.base_pattern("sw1").unwrap();
        assert!(pattern.is_match(b"(sw1) #"));
        assert!(pattern.is_match(b"(sw1) >"));
        assert!(pattern.is_match(b"(sw1) (Config)#"));

        let config = profile.configuration.as_ref().unwrap();
        assert!("(sw1) (Config)#".contains(&config.check));
        assert!(!"(sw1) #".contains(&config.check));
    }
}
