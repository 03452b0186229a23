//! Arista EOS profile.
//!
//! # Prompt Examples
//!
//! ```text
//! switch>                            # exec mode
//! switch#                            # privileged exec mode
//! switch(config-if-Et1)#             # configuration mode
//! ```

use super::ios_like;
use crate::platform::VendorProfile;

/// Arista EOS. Same command set as IOS with EOS error strings.
pub fn eos() -> VendorProfile {
    ios_like::profile("arista_eos")
        .with_failure_pattern("% Error")
        .with_failure_pattern("% Cannot commit")
        .with_failure_pattern("% Unavailable command")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eos_modes() {
        let profile = eos();
        let privilege = profile.privilege.as_ref().unwrap();
        assert_eq!(privilege.enter, "enable");
        assert_eq!(privilege.exit.as_deref(), Some("disable"));
        assert_eq!(privilege.check, "#");

        let config = profile.configuration.as_ref().unwrap();
        assert_eq!(config.enter, "conf t");
        assert_eq!(config.exit.as_deref(), Some("end"));
        assert_eq!(config.check, ")#");
    }

    #[test]
    fn test_eos_prompts() {
        let pattern = eos().base_pattern("switch").unwrap();
        assert!(pattern.is_match(b"switch>"));
        assert!(pattern.is_match(b"switch#"));
        assert!(pattern.is_match(b"switch(config-if-Et1)#"));
        assert!(pattern.is_match(b"switch(config-s-mysess)#"));
    }

    #[test]
    fn test_failure_patterns() {
        let profile = eos();
        assert_eq!(
            profile.detect_failure("% Invalid input (at token 1: 'foo')"),
            Some("% Invalid input")
        );
        assert_eq!(profile.detect_failure("% Error: bad vlan"), Some("% Error"));
    }
}
