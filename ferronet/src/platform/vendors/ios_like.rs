//! Behavior shared by Cisco IOS and the many CLIs modelled on it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::driver::{Session, output};
use crate::error::Result;
use crate::platform::{Confirm, ModeCommands, VendorBehavior, VendorProfile};

/// Enters privileged mode on connect and leaves configuration mode on close.
#[derive(Debug, Default, Clone, Copy)]
pub struct IosLike {
    /// Drop every `\r` after line ending normalization (NX-OS).
    pub strip_carriage_returns: bool,
}

impl IosLike {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nxos() -> Self {
        Self {
            strip_carriage_returns: true,
        }
    }
}

/// Profile with the IOS command set: `enable`, `conf t` and `end`.
pub fn profile(name: &str) -> VendorProfile {
    VendorProfile::new(name)
        .with_privilege_mode(
            ModeCommands::new("enable", "disable", "#").with_enter_confirm(Confirm::password()),
        )
        .with_config_mode(ModeCommands::new("conf t", "end", ")#"))
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Unknown command")
        .with_behavior(Arc::new(IosLike::new()))
}

#[async_trait]
impl VendorBehavior for IosLike {
    async fn prepare(&self, session: &mut Session) -> Result<()> {
        session.enable_mode().await?;
        Ok(())
    }

    async fn cleanup(&self, session: &mut Session) -> Result<()> {
        session.exit_config_mode().await?;
        Ok(())
    }

    fn normalize_linefeeds(&self, text: &str) -> String {
        let text = output::normalize_linefeeds(text);
        if self.strip_carriage_returns {
            text.replace('\r', "")
        } else {
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nxos_drops_stray_carriage_returns() {
        let text = "line1\r\r\nline2\rline3\n\r";
        assert_eq!(IosLike::new().normalize_linefeeds(text), "line1\nline2\rline3\n");
        assert_eq!(IosLike::nxos().normalize_linefeeds(text), "line1\nline2line3\n");
    }

    #[test]
    fn test_ios_like_profile() {
        let profile = profile("generic_ios");
        let privilege = profile.privilege.as_ref().unwrap();
        assert_eq!(privilege.enter, "enable");
        assert_eq!(privilege.exit.as_deref(), Some("disable"));
        assert_eq!(privilege.enter_confirm, Some(Confirm::password()));

        let config = profile.configuration.as_ref().unwrap();
        assert_eq!(config.enter, "conf t");
        assert_eq!(config.check, ")#");
        assert!(profile.behavior.is_some());
        assert!(profile.commit.is_none());
    }
}
