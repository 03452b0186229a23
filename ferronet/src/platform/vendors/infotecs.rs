//! Infotecs HW1000 profile.

use super::ios_like;
use crate::platform::{Confirm, ModeCommands, VendorProfile};

/// Infotecs ViPNet HW1000 appliances. Privileged mode only.
pub fn hw1000() -> VendorProfile {
    ios_like::profile("hw1000")
        .with_privilege_mode(
            ModeCommands::new("enable", "exit", "#").with_enter_confirm(Confirm::password()),
        )
        .without_config_mode()
        .without_paging_command()
}
