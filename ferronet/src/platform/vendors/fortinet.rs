//! Fortinet FortiGate profile.

use std::sync::Arc;

use super::ios_like;
use crate::platform::{DefaultBehavior, VendorProfile};

/// FortiGate firewalls. No configuration mode and no paging command.
pub fn fortigate() -> VendorProfile {
    ios_like::profile("fortinet")
        .without_config_mode()
        .without_paging_command()
        .with_failure_pattern("Command fail")
        .with_failure_pattern("Unknown action")
        .with_behavior(Arc::new(DefaultBehavior))
}
