//! HP Comware profiles.
//!
//! # Prompt Examples
//!
//! ```text
//! <HPE>                              # user view
//! [HPE]                              # system view
//! [HPE-Vlan-interface10]             # view below system view
//! ```

use std::sync::Arc;

use super::comware_like::ComwareLike;
use crate::platform::{ModeCommands, PromptStyle, VendorProfile};

/// HP Comware switches.
pub fn comware() -> VendorProfile {
    VendorProfile::new("hp_comware")
        .with_delimiters(&['>', ']'])
        .with_left_delimiters(&['<', '['])
        .with_prompt_template(r"[{left_delimiters}]{prompt}[\-\w]*[{delimiters}]")
        .with_prompt_style(PromptStyle::Enclosed)
        .with_paging_command("screen-length disable")
        .with_config_mode(ModeCommands::new("system-view", "return", "]"))
        .with_failure_pattern("% Unrecognized command")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Too many parameters")
        .with_failure_pattern("% Wrong parameter")
        .with_behavior(Arc::new(ComwareLike::default()))
}

/// Comware images that hide most commands until `_cmdline-mode on`.
pub fn comware_limited() -> VendorProfile {
    comware()
        .with_name("hp_comware_limited")
        .with_behavior(Arc::new(ComwareLike::limited()))
}
