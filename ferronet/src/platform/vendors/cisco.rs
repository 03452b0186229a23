//! Cisco IOS, IOS XE, IOS XR, NX-OS, ASA and FTD profiles.
//!
//! # Prompt Examples
//!
//! ```text
//! router1>                             # IOS user exec
//! router1#                             # IOS privileged exec
//! router1(config-if)#                  # IOS configuration
//! RP/0/RSP0/CPU0:xr1(config)#          # IOS XR configuration
//! asa/admin#                           # ASA security context
//! >                                    # FTD
//! ```

use std::sync::Arc;

use super::ios_like::{self, IosLike};
use crate::platform::{
    Answer, CommitCommands, CommitFailure, Confirm, DefaultBehavior, ModeCommands, PromptStyle,
    VendorProfile,
};

/// Cisco IOS.
pub fn ios() -> VendorProfile {
    ios_like::profile("cisco_ios")
}

/// Cisco IOS XE, identical to IOS.
pub fn ios_xe() -> VendorProfile {
    ios().with_name("cisco_ios_xe")
}

/// Cisco ASA, with the security context dropped from the base prompt.
pub fn asa() -> VendorProfile {
    ios_like::profile("cisco_asa")
        .with_paging_command("terminal pager 0")
        .with_prompt_style(PromptStyle::Context)
        .with_failure_pattern("ERROR:")
}

/// Cisco Firepower Threat Defense: every command ends at the `>` prompt.
pub fn ftd() -> VendorProfile {
    ios_like::profile("cisco_ftd")
        .without_paging_command()
        .with_command_pattern(">")
        .with_behavior(Arc::new(DefaultBehavior))
}

/// Cisco NX-OS.
pub fn nxos() -> VendorProfile {
    ios_like::profile("cisco_nxos")
        .with_failure_pattern("% Invalid command")
        .with_behavior(Arc::new(IosLike::nxos()))
}

/// Cisco IOS XR, with a candidate configuration that must be committed.
pub fn ios_xr() -> VendorProfile {
    // staying in configuration mode keeps the candidate and fails the exit
    let config = ModeCommands::new("conf t", "end", ")#").with_exit_confirm(Confirm::new(
        "Uncommitted changes found",
        Answer::Text("cancel".to_string()),
    ));

    let commit = CommitCommands::new("commit")
        .with_comment_command("commit comment {}")
        .with_confirm(Confirm::new(
            r"Do you wish to proceed with this commit anyway\?",
            Answer::Text("no".to_string()),
        ))
        .with_failure(CommitFailure::new("Failed to commit").with_detail("show configuration failed"))
        .with_failure(
            CommitFailure::new("One or more commits have occurred")
                .with_detail("show configuration commit changes"),
        );

    ios_like::profile("cisco_ios_xr")
        .with_config_mode(config)
        .with_commit(commit)
}
