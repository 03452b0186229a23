//! Aruba ArubaOS 6 and ArubaOS 8 profiles.
//!
//! # Prompt Examples
//!
//! ```text
//! (ArubaS3500) #                     # AOS 6 enable mode
//! (ArubaS3500) (config) #            # AOS 6 configuration
//! (aruba-md) [mynode] #              # AOS 8 enable mode
//! (aruba-md) [mynode] (config) #     # AOS 8 configuration
//! ```

use super::ios_like;
use crate::platform::{ModeCommands, PromptStyle, VendorProfile};

fn aruba(name: &str, template: &str) -> VendorProfile {
    ios_like::profile(name)
        .with_prompt_template(template)
        .with_prompt_style(PromptStyle::Parenthesized)
        .with_paging_command("no paging")
        .with_config_mode(ModeCommands::new("conf t", "end", "(config"))
        .with_failure_pattern("% Parse error")
}

/// ArubaOS 6 controllers and switches.
pub fn aos6() -> VendorProfile {
    aruba("aruba_aos_6", r"\({prompt}.*?\) (\(.*?\))?\s?[{delimiters}]")
}

/// ArubaOS 8 mobility controllers, with the node path in the prompt.
pub fn aos8() -> VendorProfile {
    aruba(
        "aruba_aos_8",
        r"\({prompt}.*?\) [\*^]?\[.*?\]\s?(\(.*?\))?\s?[{delimiters}]",
    )
}
