//! Vendor profiles and behaviors for multi-vendor support.
//!
//! A [`VendorProfile`] carries the command strings and prompt patterns of one
//! device family. Families that need more than data plug a
//! [`VendorBehavior`] into their profile.

mod profile;
mod registry;
pub mod vendors;

pub use profile::{
    Answer, CommitCommands, CommitFailure, Confirm, ModeCommands, PromptStyle, VendorProfile,
};
pub use registry::{lookup, supported_device_types};

use async_trait::async_trait;

use crate::driver::{Session, output};
use crate::error::Result;

/// Trait for vendor-specific behavior.
#[async_trait]
pub trait VendorBehavior: Send + Sync {
    /// Called once the prompt is known, before paging is disabled.
    async fn prepare(&self, _session: &mut Session) -> Result<()> {
        Ok(())
    }

    /// Called before the connection is closed.
    async fn cleanup(&self, _session: &mut Session) -> Result<()> {
        Ok(())
    }

    /// Convert device line endings to `\n`.
    fn normalize_linefeeds(&self, text: &str) -> String {
        output::normalize_linefeeds(text)
    }
}

/// Behavior that only does what the profile data describes.
#[derive(Debug, Default)]
pub struct DefaultBehavior;

#[async_trait]
impl VendorBehavior for DefaultBehavior {}
