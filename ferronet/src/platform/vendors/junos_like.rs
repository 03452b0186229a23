//! Behavior for JunOS style devices that may log in to a shell.

use async_trait::async_trait;

use crate::driver::Session;
use crate::error::Result;
use crate::platform::VendorBehavior;

/// Moves from the Unix shell into the CLI on connect.
#[derive(Debug, Default, Clone, Copy)]
pub struct JunosLike;

#[async_trait]
impl VendorBehavior for JunosLike {
    async fn prepare(&self, session: &mut Session) -> Result<()> {
        session.cli_mode().await?;
        Ok(())
    }

    async fn cleanup(&self, session: &mut Session) -> Result<()> {
        session.exit_config_mode().await?;
        Ok(())
    }
}
