//! Behavior for HP Comware switches.

use async_trait::async_trait;
use log::info;

use crate::driver::{ExpectOptions, Session};
use crate::error::{Error, Result};
use crate::platform::VendorBehavior;

const CMDLINE_COMMAND: &str = "_cmdline-mode on";
const CONFIRM_PATTERN: &str = r"\[[Yy]/[Nn]\]";
const PASSWORD_PATTERN: &str = r"(?i)password";
const INVALID_PASSWORD: &str = "Invalid password";

/// Optionally unlocks the hidden command set of limited Comware images.
///
/// The unlock password is taken from the `secret` connection parameter.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComwareLike {
    pub unlock_cmdline: bool,
}

impl ComwareLike {
    pub fn limited() -> Self {
        Self {
            unlock_cmdline: true,
        }
    }
}

/// Run `_cmdline-mode on`, confirm and send the password.
async fn unlock_cmdline(session: &mut Session) -> Result<String> {
    info!("Host {}: Unlocking cmdline mode", session.host());

    let mut output = session
        .send_command_expect(
            CMDLINE_COMMAND,
            &ExpectOptions::new().with_pattern(CONFIRM_PATTERN),
        )
        .await?;
    if !contains_match(CONFIRM_PATTERN, &output) {
        return Ok(output);
    }

    output += &session
        .send_command_expect("Y", &ExpectOptions::new().with_pattern(PASSWORD_PATTERN))
        .await?;
    if !contains_match(PASSWORD_PATTERN, &output) {
        return Ok(output);
    }

    let secret = session.secret();
    output += &session
        .send_command_expect(&secret, &ExpectOptions::new())
        .await?;
    if output.contains(INVALID_PASSWORD) {
        return Err(Error::usage(
            session.host(),
            "Failed to enable cmdline mode: invalid password",
        ));
    }
    Ok(output)
}

fn contains_match(pattern: &str, output: &str) -> bool {
    regex::Regex::new(pattern).is_ok_and(|re| re.is_match(output))
}

#[async_trait]
impl VendorBehavior for ComwareLike {
    async fn prepare(&self, session: &mut Session) -> Result<()> {
        if self.unlock_cmdline {
            unlock_cmdline(session).await?;
        }
        Ok(())
    }

    async fn cleanup(&self, session: &mut Session) -> Result<()> {
        session.exit_config_mode().await?;
        Ok(())
    }
}
