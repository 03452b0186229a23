//! Mode tiers: probing, entering and leaving them.
//!
//! A family defines up to three tiers (cli, privilege, configuration) as
//! [`ModeCommands`]. Probing sends a newline and looks for the tier's check
//! marker in the reply. Entering or leaving an already reached state only
//! costs the probe.

use std::fmt;

use log::info;

use super::output;
use super::session::Session;
use crate::channel::MatchFlags;
use crate::error::{Error, Result};
use crate::platform::{Answer, Confirm, ModeCommands};

/// Mode of the session as seen by the last probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Unknown,
    /// Unix shell below the CLI (JunOS).
    Shell,
    Cli,
    Unprivileged,
    Privileged,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Cli,
    Privilege,
    Configuration,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Cli => "cli",
            Tier::Privilege => "privilege",
            Tier::Configuration => "configuration",
        })
    }
}

impl Session {
    pub async fn check_enable_mode(&mut self) -> Result<bool> {
        self.check_tier(Tier::Privilege).await
    }

    /// Enter privileged mode, answering the password prompt with the secret.
    pub async fn enable_mode(&mut self) -> Result<String> {
        self.enter_tier(Tier::Privilege).await
    }

    pub async fn exit_enable_mode(&mut self) -> Result<String> {
        self.exit_tier(Tier::Privilege).await
    }

    pub async fn check_config_mode(&mut self) -> Result<bool> {
        self.check_tier(Tier::Configuration).await
    }

    pub async fn config_mode(&mut self) -> Result<String> {
        self.enter_tier(Tier::Configuration).await
    }

    pub async fn exit_config_mode(&mut self) -> Result<String> {
        self.exit_tier(Tier::Configuration).await
    }

    pub async fn check_cli_mode(&mut self) -> Result<bool> {
        self.check_tier(Tier::Cli).await
    }

    /// Enter the CLI from the shell.
    pub async fn cli_mode(&mut self) -> Result<String> {
        self.enter_tier(Tier::Cli).await
    }

    fn tier_commands(&self, tier: Tier) -> Option<&ModeCommands> {
        match tier {
            Tier::Cli => self.profile.cli.as_ref(),
            Tier::Privilege => self.profile.privilege.as_ref(),
            Tier::Configuration => self.profile.configuration.as_ref(),
        }
    }

    async fn check_tier(&mut self, tier: Tier) -> Result<bool> {
        let Some(check) = self.tier_commands(tier).map(|c| c.check.clone()) else {
            return Ok(false);
        };

        let conn = self.conn()?;
        conn.send("\n").await?;
        let output = conn.read_until_prompt(None).await?;
        let active = self.strip_ansi(&output).contains(&check);

        self.note_mode(tier, active);
        Ok(active)
    }

    async fn enter_tier(&mut self, tier: Tier) -> Result<String> {
        let Some(commands) = self.tier_commands(tier).cloned() else {
            return Ok(String::new());
        };
        if self.check_tier(tier).await? {
            return Ok(String::new());
        }

        info!("Host {}: Entering {} mode", self.host(), tier);
        let output = self
            .run_mode_command(&commands.enter, commands.enter_confirm.as_ref())
            .await?;
        if !self.check_tier(tier).await? {
            return Err(Error::usage(
                self.host(),
                format!("Failed to enter {} mode", tier),
            ));
        }
        Ok(output)
    }

    async fn exit_tier(&mut self, tier: Tier) -> Result<String> {
        let Some(commands) = self.tier_commands(tier).cloned() else {
            return Ok(String::new());
        };
        let Some(exit) = commands.exit.as_deref() else {
            return Ok(String::new());
        };
        if !self.check_tier(tier).await? {
            return Ok(String::new());
        }

        info!("Host {}: Exiting {} mode", self.host(), tier);
        let output = self
            .run_mode_command(exit, commands.exit_confirm.as_ref())
            .await?;
        if self.check_tier(tier).await? {
            return Err(Error::usage(
                self.host(),
                format!("Failed to exit {} mode", tier),
            ));
        }
        Ok(output)
    }

    /// Send `command`; if `confirm` asks its question, answer it.
    pub(super) async fn run_mode_command(
        &mut self,
        command: &str,
        confirm: Option<&Confirm>,
    ) -> Result<String> {
        let dialog = match confirm {
            Some(confirm) => {
                let pattern = self.compile(&confirm.pattern, MatchFlags::case_insensitive())?;
                let answer = match &confirm.answer {
                    Answer::Text(text) => text.clone(),
                    Answer::Secret => self.secret(),
                };
                Some((pattern, answer))
            }
            None => None,
        };

        let conn = self.conn()?;
        conn.send(&output::normalize_cmd(command)).await?;

        let Some((pattern, answer)) = dialog else {
            return conn.read_until_prompt(None).await;
        };

        let mut output = conn.read_until_prompt_or_pattern(&pattern).await?;
        if pattern.is_match(output.as_bytes()) {
            conn.send(&output::normalize_cmd(&answer)).await?;
            output += &conn.read_until_prompt(None).await?;
        }
        Ok(output)
    }

    fn note_mode(&mut self, tier: Tier, active: bool) {
        self.mode = match (tier, active) {
            (Tier::Configuration, true) => Mode::Configuration,
            (Tier::Configuration, false) if self.mode == Mode::Configuration => {
                self.resting_mode()
            }
            (Tier::Configuration, false) => self.mode,
            (_, _) if self.mode == Mode::Configuration => Mode::Configuration,
            (Tier::Privilege, true) => Mode::Privileged,
            (Tier::Privilege, false) => Mode::Unprivileged,
            (Tier::Cli, true) => Mode::Cli,
            (Tier::Cli, false) => Mode::Shell,
        };
    }

    /// Mode reached after leaving configuration mode.
    fn resting_mode(&self) -> Mode {
        if self.profile.privilege.is_some() {
            Mode::Privileged
        } else if self.profile.cli.is_some() {
            Mode::Cli
        } else {
            Mode::Unknown
        }
    }
}
