//! Configuration batches and commits.

use std::sync::Arc;

use log::{debug, info};

use super::session::{ExpectOptions, Session};
use crate::error::{Error, Result};
use crate::platform::CommitCommands;

/// Options for [`Session::send_config_set_with`].
#[derive(Debug, Clone)]
pub struct ConfigSetOptions {
    /// Commit after the batch when the family has a candidate configuration.
    pub with_commit: bool,
    pub commit_comment: Option<String>,
    /// Leave configuration mode after the batch.
    pub exit_config_mode: bool,
}

impl Default for ConfigSetOptions {
    fn default() -> Self {
        Self {
            with_commit: true,
            commit_comment: None,
            exit_config_mode: true,
        }
    }
}

impl ConfigSetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_commit(mut self, commit: bool) -> Self {
        self.with_commit = commit;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.commit_comment = Some(comment.into());
        self
    }

    pub fn with_exit_config_mode(mut self, exit: bool) -> Self {
        self.exit_config_mode = exit;
        self
    }
}

impl Session {
    /// Apply configuration lines with the default options: enter
    /// configuration mode, commit where needed and leave again.
    pub async fn send_config_set<S>(&mut self, commands: &[S]) -> Result<String>
    where
        S: AsRef<str> + Sync,
    {
        self.send_config_set_with(commands, &ConfigSetOptions::default())
            .await
    }

    /// Apply configuration lines.
    ///
    /// Every stage's output is appended to the returned text. When leaving
    /// configuration mode fails after a commit, the commit is reported as
    /// failed.
    pub async fn send_config_set_with<S>(
        &mut self,
        commands: &[S],
        options: &ConfigSetOptions,
    ) -> Result<String>
    where
        S: AsRef<str> + Sync,
    {
        if commands.is_empty() {
            return Ok(String::new());
        }
        if let Some(command) = commands
            .iter()
            .map(AsRef::as_ref)
            .find(|c| c.contains(['\n', '\r']))
        {
            return Err(Error::usage(
                self.host(),
                format!(
                    "Invalid argument passed into send_config_set: {:?} spans several lines",
                    command
                ),
            ));
        }

        info!("Host {}: Sending configuration settings", self.host());
        let mut output = self.config_mode().await?;
        output += &self.send_config_lines(commands).await?;

        let profile = Arc::clone(&self.profile);
        let mut committed = false;
        if options.with_commit {
            if let Some(commit) = &profile.commit {
                output += &self
                    .commit(commit, options.commit_comment.as_deref())
                    .await?;
                committed = true;
            }
        }

        if options.exit_config_mode {
            match self.exit_config_mode().await {
                Ok(exit) => output += &exit,
                Err(Error::Usage { host, reason }) if committed => {
                    return Err(Error::Commit { host, reason });
                }
                Err(e) => return Err(e),
            }
        }

        let output = self.normalize_linefeeds(&output);
        debug!("Host {}: Config commands output: {:?}", self.host(), output);
        Ok(output)
    }

    /// Send each line after a blank resync line and collect the raw echo.
    async fn send_config_lines<S>(&mut self, commands: &[S]) -> Result<String>
    where
        S: AsRef<str> + Sync,
    {
        debug!(
            "Host {}: Config commands: {:?}",
            self.host(),
            commands.iter().map(AsRef::as_ref).collect::<Vec<&str>>()
        );

        let options = ExpectOptions::new();
        let mut output = self.send_command_expect("\n", &options).await?;
        for command in commands {
            output += &self.send_command_expect(command.as_ref(), &options).await?;
        }

        let output = self.strip_ansi(&output);
        Ok(self.normalize_linefeeds(&output))
    }

    /// Commit the candidate configuration and scan for failure markers.
    async fn commit(&mut self, commit: &CommitCommands, comment: Option<&str>) -> Result<String> {
        info!("Host {}: Committing configuration", self.host());
        let command = commit.command_for(comment);
        let output = self
            .run_mode_command(&command, commit.confirm.as_ref())
            .await?;

        let Some(failure) = commit.failures.iter().find(|f| output.contains(&f.marker)) else {
            return Ok(output);
        };

        let mut reason = failure.marker.clone();
        if let Some(detail) = &failure.detail_command {
            let details = self.send_command(detail).await?;
            reason = format!("{}\n{}", reason, details.trim());
        }
        Err(Error::commit(self.host(), reason))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::driver::Mode;
    use crate::platform::VendorProfile;
    use crate::platform::vendors::{cisco, juniper, terminal};
    use crate::testing::{ScriptedTransport, init_logging};
    use crate::transport::ConnectionParams;

    fn session(profile: VendorProfile) -> Session {
        let mut params = ConnectionParams::new("r1");
        params.timeout = Duration::from_millis(200);
        Session::new(params, Arc::new(profile))
    }

    fn junos_connected() -> ScriptedTransport {
        ScriptedTransport::new()
            .banner("\r\nadmin@mx1> ")
            .expect("\n", "\r\nadmin@mx1> ")
            .expect("\n", "\r\nadmin@mx1> ")
            .expect("set cli screen-length 0\n", "\r\nScreen length set to 0\r\n\r\nadmin@mx1> ")
    }

    fn xr_connected() -> ScriptedTransport {
        ScriptedTransport::new()
            .banner("\r\nRP/0/RSP0/CPU0:xr1#")
            .expect("\n", "\r\nRP/0/RSP0/CPU0:xr1#")
            .expect("\n", "\r\nRP/0/RSP0/CPU0:xr1#")
            .expect("terminal length 0\n", "\r\nRP/0/RSP0/CPU0:xr1#")
            .expect("\n", "\r\nRP/0/RSP0/CPU0:xr1#")
            .expect("conf t\n", "\r\nRP/0/RSP0/CPU0:xr1(config)#")
            .expect("\n", "\r\nRP/0/RSP0/CPU0:xr1(config)#")
            .expect("\n", "\r\nRP/0/RSP0/CPU0:xr1(config)#")
            .expect("hostname xr2\n", "hostname xr2\r\nRP/0/RSP0/CPU0:xr1(config)#")
    }

    #[tokio::test]
    async fn test_junos_config_set_with_commit() {
        init_logging();
        let transport = junos_connected()
            .expect("\n", "\r\nadmin@mx1> ")
            .expect("configure\n", "configure\r\nEntering configuration mode\r\n\r\n[edit]\r\nadmin@mx1# ")
            .expect("\n", "\r\n[edit]\r\nadmin@mx1# ")
            .expect("\n", "\r\n[edit]\r\nadmin@mx1# ")
            .expect("interface eth0\n", "interface eth0\r\n\r\n[edit]\r\nadmin@mx1# ")
            .expect("no shutdown\n", "no shutdown\r\n\r\n[edit]\r\nadmin@mx1# ")
            .expect("commit\n", "commit\r\ncommit complete\r\n\r\n[edit]\r\nadmin@mx1# ")
            .expect("\n", "\r\n[edit]\r\nadmin@mx1# ")
            .expect("exit configuration-mode\n", "exit configuration-mode\r\nExiting configuration mode\r\n\r\nadmin@mx1> ")
            .expect("\n", "\r\nadmin@mx1> ");
        let writes = transport.writes();
        let mut session = session(juniper::junos());
        session.connect_with(Box::new(transport)).await.unwrap();
        let before = writes.lock().unwrap().len();

        let output = session
            .send_config_set(&["interface eth0", "no shutdown"])
            .await
            .unwrap();
        assert!(output.contains("commit complete"));
        assert!(!output.contains('\r'));
        assert_eq!(session.mode(), Mode::Cli);

        let commands: Vec<String> = writes.lock().unwrap()[before..]
            .iter()
            .filter(|w| w.as_str() != "\n")
            .cloned()
            .collect();
        assert_eq!(
            commands,
            [
                "configure\n",
                "interface eth0\n",
                "no shutdown\n",
                "commit\n",
                "exit configuration-mode\n"
            ]
        );
    }

    #[tokio::test]
    async fn test_commit_comment() {
        let transport = junos_connected()
            .expect("\n", "\r\nadmin@mx1# ")
            .expect("\n", "\r\nadmin@mx1# ")
            .expect("set system host-name mx2\n", "\r\nadmin@mx1# ")
            .expect("commit comment lab\n", "commit complete\r\nadmin@mx1# ");
        let writes = transport.writes();
        let mut session = session(juniper::junos());
        session.connect_with(Box::new(transport)).await.unwrap();

        let options = ConfigSetOptions::new()
            .with_comment("lab")
            .with_exit_config_mode(false);
        session
            .send_config_set_with(&["set system host-name mx2"], &options)
            .await
            .unwrap();
        assert_eq!(
            writes.lock().unwrap().last().map(String::as_str),
            Some("commit comment lab\n")
        );
    }

    #[tokio::test]
    async fn test_ios_xr_commit_failure_reports_details() {
        let transport = xr_connected()
            .expect(
                "commit\n",
                "commit\r\n% Failed to commit one or more configuration items. Please issue 'show configuration failed' from this session to view the errors\r\nRP/0/RSP0/CPU0:xr1(config)#",
            )
            .expect(
                "show configuration failed\n",
                "show configuration failed\r\n!! SEMANTIC ERRORS\r\nhostname xr2\r\n!!% Invalid argument\r\nRP/0/RSP0/CPU0:xr1(config)#",
            );
        let mut session = session(cisco::ios_xr());
        session.connect_with(Box::new(transport)).await.unwrap();

        let err = session.send_config_set(&["hostname xr2"]).await.unwrap_err();
        assert!(matches!(err, Error::Commit { .. }));
        assert!(err.reason().starts_with("Failed to commit"));
        assert!(err.reason().contains("SEMANTIC ERRORS"));
    }

    #[tokio::test]
    async fn test_ios_xr_concurrent_commit_is_declined() {
        let transport = xr_connected()
            .expect(
                "commit\n",
                "commit\r\n% One or more commits have occurred from other configuration sessions since this session started.\r\nDo you wish to proceed with this commit anyway? [no]: ",
            )
            .expect("no\n", "no\r\nRP/0/RSP0/CPU0:xr1(config)#")
            .expect(
                "show configuration commit changes\n",
                "show configuration commit changes\r\n+hostname xr3\r\nRP/0/RSP0/CPU0:xr1(config)#",
            );
        let mut session = session(cisco::ios_xr());
        session.connect_with(Box::new(transport)).await.unwrap();

        let err = session.send_config_set(&["hostname xr2"]).await.unwrap_err();
        assert!(matches!(err, Error::Commit { .. }));
        assert!(err.reason().contains("+hostname xr3"));
    }

    #[tokio::test]
    async fn test_exit_failure_after_commit_is_commit_error() {
        let transport = xr_connected()
            .expect("commit\n", "commit\r\nRP/0/RSP0/CPU0:xr1(config)#")
            .expect("\n", "\r\nRP/0/RSP0/CPU0:xr1(config)#")
            .expect(
                "end\n",
                "end\r\nUncommitted changes found, commit them before exiting(yes/no/cancel)? [cancel]:",
            )
            .expect("cancel\n", "cancel\r\nRP/0/RSP0/CPU0:xr1(config)#")
            .expect("\n", "\r\nRP/0/RSP0/CPU0:xr1(config)#");
        let mut session = session(cisco::ios_xr());
        session.connect_with(Box::new(transport)).await.unwrap();

        let err = session.send_config_set(&["hostname xr2"]).await.unwrap_err();
        assert!(matches!(err, Error::Commit { .. }));
        assert_eq!(err.reason(), "Failed to exit configuration mode");
    }

    #[tokio::test]
    async fn test_multiline_command_is_rejected() {
        let transport = ScriptedTransport::new()
            .banner("\r\nuser@host:~$ ")
            .expect("\n", "\r\nuser@host:~$ ");
        let writes = transport.writes();
        let mut session = session(terminal::shell());
        session.connect_with(Box::new(transport)).await.unwrap();
        let before = writes.lock().unwrap().len();

        let err = session
            .send_config_set(&["echo one\necho two"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Usage { .. }));
        assert_eq!(writes.lock().unwrap().len(), before);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let transport = ScriptedTransport::new()
            .banner("\r\nuser@host:~$ ")
            .expect("\n", "\r\nuser@host:~$ ");
        let mut session = session(terminal::shell());
        session.connect_with(Box::new(transport)).await.unwrap();

        let empty: [&str; 0] = [];
        assert_eq!(session.send_config_set(&empty).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_batch_without_config_mode() {
        let transport = ScriptedTransport::new()
            .banner("\r\nuser@host:~$ ")
            .expect("\n", "\r\nuser@host:~$ ")
            .expect("\n", "\r\nuser@host:~$ ")
            .expect("export A=1\n", "export A=1\r\nuser@host:~$ ");
        let mut session = session(terminal::shell());
        session.connect_with(Box::new(transport)).await.unwrap();

        let output = session.send_config_set(&["export A=1"]).await.unwrap();
        assert_eq!(output, "\nuser@host:~$ export A=1\nuser@host:~$ ");
    }
}
