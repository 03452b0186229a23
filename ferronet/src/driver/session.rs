//! The session engine: bootstrap, commands and output scrubbing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use regex::bytes::Regex;
use secrecy::ExposeSecret;

use super::modes::Mode;
use super::output;
use super::response::Response;
use crate::channel::{Connection, MatchFlags, strip_ansi_escape_codes};
use crate::error::{Error, Result};
use crate::parse::StructuredParser;
use crate::platform::VendorProfile;
use crate::transport::{self, ConnectionParams, SshTunnel, Transport};

/// Default duration of [`Session::send_command_timing`].
pub const DEFAULT_READ_FOR: Duration = Duration::from_secs(2);

/// Options for [`Session::send_command_with`].
#[derive(Debug, Clone)]
pub struct SendOptions {
    /// Pattern that ends the command instead of the prompt.
    pub pattern: Option<String>,
    pub flags: MatchFlags,
    /// Remove the echoed command.
    pub strip_command: bool,
    /// Remove the trailing prompt line.
    pub strip_prompt: bool,
    /// Run the output through the session's structured parser.
    pub parse: bool,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            pattern: None,
            flags: MatchFlags::default(),
            strip_command: true,
            strip_prompt: true,
            parse: false,
        }
    }
}

impl SendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_flags(mut self, flags: MatchFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_strip_command(mut self, strip: bool) -> Self {
        self.strip_command = strip;
        self
    }

    pub fn with_strip_prompt(mut self, strip: bool) -> Self {
        self.strip_prompt = strip;
        self
    }

    pub fn with_parse(mut self, parse: bool) -> Self {
        self.parse = parse;
        self
    }
}

/// Options for [`Session::send_command_expect`].
#[derive(Debug, Clone, Default)]
pub struct ExpectOptions {
    /// Stop at this pattern as well as at the prompt.
    pub pattern: Option<String>,
    pub flags: MatchFlags,
    /// Only write the command.
    pub dont_read: bool,
    /// Keep reading until the device stays silent this long.
    pub read_for: Option<Duration>,
}

impl ExpectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_flags(mut self, flags: MatchFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_dont_read(mut self, dont_read: bool) -> Self {
        self.dont_read = dont_read;
        self
    }

    pub fn with_read_for(mut self, read_for: Duration) -> Self {
        self.read_for = Some(read_for);
        self
    }
}

/// An interactive CLI session with one device.
///
/// Every operation takes `&mut self`, so a session runs one transaction at a
/// time. Call [`disconnect`](Self::disconnect) when done; dropping a
/// connected session closes the transport without leaving configuration
/// mode.
pub struct Session {
    params: ConnectionParams,
    pub(super) profile: Arc<VendorProfile>,
    connection: Option<Connection>,
    pub(super) mode: Mode,
    parser: Option<Arc<dyn StructuredParser>>,
}

impl Session {
    pub fn new(params: ConnectionParams, profile: Arc<VendorProfile>) -> Self {
        Self {
            params,
            profile,
            connection: None,
            mode: Mode::Unknown,
            parser: None,
        }
    }

    /// Use `parser` for commands sent with [`SendOptions::parse`].
    pub fn with_parser(mut self, parser: Arc<dyn StructuredParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn set_parser(&mut self, parser: Arc<dyn StructuredParser>) {
        self.parser = Some(parser);
    }

    pub fn host(&self) -> &str {
        &self.params.host
    }

    pub fn device_type(&self) -> &str {
        &self.profile.name
    }

    pub fn profile(&self) -> &Arc<VendorProfile> {
        &self.profile
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Mode as seen by the last probe.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    /// Base prompt discovered at connect.
    pub fn base_prompt(&self) -> Option<&str> {
        self.connection.as_ref().map(Connection::base_prompt)
    }

    /// Pattern that marks the end of a command.
    pub fn base_pattern(&self) -> Option<&Regex> {
        self.connection.as_ref().and_then(Connection::base_pattern)
    }

    /// Handle for tunnelling another SSH connection through this one.
    pub fn ssh_tunnel(&self) -> Option<SshTunnel> {
        self.connection.as_ref().and_then(Connection::tunnel)
    }

    /// The privilege secret, empty when not configured.
    pub(crate) fn secret(&self) -> String {
        self.params
            .secret
            .as_ref()
            .map(|s| s.expose_secret().to_string())
            .unwrap_or_default()
    }

    pub(super) fn conn(&mut self) -> Result<&mut Connection> {
        let host = &self.params.host;
        self.connection
            .as_mut()
            .ok_or_else(|| Error::usage(host, "Session is not connected"))
    }

    /// Open the transport selected by the connection parameters and prepare
    /// the session.
    pub async fn connect(&mut self) -> Result<()> {
        self.ensure_closed()?;

        let mut params = self.params.clone();
        if let Some(suffix) = &self.profile.username_suffix {
            params.username.push_str(suffix);
        }

        info!(
            "Host {}: Connecting over {:?} to port {}",
            self.host(),
            params.protocol,
            params.port()
        );
        let transport = transport::open(&params)
            .await
            .map_err(|e| e.into_error(&self.params.host))?;
        self.connect_with(transport).await
    }

    /// Prepare the session over an already open transport.
    pub async fn connect_with(&mut self, transport: Box<dyn Transport>) -> Result<()> {
        self.ensure_closed()?;

        self.connection = Some(Connection::new(
            transport,
            self.params.host.clone(),
            self.params.timeout,
        ));

        if let Err(e) = self.prepare().await {
            if let Some(mut connection) = self.connection.take() {
                let _ = connection.close().await;
            }
            self.mode = Mode::Unknown;
            return Err(e);
        }

        info!("Host {}: Has connected to the device", self.host());
        Ok(())
    }

    /// Run the vendor cleanup and close the transport.
    ///
    /// Disconnecting a closed session does nothing.
    pub async fn disconnect(&mut self) -> Result<()> {
        if self.connection.is_none() {
            return Ok(());
        }

        if let Some(behavior) = self.profile.behavior.clone() {
            if let Err(e) = behavior.cleanup(self).await {
                warn!("Host {}: Cleanup before disconnect failed: {}", self.host(), e);
            }
        }

        self.mode = Mode::Unknown;
        if let Some(mut connection) = self.connection.take() {
            info!("Host {}: Disconnecting", self.host());
            connection.close().await?;
        }
        Ok(())
    }

    fn ensure_closed(&self) -> Result<()> {
        if self.connection.is_some() {
            return Err(Error::usage(self.host(), "Session is already connected"));
        }
        Ok(())
    }

    async fn prepare(&mut self) -> Result<()> {
        self.flush_banner().await?;
        self.set_base_prompt().await?;
        if let Some(behavior) = self.profile.behavior.clone() {
            behavior.prepare(self).await?;
        }
        self.disable_paging().await?;
        Ok(())
    }

    fn discovery_pattern(&self) -> Result<Regex> {
        self.profile
            .discovery_pattern()
            .map_err(|e| Error::usage(self.host(), format!("Invalid delimiters: {}", e)))
    }

    /// Drop everything up to the first prompt delimiter.
    async fn flush_banner(&mut self) -> Result<()> {
        let pattern = self.discovery_pattern()?;
        let banner = self.conn()?.read_until_pattern(Some(&pattern), None).await?;
        debug!("Host {}: Flushed {:?}", self.host(), banner);
        Ok(())
    }

    /// Send a bare newline and return the last line of the reply.
    async fn find_prompt(&mut self) -> Result<String> {
        info!("Host {}: Finding prompt", self.host());
        let pattern = self.discovery_pattern()?;
        let conn = self.conn()?;
        conn.send("\n").await?;
        let output = conn.read_until_pattern(Some(&pattern), None).await?;

        let output = self.strip_ansi(&output);
        let prompt = output::last_line(&output);
        if prompt.is_empty() {
            return Err(Error::usage(
                self.host(),
                format!("Unable to find prompt: {:?}", output),
            ));
        }
        debug!("Host {}: Found prompt: {:?}", self.host(), prompt);
        Ok(prompt.to_string())
    }

    async fn set_base_prompt(&mut self) -> Result<()> {
        let prompt = self.find_prompt().await?;
        let base_prompt = self.profile.prompt_style.base_prompt(&prompt);
        // a bare terminator is only usable when the prompt text is not what
        // ends a command
        if base_prompt.is_empty()
            && self.profile.command_pattern.is_none()
            && self.profile.prompt_template.contains("{prompt}")
        {
            return Err(Error::usage(
                self.host(),
                format!("Unable to find prompt: no base prompt in {:?}", prompt),
            ));
        }
        let base_pattern = self.profile.base_pattern(&base_prompt).map_err(|e| {
            Error::usage(self.host(), format!("Invalid prompt template: {}", e))
        })?;

        info!("Host {}: Base prompt: {:?}", self.host(), base_prompt);
        info!("Host {}: Base pattern: {}", self.host(), base_pattern.as_str());

        let conn = self.conn()?;
        conn.set_base_prompt(base_prompt);
        conn.set_base_pattern(base_pattern);
        Ok(())
    }

    async fn disable_paging(&mut self) -> Result<()> {
        let Some(command) = self.profile.paging_command.clone() else {
            return Ok(());
        };
        info!("Host {}: Disabling paging", self.host());
        let output = self
            .send_command_expect(&command, &ExpectOptions::new())
            .await?;
        debug!("Host {}: Disable paging output: {:?}", self.host(), output);
        Ok(())
    }

    /// Send a command and return its cleaned output.
    pub async fn send_command(&mut self, command: &str) -> Result<String> {
        let response = self
            .send_command_with(command, &SendOptions::default())
            .await?;
        Ok(response.result)
    }

    /// Send a command and wait for the prompt (or `options.pattern`).
    pub async fn send_command_with(
        &mut self,
        command: &str,
        options: &SendOptions,
    ) -> Result<Response> {
        let started = Instant::now();
        let command = output::normalize_cmd(command);

        let pattern = match (&options.pattern, &self.profile.command_pattern) {
            (Some(pattern), _) => Some(self.compile(pattern, options.flags)?),
            (None, Some(pattern)) => Some(self.compile(pattern, MatchFlags::default())?),
            (None, None) => None,
        };

        debug!("Host {}: Send command: {:?}", self.host(), command);
        let conn = self.conn()?;
        conn.send(&command).await?;
        let raw = conn.read_until_pattern(pattern.as_ref(), None).await?;

        let normalized = self.normalize_linefeeds(&self.strip_ansi(&raw));
        let prompt = output::last_line(&normalized).to_string();
        let mut result = normalized;
        if options.strip_prompt {
            result = output::strip_prompt(&result, self.base_prompt().unwrap_or_default());
        }
        if options.strip_command {
            result = output::strip_command(&command, &result);
        }
        debug!("Host {}: Send command output: {:?}", self.host(), result);

        let mut response = Response::new(
            command.trim_end(),
            result,
            raw,
            prompt,
            started.elapsed(),
        );
        if let Some(failure) = self.profile.detect_failure(&response.result) {
            response = response.with_failure(failure);
        }
        if options.parse {
            let records = self.parse(&command, &response.result)?;
            response = response.with_parsed(records);
        }
        Ok(response)
    }

    /// Write one line and read until the prompt, or until `options.pattern`.
    ///
    /// The output is returned raw: no ANSI stripping, no line ending changes.
    pub async fn send_command_expect(
        &mut self,
        command: &str,
        options: &ExpectOptions,
    ) -> Result<String> {
        let pattern = options
            .pattern
            .as_deref()
            .map(|p| self.compile(p, options.flags))
            .transpose()?;

        let conn = self.conn()?;
        conn.send(&output::normalize_cmd(command)).await?;
        if options.dont_read {
            return Ok(String::new());
        }

        match pattern {
            Some(pattern) => conn.read_until_prompt_or_pattern(&pattern).await,
            None => conn.read_until_prompt(options.read_for).await,
        }
    }

    /// Send a command and keep reading until the device has been silent for
    /// `read_for` (default two seconds) or the prompt shows up.
    pub async fn send_command_timing(
        &mut self,
        command: &str,
        read_for: Option<Duration>,
    ) -> Result<String> {
        let options = ExpectOptions::new().with_read_for(read_for.unwrap_or(DEFAULT_READ_FOR));
        self.send_command_expect(command, &options).await
    }

    pub(super) fn compile(&self, pattern: &str, flags: MatchFlags) -> Result<Regex> {
        flags.compile(pattern).map_err(|e| {
            Error::usage(self.host(), format!("Invalid pattern {:?}: {}", pattern, e))
        })
    }

    pub(super) fn strip_ansi(&self, text: &str) -> String {
        if self.profile.ansi_escape_codes {
            strip_ansi_escape_codes(text)
        } else {
            text.to_string()
        }
    }

    pub(super) fn normalize_linefeeds(&self, text: &str) -> String {
        match &self.profile.behavior {
            Some(behavior) => behavior.normalize_linefeeds(text),
            None => output::normalize_linefeeds(text),
        }
    }

    fn parse(&self, command: &str, output: &str) -> Result<Vec<crate::parse::Record>> {
        let parser = self
            .parser
            .as_ref()
            .ok_or_else(|| Error::usage(self.host(), "No structured parser configured"))?;
        parser
            .parse(self.device_type(), command.trim(), output)
            .map_err(|e| Error::usage(self.host(), e.to_string()))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.connection.is_some() {
            warn!(
                "Host {}: Session dropped while connected, call disconnect() first",
                self.params.host
            );
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.params.host)
            .field("device_type", &self.profile.name)
            .field("mode", &self.mode)
            .field("connection", &self.connection)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::SecretString;

    use super::*;
    use crate::parse::{ParseError, Record};
    use crate::platform::vendors::{cisco, mikrotik, terminal};
    use crate::testing::{ScriptedTransport, init_logging};

    fn session(profile: VendorProfile) -> Session {
        let mut params = ConnectionParams::new("r1");
        params.secret = Some(SecretString::new("s3cret".into()));
        params.timeout = Duration::from_millis(200);
        Session::new(params, Arc::new(profile))
    }

    fn ios_enabled() -> ScriptedTransport {
        ScriptedTransport::new()
            .banner("Authorized access only\r\n\r\nrouter1#")
            .expect("\n", "\r\nrouter1#")
            .expect("\n", "\r\nrouter1#")
            .expect("terminal length 0\n", "terminal length 0\r\nrouter1#")
    }

    struct InterfaceParser;

    impl StructuredParser for InterfaceParser {
        fn parse(
            &self,
            device_type: &str,
            command: &str,
            output: &str,
        ) -> std::result::Result<Vec<Record>, ParseError> {
            if command != "show ip interface brief" {
                return Err(ParseError::NoTemplate {
                    device_type: device_type.to_string(),
                    command: command.to_string(),
                });
            }
            Ok(output
                .lines()
                .skip(1)
                .filter_map(|line| line.split_whitespace().next())
                .map(|name| HashMap::from([("interface".to_string(), name.to_string())]))
                .collect())
        }
    }

    #[tokio::test]
    async fn test_connect_discovers_base_prompt() {
        init_logging();
        let mut session = session(cisco::ios());
        session.connect_with(Box::new(ios_enabled())).await.unwrap();

        assert!(session.is_open());
        assert_eq!(session.base_prompt(), Some("router1"));
        assert!(session.base_pattern().unwrap().is_match(b"router1(config-if)#"));
        assert_eq!(session.mode(), Mode::Privileged);
    }

    #[tokio::test]
    async fn test_bare_terminator_prompt_is_usage_error() {
        let transport = ScriptedTransport::new()
            .banner("User Access Verification\r\n\r\n#")
            .expect("\n", "\r\n#");
        let mut session = session(cisco::ios());

        let err = session
            .connect_with(Box::new(transport))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Usage { .. }));
        assert!(err.reason().starts_with("Unable to find prompt"));
        assert!(!session.is_open());
    }

    #[tokio::test]
    async fn test_terminal_accepts_bare_terminator() {
        let transport = ScriptedTransport::new()
            .banner("Last login: Mon Oct 12 09:14:07 2026\r\n$ ")
            .expect("\n", "\r\n$ ");
        let mut session = session(terminal::shell());

        session.connect_with(Box::new(transport)).await.unwrap();
        assert_eq!(session.base_prompt(), Some(""));
    }

    #[tokio::test]
    async fn test_prompt_split_across_reads() {
        let transport = ScriptedTransport::new()
            .banner("\r\nRP/0/RSP0/CPU0:xr1#")
            .expect("\n", "\r\nRP/0/RSP0/CPU0:xr1#")
            .expect("\n", "\r\nRP/0/RSP0/CPU0:xr1#")
            .expect("terminal length 0\n", "terminal length 0\r\nRP/0/RSP0/CPU0:xr1#")
            .expect_chunks(
                "show clock\n",
                &[
                    "show clock\r\n",
                    "Mon Oct 12 09:14:07.123 UTC\r\n",
                    "RP/0/RSP0/CPU0:xr",
                    "1#",
                ],
            );
        let mut session = session(cisco::ios_xr());
        session.connect_with(Box::new(transport)).await.unwrap();
        assert_eq!(session.base_prompt(), Some("RP/0/RSP0/CPU0:xr1"));

        let output = session.send_command("show clock").await.unwrap();
        assert_eq!(output, "Mon Oct 12 09:14:07.123 UTC");
    }

    #[tokio::test]
    async fn test_send_command_strips_echo_and_prompt() {
        let transport = ios_enabled().expect(
            "show clock\n",
            "show clock\r\n*12:00:01.123 UTC Mon Mar 1 2021\r\nrouter1#",
        );
        let mut session = session(cisco::ios());
        session.connect_with(Box::new(transport)).await.unwrap();

        let output = session.send_command("show clock").await.unwrap();
        assert_eq!(output, "*12:00:01.123 UTC Mon Mar 1 2021");
    }

    #[tokio::test]
    async fn test_send_command_reports_failure() {
        let transport = ios_enabled().expect(
            "show foo\n",
            "show foo\r\n         ^\r\n% Invalid input detected at '^' marker.\r\n\r\nrouter1#",
        );
        let mut session = session(cisco::ios());
        session.connect_with(Box::new(transport)).await.unwrap();

        let response = session
            .send_command_with("show foo", &SendOptions::new())
            .await
            .unwrap();
        assert!(!response.is_success());
        assert_eq!(response.failure_message.as_deref(), Some("% Invalid input"));
        assert_eq!(response.command, "show foo");
        assert_eq!(response.prompt, "router1#");
        assert!(response.raw_result.ends_with("router1#"));
    }

    #[tokio::test]
    async fn test_send_command_stops_at_custom_pattern() {
        let transport = ios_enabled().expect(
            "copy running-config startup-config\n",
            "copy running-config startup-config\r\nDestination filename [startup-config]? ",
        );
        let mut session = session(cisco::ios());
        session.connect_with(Box::new(transport)).await.unwrap();

        let options = SendOptions::new().with_pattern(r"\[startup-config\]\?");
        let response = session
            .send_command_with("copy running-config startup-config", &options)
            .await
            .unwrap();
        assert_eq!(response.result, "Destination filename [startup-config]? ");
    }

    #[tokio::test]
    async fn test_send_command_keeps_prompt_when_asked() {
        let transport = ios_enabled().expect("show clock\n", "show clock\r\n12:00\r\nrouter1#");
        let mut session = session(cisco::ios());
        session.connect_with(Box::new(transport)).await.unwrap();

        let options = SendOptions::new()
            .with_strip_prompt(false)
            .with_strip_command(false);
        let response = session.send_command_with("show clock", &options).await.unwrap();
        assert_eq!(response.result, "show clock\n12:00\nrouter1#");
    }

    #[tokio::test]
    async fn test_ftd_uses_profile_command_pattern() {
        let transport = ScriptedTransport::new()
            .banner("Copyright 2004-2021, Cisco and/or its affiliates.\r\n> ")
            .expect("\n", "\r\n> ")
            .expect(
                "show version\n",
                "show version\r\n---[ ftd01 ]---\r\nModel : Cisco Firepower 2110\r\n> ",
            );
        let mut session = session(cisco::ftd());
        session.connect_with(Box::new(transport)).await.unwrap();

        let output = session.send_command("show version").await.unwrap();
        assert_eq!(output, "---[ ftd01 ]---\nModel : Cisco Firepower 2110");
    }

    #[tokio::test]
    async fn test_mikrotik_output_is_scrubbed() {
        let transport = ScriptedTransport::new()
            .banner("MikroTik RouterOS 6.48\r\n\r\n[admin@MikroTik] > ")
            .expect("\n", "\x1b[9999B\r\n[admin@MikroTik] > ")
            .expect(
                "/system identity print\n",
                "/system identity print\r\n\x1b[2K  name: MikroTik\r\n[admin@MikroTik] > ",
            );
        let mut session = session(mikrotik::routeros());
        session.connect_with(Box::new(transport)).await.unwrap();
        assert_eq!(session.base_prompt(), Some("admin@MikroTik"));

        let output = session.send_command("/system identity print").await.unwrap();
        assert_eq!(output, "  name: MikroTik");
    }

    #[tokio::test]
    async fn test_send_command_timing_returns_after_silence() {
        let transport = ios_enabled().expect("reload\n", "reload\r\nProceed with reload? [confirm]");
        let mut session = session(cisco::ios());
        session.connect_with(Box::new(transport)).await.unwrap();

        let output = session
            .send_command_timing("reload", Some(Duration::from_millis(50)))
            .await
            .unwrap();
        assert_eq!(output, "reload\r\nProceed with reload? [confirm]");
    }

    #[tokio::test]
    async fn test_send_command_expect_without_reading() {
        let transport = ios_enabled().expect("reload\n", "reload\r\nProceed with reload? [confirm]");
        let writes = transport.writes();
        let mut session = session(cisco::ios());
        session.connect_with(Box::new(transport)).await.unwrap();

        let options = ExpectOptions::new().with_dont_read(true);
        let output = session.send_command_expect("reload", &options).await.unwrap();
        assert_eq!(output, "");
        assert_eq!(writes.lock().unwrap().last().map(String::as_str), Some("reload\n"));
    }

    #[tokio::test]
    async fn test_missing_prompt_times_out() {
        let transport = ios_enabled().expect("show tech-support\n", "show tech-support\r\n---- show version ----");
        let mut session = session(cisco::ios());
        session.connect_with(Box::new(transport)).await.unwrap();

        let err = session.send_command("show tech-support").await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert!(err.to_string().starts_with("Host r1 timeout error"));
    }

    #[tokio::test]
    async fn test_parse_runs_structured_parser() {
        let transport = ios_enabled().expect(
            "show ip interface brief\n",
            "show ip interface brief\r\nInterface    IP-Address  OK? Method Status Protocol\r\nGi0/0    10.0.0.1  YES NVRAM  up  up\r\nGi0/1    unassigned  YES unset  down  down\r\nrouter1#",
        );
        let mut session = session(cisco::ios()).with_parser(Arc::new(InterfaceParser));
        session.connect_with(Box::new(transport)).await.unwrap();

        let options = SendOptions::new().with_parse(true);
        let response = session
            .send_command_with("show ip interface brief", &options)
            .await
            .unwrap();
        let names: Vec<&str> = response
            .parsed
            .as_ref()
            .unwrap()
            .iter()
            .map(|r| r["interface"].as_str())
            .collect();
        assert_eq!(names, ["Gi0/0", "Gi0/1"]);
    }

    #[tokio::test]
    async fn test_parse_without_parser_is_usage_error() {
        let transport = ios_enabled().expect("show clock\n", "show clock\r\n12:00\r\nrouter1#");
        let mut session = session(cisco::ios());
        session.connect_with(Box::new(transport)).await.unwrap();

        let err = session
            .send_command_with("show clock", &SendOptions::new().with_parse(true))
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "No structured parser configured");
    }

    #[tokio::test]
    async fn test_operations_need_a_connection() {
        let mut session = session(cisco::ios());
        let err = session.send_command("show clock").await.unwrap_err();
        assert!(matches!(err, Error::Usage { .. }));
        assert_eq!(err.reason(), "Session is not connected");
    }

    #[tokio::test]
    async fn test_connect_twice_is_usage_error() {
        let mut session = session(cisco::ios());
        session.connect_with(Box::new(ios_enabled())).await.unwrap();

        let err = session
            .connect_with(Box::new(ScriptedTransport::new()))
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "Session is already connected");
        assert!(session.is_open());
    }

    #[tokio::test]
    async fn test_disconnect_leaves_config_mode() {
        let transport = ios_enabled()
            .expect("\n", "\r\nrouter1(config)#")
            .expect("end\n", "end\r\nrouter1#")
            .expect("\n", "\r\nrouter1#");
        let writes = transport.writes();
        let mut session = session(cisco::ios());
        session.connect_with(Box::new(transport)).await.unwrap();

        session.disconnect().await.unwrap();
        assert!(!session.is_open());
        assert_eq!(session.mode(), Mode::Unknown);
        assert!(writes.lock().unwrap().iter().any(|w| w == "end\n"));

        session.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_disconnect_survives_failed_cleanup() {
        let mut session = session(cisco::ios());
        session.connect_with(Box::new(ios_enabled())).await.unwrap();

        session.disconnect().await.unwrap();
        assert!(!session.is_open());
    }
}
