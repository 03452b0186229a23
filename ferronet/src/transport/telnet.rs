//! Telnet transport.
//!
//! Only as much of RFC 854 as a CLI session needs: the server may echo and
//! suppress go-ahead, every other option is refused, subnegotiations are
//! skipped. Login answers the username and password prompts and watches
//! for the usual rejection messages.

use std::time::Duration;

use async_trait::async_trait;
use log::info;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use secrecy::ExposeSecret;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use super::Transport;
use super::config::ConnectionParams;
use crate::error::TransportError;

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

const OPT_ECHO: u8 = 1;
const OPT_SGA: u8 = 3;

static USERNAME_PROMPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(user(name)?|login)\s*:\s*$").unwrap());
static PASSWORD_PROMPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)password\s*:\s*$").unwrap());
static LOGIN_FAILED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(login invalid|login incorrect|authentication failed|access denied|bad password)")
        .unwrap()
});
static SHELL_PROMPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[>#$%\]]\s*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    Iac,
    Negotiate(u8),
    Sub,
    SubIac,
}

/// Incremental decoder separating data from Telnet commands.
#[derive(Debug)]
struct TelnetParser {
    state: State,
}

impl TelnetParser {
    fn new() -> Self {
        Self { state: State::Data }
    }

    /// Decode `input`, appending payload to `data` and negotiation answers
    /// to `replies`. State carries over between calls.
    fn feed(&mut self, input: &[u8], data: &mut Vec<u8>, replies: &mut Vec<u8>) {
        let mut rest = input;
        while !rest.is_empty() {
            if self.state == State::Data {
                match memchr::memchr(IAC, rest) {
                    Some(pos) => {
                        push_payload(data, &rest[..pos]);
                        self.state = State::Iac;
                        rest = &rest[pos + 1..];
                    }
                    None => {
                        push_payload(data, rest);
                        return;
                    }
                }
                continue;
            }

            let byte = rest[0];
            rest = &rest[1..];
            self.state = match (self.state, byte) {
                (State::Iac, IAC) => {
                    data.push(IAC);
                    State::Data
                }
                (State::Iac, WILL | WONT | DO | DONT) => State::Negotiate(byte),
                (State::Iac, SB) => State::Sub,
                (State::Iac, _) => State::Data,
                (State::Negotiate(command), option) => {
                    answer(command, option, replies);
                    State::Data
                }
                (State::Sub, IAC) => State::SubIac,
                (State::Sub, _) => State::Sub,
                (State::SubIac, SE) => State::Data,
                (State::SubIac, _) => State::Sub,
                (State::Data, _) => State::Data,
            };
        }
    }
}

/// NUL only pads a bare carriage return.
fn push_payload(data: &mut Vec<u8>, bytes: &[u8]) {
    data.extend(bytes.iter().copied().filter(|b| *b != 0));
}

fn answer(command: u8, option: u8, replies: &mut Vec<u8>) {
    let reply = match command {
        WILL if option == OPT_ECHO || option == OPT_SGA => DO,
        WILL => DONT,
        DO if option == OPT_SGA => WILL,
        DO => WONT,
        _ => return,
    };
    replies.extend_from_slice(&[IAC, reply, option]);
}

/// Telnet transport over any byte stream (a `TcpStream` in production).
pub struct TelnetTransport<S = TcpStream> {
    stream: S,
    parser: TelnetParser,
    /// Decoded data not yet handed out by `read`.
    pending: Vec<u8>,
    read_buf: Vec<u8>,
}

impl TelnetTransport<TcpStream> {
    /// Connect and log in with the username and password from `params`.
    pub async fn connect(params: &ConnectionParams) -> Result<Self, TransportError> {
        let port = params.port();
        info!(
            "Host {}: Establishing Telnet connection to port {}",
            params.host, port
        );

        let stream = tokio::time::timeout(
            params.timeout,
            TcpStream::connect((params.host.as_str(), port)),
        )
        .await
        .map_err(|_| TransportError::Timeout(params.timeout))?
        .map_err(|source| TransportError::ConnectionFailed {
            host: params.host.clone(),
            port,
            source,
        })?;
        stream.set_nodelay(true)?;

        let mut transport = Self::from_stream(stream);
        let password = params.password.as_ref().map(|p| p.expose_secret());
        transport
            .login(&params.username, password, params.timeout)
            .await?;
        info!("Host {}: Telnet login finished", params.host);
        Ok(transport)
    }
}

impl<S> TelnetTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already connected stream. No login is performed.
    pub fn from_stream(stream: S) -> Self {
        Self {
            stream,
            parser: TelnetParser::new(),
            pending: Vec::new(),
            read_buf: vec![0; 4096],
        }
    }

    /// Answer the username and password prompts.
    ///
    /// Output received after the password is kept, so the prompt that ends
    /// the login is still there for the first read.
    pub async fn login(
        &mut self,
        username: &str,
        password: Option<&str>,
        timeout: Duration,
    ) -> Result<(), TransportError> {
        if username.is_empty() {
            return Ok(());
        }

        let mut seen = Vec::new();
        self.read_until(&[&*USERNAME_PROMPT], &mut seen, timeout)
            .await?;
        self.send_line(username).await?;

        if let Some(password) = password {
            seen.clear();
            self.read_until(&[&*PASSWORD_PROMPT], &mut seen, timeout)
                .await?;
            self.send_line(password).await?;
        }

        seen.clear();
        self.read_until(
            &[&*LOGIN_FAILED, &*USERNAME_PROMPT, &*SHELL_PROMPT],
            &mut seen,
            timeout,
        )
        .await?;
        if LOGIN_FAILED.is_match(&seen) || USERNAME_PROMPT.is_match(&seen) {
            return Err(TransportError::AuthenticationFailed {
                user: username.to_string(),
            });
        }

        seen.append(&mut self.pending);
        self.pending = seen;
        Ok(())
    }

    async fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        self.write_escaped(format!("{}\n", line).as_bytes()).await
    }

    async fn read_until(
        &mut self,
        patterns: &[&Regex],
        seen: &mut Vec<u8>,
        timeout: Duration,
    ) -> Result<(), TransportError> {
        loop {
            let chunk = tokio::time::timeout(timeout, self.read_decoded(usize::MAX))
                .await
                .map_err(|_| TransportError::Timeout(timeout))??;
            seen.extend_from_slice(&chunk);
            if patterns.iter().any(|p| p.is_match(seen.as_slice())) {
                return Ok(());
            }
        }
    }

    async fn read_decoded(&mut self, max: usize) -> Result<Vec<u8>, TransportError> {
        loop {
            if !self.pending.is_empty() {
                let n = self.pending.len().min(max);
                return Ok(self.pending.drain(..n).collect());
            }

            let n = self.stream.read(&mut self.read_buf).await?;
            if n == 0 {
                return Err(TransportError::Disconnected);
            }

            let mut replies = Vec::new();
            self.parser
                .feed(&self.read_buf[..n], &mut self.pending, &mut replies);
            if !replies.is_empty() {
                self.stream.write_all(&replies).await?;
                self.stream.flush().await?;
            }
        }
    }

    async fn write_escaped(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if memchr::memchr(IAC, data).is_none() {
            self.stream.write_all(data).await?;
        } else {
            let mut escaped = Vec::with_capacity(data.len() + 4);
            for &byte in data {
                escaped.push(byte);
                if byte == IAC {
                    escaped.push(IAC);
                }
            }
            self.stream.write_all(&escaped).await?;
        }
        self.stream.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl<S> Transport for TelnetTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.write_escaped(data).await
    }

    async fn read(&mut self, max: usize) -> Result<Vec<u8>, TransportError> {
        self.read_decoded(max).await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::io::Builder;

    use super::*;

    fn decode(parser: &mut TelnetParser, input: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut data = Vec::new();
        let mut replies = Vec::new();
        parser.feed(input, &mut data, &mut replies);
        (data, replies)
    }

    #[test]
    fn test_plain_data_passes_through() {
        let mut parser = TelnetParser::new();
        let (data, replies) = decode(&mut parser, b"router1>");
        assert_eq!(data, b"router1>");
        assert!(replies.is_empty());
    }

    #[test]
    fn test_negotiation_answers() {
        let mut parser = TelnetParser::new();
        let input = [
            IAC, WILL, OPT_ECHO, IAC, WILL, OPT_SGA, IAC, DO, 24, IAC, DO, OPT_SGA, IAC, WILL, 31,
        ];
        let (data, replies) = decode(&mut parser, &input);
        assert!(data.is_empty());
        assert_eq!(
            replies,
            vec![
                IAC, DO, OPT_ECHO, IAC, DO, OPT_SGA, IAC, WONT, 24, IAC, WILL, OPT_SGA, IAC, DONT,
                31
            ]
        );
    }

    #[test]
    fn test_command_split_across_chunks() {
        let mut parser = TelnetParser::new();
        let (data, replies) = decode(&mut parser, &[b'a', IAC]);
        assert_eq!(data, b"a");
        assert!(replies.is_empty());

        let (data, replies) = decode(&mut parser, &[DO, 24, b'b']);
        assert_eq!(data, b"b");
        assert_eq!(replies, vec![IAC, WONT, 24]);
    }

    #[test]
    fn test_subnegotiation_skipped_and_iac_unescaped() {
        let mut parser = TelnetParser::new();
        let input = [
            b'x', IAC, SB, 24, 1, IAC, IAC, IAC, SE, b'y', IAC, IAC, b'\r', 0, b'\n',
        ];
        let (data, _) = decode(&mut parser, &input);
        assert_eq!(data, vec![b'x', b'y', IAC, b'\r', b'\n']);
    }

    #[tokio::test]
    async fn test_login_keeps_prompt_for_first_read() {
        let mock = Builder::new()
            .read(&[IAC, WILL, OPT_ECHO, IAC, WILL, OPT_SGA])
            .write(&[IAC, DO, OPT_ECHO, IAC, DO, OPT_SGA])
            .read(b"\r\nUser Access Verification\r\n\r\nUsername: ")
            .write(b"admin\n")
            .read(b"Password: ")
            .write(b"secret\n")
            .read(b"\r\nrouter1>")
            .build();

        let mut transport = TelnetTransport::from_stream(mock);
        transport
            .login("admin", Some("secret"), Duration::from_secs(1))
            .await
            .unwrap();

        let first = transport.read(1024).await.unwrap();
        assert_eq!(first, b"\r\nrouter1>");
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let mock = Builder::new()
            .read(b"Username: ")
            .write(b"admin\n")
            .read(b"Password: ")
            .write(b"wrong\n")
            .read(b"\r\n% Login invalid\r\n\r\nUsername: ")
            .build();

        let mut transport = TelnetTransport::from_stream(mock);
        let err = transport
            .login("admin", Some("wrong"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::AuthenticationFailed { .. }));
    }

    #[tokio::test]
    async fn test_send_escapes_iac() {
        let mock = Builder::new().write(&[b'a', IAC, IAC, b'b']).build();
        let mut transport = TelnetTransport::from_stream(mock);
        transport.send(&[b'a', IAC, b'b']).await.unwrap();
    }

    #[tokio::test]
    async fn test_eof_is_disconnect() {
        let mock = Builder::new().build();
        let mut transport = TelnetTransport::from_stream(mock);
        let err = transport.read(1024).await.unwrap_err();
        assert!(matches!(err, TransportError::Disconnected));
    }
}
