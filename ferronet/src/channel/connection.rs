//! Delimiter-aware reads over a boxed transport.

use std::time::Duration;

use log::{debug, trace};
use regex::bytes::Regex;

use super::buffer::PatternBuffer;
use crate::error::{Error, Result};
use crate::transport::{SshTunnel, Transport};

/// Upper bound for a single transport read.
pub const MAX_READ: usize = 65535;

/// One open byte channel plus the prompt state derived for it.
///
/// The connection is the only place the base prompt and base pattern live.
/// Bytes that arrived after the last match (or before a timeout) stay in the
/// buffer and are returned by the next read.
pub struct Connection {
    transport: Box<dyn Transport>,
    host: String,
    timeout: Duration,
    buffer: PatternBuffer,
    base_prompt: String,
    base_pattern: Option<Regex>,
}

impl Connection {
    pub fn new(transport: Box<dyn Transport>, host: impl Into<String>, timeout: Duration) -> Self {
        Self {
            transport,
            host: host.into(),
            timeout,
            buffer: PatternBuffer::default(),
            base_prompt: String::new(),
            base_pattern: None,
        }
    }

    pub fn base_prompt(&self) -> &str {
        &self.base_prompt
    }

    pub fn set_base_prompt(&mut self, base_prompt: impl Into<String>) {
        self.base_prompt = base_prompt.into();
    }

    pub fn base_pattern(&self) -> Option<&Regex> {
        self.base_pattern.as_ref()
    }

    pub fn set_base_pattern(&mut self, pattern: Regex) {
        self.base_pattern = Some(pattern);
    }

    /// Bytes received but not yet returned to a caller.
    #[cfg(test)]
    pub fn buffered(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Handle for tunnelling another connection through this one (SSH only).
    pub fn tunnel(&self) -> Option<SshTunnel> {
        self.transport.tunnel()
    }

    /// Write `data` to the device as is.
    pub async fn send(&mut self, data: &str) -> Result<()> {
        trace!("Host {}: write {} bytes", self.host, data.len());
        self.transport
            .send(data.as_bytes())
            .await
            .map_err(|e| e.into_error(&self.host))
    }

    /// Return whatever is buffered, or wait for the next chunk.
    pub async fn read(&mut self) -> Result<String> {
        if self.buffer.is_empty() {
            let chunk = self.read_chunk(self.timeout).await?;
            self.buffer.extend(&chunk);
        }
        Ok(String::from_utf8_lossy(&self.buffer.take()).into_owned())
    }

    /// Read until `pattern` (or the base pattern when `None`) shows up.
    ///
    /// Each chunk must arrive within `read_for`, or the connection timeout
    /// when `read_for` is not given. With `read_for` an expired wait returns
    /// what has accumulated; without it the wait fails with a timeout error
    /// and the accumulated bytes stay buffered.
    pub async fn read_until_pattern(
        &mut self,
        pattern: Option<&Regex>,
        read_for: Option<Duration>,
    ) -> Result<String> {
        let pattern = match pattern {
            Some(pattern) => pattern.clone(),
            None => self.require_base_pattern()?,
        };
        self.read_until_any(&[pattern], read_for).await
    }

    /// Read until the base pattern shows up.
    pub async fn read_until_prompt(&mut self, read_for: Option<Duration>) -> Result<String> {
        self.read_until_pattern(None, read_for).await
    }

    /// Read until either `pattern` or the base pattern shows up.
    pub async fn read_until_prompt_or_pattern(&mut self, pattern: &Regex) -> Result<String> {
        let base = self.require_base_pattern()?;
        self.read_until_any(&[pattern.clone(), base], None).await
    }

    pub async fn close(&mut self) -> Result<()> {
        self.transport
            .close()
            .await
            .map_err(|e| e.into_error(&self.host))
    }

    fn require_base_pattern(&self) -> Result<Regex> {
        self.base_pattern
            .clone()
            .ok_or_else(|| Error::usage(&self.host, "Base pattern is not set, find the prompt first"))
    }

    async fn read_until_any(
        &mut self,
        patterns: &[Regex],
        read_for: Option<Duration>,
    ) -> Result<String> {
        let read_for = read_for.filter(|d| !d.is_zero());
        let wait = read_for.unwrap_or(self.timeout);

        loop {
            let chunk = match self.read_chunk(wait).await {
                Ok(chunk) => chunk,
                Err(Error::Timeout { .. }) if read_for.is_some() => {
                    let output = self.take_output();
                    debug!(
                        "Host {}: read for {:?} returned {:?}",
                        self.host, wait, output
                    );
                    return Ok(output);
                }
                Err(Error::Timeout { host, .. }) => {
                    let wanted: Vec<&str> = patterns.iter().map(|p| p.as_str()).collect();
                    return Err(Error::Timeout {
                        host,
                        reason: format!(
                            "no match for {:?} within {:?}, {} bytes buffered",
                            wanted,
                            wait,
                            self.buffer.len()
                        ),
                    });
                }
                Err(e) => return Err(e),
            };

            let before = self.buffer.len();
            self.buffer.extend(&chunk);

            if let Some(found) = patterns
                .iter()
                .find(|p| self.buffer.search_since(p, before).is_some())
            {
                let output = self.take_output();
                debug!(
                    "Host {}: pattern {:?} found in {:?}",
                    self.host,
                    found.as_str(),
                    output
                );
                return Ok(output);
            }
        }
    }

    async fn read_chunk(&mut self, wait: Duration) -> Result<Vec<u8>> {
        match tokio::time::timeout(wait, self.transport.read(MAX_READ)).await {
            Ok(Ok(chunk)) => {
                trace!("Host {}: read {} bytes", self.host, chunk.len());
                Ok(chunk)
            }
            Ok(Err(e)) => Err(e.into_error(&self.host)),
            Err(_) => Err(Error::timeout(
                &self.host,
                format!("no data within {:?}", wait),
            )),
        }
    }

    fn take_output(&mut self) -> String {
        String::from_utf8_lossy(&self.buffer.take()).into_owned()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("host", &self.host)
            .field("timeout", &self.timeout)
            .field("base_prompt", &self.base_prompt)
            .field("base_pattern", &self.base_pattern.as_ref().map(|p| p.as_str()))
            .field("buffered", &self.buffer.len())
            .finish()
    }
}
