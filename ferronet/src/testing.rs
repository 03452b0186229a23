//! Scripted in-memory transport for session tests.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::TransportError;
use crate::transport::Transport;

/// Transport that replays device output in response to expected writes.
///
/// `banner` queues output that is available right away; `expect` pairs a
/// write with the output it produces. An unexpected write fails with an I/O
/// error. Once the queue is drained reads hang (so read timeouts fire),
/// unless `closed` was set, in which case they report a disconnect.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    reads: VecDeque<Vec<u8>>,
    script: VecDeque<(String, Vec<String>)>,
    writes: Arc<Mutex<Vec<String>>>,
    closed: bool,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn banner(mut self, output: &str) -> Self {
        self.reads.push_back(output.as_bytes().to_vec());
        self
    }

    /// Expect `write` next and answer it with `reply`.
    pub(crate) fn expect(self, write: &str, reply: &str) -> Self {
        self.expect_chunks(write, &[reply])
    }

    /// Expect `write` next and answer it with several chunks.
    pub(crate) fn expect_chunks(mut self, write: &str, replies: &[&str]) -> Self {
        self.script.push_back((
            write.to_string(),
            replies.iter().map(|r| r.to_string()).collect(),
        ));
        self
    }

    /// Report a disconnect once all output was read.
    pub(crate) fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    /// Shared log of everything written.
    pub(crate) fn writes(&self) -> Arc<Mutex<Vec<String>>> {
        self.writes.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let data = String::from_utf8_lossy(data).into_owned();
        self.writes.lock().unwrap().push(data.clone());

        match self.script.pop_front() {
            Some((expected, replies)) if expected == data => {
                self.reads
                    .extend(replies.into_iter().map(String::into_bytes));
                Ok(())
            }
            Some((expected, _)) => Err(TransportError::Io(io::Error::other(format!(
                "expected write {:?}, got {:?}",
                expected, data
            )))),
            None => Err(TransportError::Io(io::Error::other(format!(
                "unexpected write {:?}",
                data
            )))),
        }
    }

    async fn read(&mut self, max: usize) -> Result<Vec<u8>, TransportError> {
        match self.reads.pop_front() {
            Some(mut chunk) => {
                if chunk.len() > max {
                    let rest = chunk.split_off(max);
                    self.reads.push_front(rest);
                }
                Ok(chunk)
            }
            None if self.closed => Err(TransportError::Disconnected),
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Install a logger once for tests that want to see the session log.
pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
