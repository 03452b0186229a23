//! Accumulator for device output with incremental pattern search.
//!
//! Prompts only ever show up at the end of the output, so each new chunk is
//! searched together with the last `search_depth` bytes that were already
//! there instead of rescanning the whole accumulator. For large outputs
//! (full routing tables, `show tech`) this keeps the read loop linear.

use regex::bytes::{Match, Regex};

/// Buffer for accumulating output and searching the freshly reachable tail.
#[derive(Debug)]
pub struct PatternBuffer {
    buffer: Vec<u8>,

    /// How many bytes before a new chunk are searched along with it.
    search_depth: usize,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            search_depth,
        }
    }

    /// Append raw bytes.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Search the region that became reachable once the buffer grew past
    /// `previous_len`: the new bytes plus `search_depth` bytes before them.
    pub fn search_since(&self, pattern: &Regex, previous_len: usize) -> Option<Match<'_>> {
        let start = previous_len
            .min(self.buffer.len())
            .saturating_sub(self.search_depth);
        pattern.find_at(&self.buffer, start)
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    #[cfg(test)]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}
