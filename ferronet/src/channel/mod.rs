//! Channel layer for prompt-terminated reads.
//!
//! This module wraps a transport with the buffering and pattern matching
//! needed to find where a command's output ends, plus ANSI stripping.

mod ansi;
mod buffer;
mod connection;
pub mod patterns;

pub use ansi::strip_ansi_escape_codes;
pub use buffer::PatternBuffer;
pub use connection::{Connection, MAX_READ};
pub use patterns::MatchFlags;
