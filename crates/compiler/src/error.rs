//! Parse error type
//!
//! Every front-end failure carries the byte offset it was detected at,
//! so callers can record `(position, message)` pairs on the event log.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Byte offset into the source text where the error was detected.
    pub position: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(position: usize, message: impl Into<String>) -> Self {
        ParseError { position, message: message.into() }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at offset {}: {}", self.position, self.message)
    }
}

impl std::error::Error for ParseError {}
