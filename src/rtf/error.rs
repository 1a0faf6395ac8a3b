//! Error types for the RTF streaming processor.

use std::fmt;
use std::io;

/// Result type for RTF processor operations.
pub type RtfResult<T> = Result<T, RtfError>;

/// Errors latched by the RTF processor while scanning a document.
///
/// Unlike the crate-level [`crate::common::Error`], this type is not derived via `thiserror`:
/// it mirrors the processor's own latched-error field, which stores at most one of these at a
/// time and is inspected at the top of the main loop rather than unwound immediately.
#[derive(Debug)]
pub enum RtfError {
    /// Unexpected end-of-input while reading a control word, `\'hh` escape, or plain byte.
    Io(io::Error),
    /// A `\` was not followed by a recognizable command lead byte.
    InvalidCommand(String),
    /// A bounded structure (currently only the font table) could not accept a new entry.
    OutOfMemory(String),
    /// An internal invariant was violated (e.g. the command buffer overflowed).
    Logic(String),
}

impl fmt::Display for RtfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RtfError::Io(err) => write!(f, "I/O error while scanning RTF stream: {err}"),
            RtfError::InvalidCommand(msg) => write!(f, "invalid RTF control word: {msg}"),
            RtfError::OutOfMemory(msg) => write!(f, "out of space: {msg}"),
            RtfError::Logic(msg) => write!(f, "internal logic error: {msg}"),
        }
    }
}

impl std::error::Error for RtfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RtfError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for RtfError {
    fn from(err: io::Error) -> Self {
        RtfError::Io(err)
    }
}
