//! Crate-wide error type.

use thiserror::Error;

use crate::rtf::RtfError;

/// Main error type for this crate's public API.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error at the stream-construction boundary, outside the processor's own latch.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The processor latched a fatal error while scanning.
    #[error("RTF processing error: {0}")]
    Rtf(#[from] RtfError),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

/// Result type for this crate's public API.
pub type Result<T> = std::result::Result<T, Error>;
