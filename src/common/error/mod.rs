//! Crate-level error type for the RTF processor's public API.

pub mod types;

pub use types::{Error, Result};
