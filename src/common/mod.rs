//! Common types shared by the RTF processor: the crate-level error type and
//! code-page/charset decoding used by the `\'hh` escape handler.

pub mod encoding;
pub mod error;

pub use encoding::charset_to_codepage;
pub use error::{Error, Result};
