//! rtf-replace - Streaming RTF rendered-text search-and-replace engine
//!
//! This crate scans an RTF document once, byte by byte, rewriting registered literal matches in
//! its rendered (displayed) text while copying every byte of surrounding control-word markup
//! through unchanged. It never parses RTF into a document object model: there is no tree, no
//! random access, and no support for editing structure — only scan, match, replace, emit.
//!
//! # Example
//!
//! ```rust,no_run
//! use rtf_replace::rtf::{ProcessorOptions, RtfProcessor};
//!
//! let input = &b"{\\rtf1\\ansi Hello, JAMES!}"[..];
//! let mut output = Vec::new();
//! let mut proc = RtfProcessor::new(input, &mut output, None::<std::io::Sink>, ProcessorOptions::default());
//! proc.add_one_replacement("JAMES", "BOOBEAR");
//! proc.run_replace()?;
//! assert!(String::from_utf8(output)?.contains("BOOBEAR"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod common;
pub mod rtf;

pub use common::{Error, Result};
pub use rtf::{ProcessorOptions, RtfProcessor};
