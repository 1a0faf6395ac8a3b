//! RTF (Rich Text Format) streaming scan-and-replace engine.
//!
//! This module provides a single-pass RTF scanner that rewrites occurrences of registered keys
//! in rendered (displayed) text while copying every byte of surrounding markup through
//! unchanged. It never builds a document object model: input is read once, byte by byte, and
//! output is written as the scan proceeds.
//!
//! # Architecture
//!
//! - **`reader`**: one-byte pushback wrapper the tokenizer reads from
//! - **`command`**: control-word tokenizer and classification
//! - **`frame`**: per-group attribute stack (`{`/`}` scoping)
//! - **`fonttable`**: font number → character set tracking
//! - **`buffer`**: the raw/text/command buffer trio and their coordination rules
//! - **`matcher`**: multi-pattern literal matching over the rendered-text buffer
//! - **`emitter`**: brace-balanced output of raw passthrough and replacement values
//! - **`registry`**: the ordered key/value replacement list
//! - **`processor`**: the driver that wires all of the above into the public API
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
//! # Ok::<(), rtf_replace::common::Error>(())
//! ```

mod buffer;
mod command;
mod emitter;
mod error;
mod fonttable;
mod frame;
mod matcher;
mod options;
mod processor;
mod reader;
mod registry;

pub use command::{ControlWord, KnownCommand, Token};
pub use emitter::{brace_balance, emit_match, emit_raw};
pub use error::{RtfError, RtfResult};
pub use fonttable::FontTable;
pub use frame::{AttrFrame, AttrStack};
pub use matcher::{MatchOutcome, pattern_match};
pub use options::ProcessorOptions;
pub use processor::{ProcessEvent, RtfProcessor};
pub use reader::PushbackReader;
pub use registry::ReplacementRegistry;
