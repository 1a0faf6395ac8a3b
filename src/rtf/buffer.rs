//! Buffer trio and raw/text coordination (component C2).

use std::io::{self, Write};

use crate::rtf::options::ProcessorOptions;

/// The in-flight raw RTF, rendered text, and current control word, plus the `txt → raw`
/// byte-position map.
///
/// Capacities are enforced against `Vec::len()` rather than mirrored in separate counters: the
/// original's `ri`/`ti`/`ci` indices are simply `raw.len()`/`txt.len()`/`cmd.len()` here, since
/// Rust's `Vec` already tracks length and the original only needed explicit counters because its
/// buffers were fixed C arrays.
#[derive(Debug)]
pub struct Buffers {
    raw: Vec<u8>,
    txt: Vec<u8>,
    cmd: Vec<u8>,
    txtrawmap: Vec<usize>,
    raw_capacity: usize,
    txt_capacity: usize,
    cmd_capacity: usize,
    /// Set when the previous `add_to_txt` call reserved a slot (deferred commit) whose byte
    /// has not yet arrived — the high surrogate / DBCS lead-byte case.
    deferred: bool,
}

impl Buffers {
    /// Create buffers sized per `options`.
    pub fn new(options: &ProcessorOptions) -> Self {
        Self {
            raw: Vec::with_capacity(options.raw_capacity),
            txt: Vec::with_capacity(options.txt_capacity),
            cmd: Vec::with_capacity(options.cmd_capacity),
            txtrawmap: Vec::with_capacity(options.txt_capacity),
            raw_capacity: options.raw_capacity,
            txt_capacity: options.txt_capacity,
            cmd_capacity: options.cmd_capacity,
            deferred: false,
        }
    }

    /// Current raw buffer contents.
    #[inline]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Current rendered-text buffer contents.
    #[inline]
    pub fn txt(&self) -> &[u8] {
        &self.txt
    }

    /// Current control-word buffer contents.
    #[inline]
    pub fn cmd(&self) -> &[u8] {
        &self.cmd
    }

    /// `txtrawmap[i]`: raw-buffer offset the RTF bytes producing `txt[i]` began at.
    #[inline]
    pub fn txtrawmap(&self, i: usize) -> usize {
        self.txtrawmap[i]
    }

    /// Write `raw[0..raw.len()]` to `out` and clear it.
    pub fn flush_raw<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        if !self.raw.is_empty() {
            out.write_all(&self.raw)?;
            self.raw.clear();
        }
        Ok(())
    }

    /// Append one byte to `raw`.
    ///
    /// On overflow: any in-flight text can no longer possibly match (it spans more raw bytes
    /// than the buffer can hold), so it is discarded; then `raw` is flushed to `out` — always
    /// before clearing, so no buffered bytes are silently lost — and the new byte starts a
    /// fresh raw run.
    pub fn add_to_raw<W: Write>(&mut self, c: u8, out: &mut W) -> io::Result<()> {
        if self.raw.len() + 1 >= self.raw_capacity {
            log::warn!(
                "raw buffer reached its {}-byte capacity; flushing and abandoning any in-flight match",
                self.raw_capacity
            );
            if !self.txt.is_empty() {
                self.txt.clear();
                self.txtrawmap.clear();
            }
            self.flush_raw(out)?;
        }
        self.raw.push(c);
        Ok(())
    }

    /// Append one byte to `cmd`. Overflow is an internal logic error: a well-formed control
    /// word can never exceed a reasonably sized command buffer.
    pub fn add_to_cmd(&mut self, c: u8) -> Result<(), ()> {
        if self.cmd.len() + 1 >= self.cmd_capacity {
            return Err(());
        }
        self.cmd.push(c);
        Ok(())
    }

    /// Append one byte (or, if `c` is `None`, reserve a slot for a not-yet-known byte) to the
    /// rendered-text buffer, honoring `uccountdown` and performing raw/text coordination.
    ///
    /// `uccountdown` is the current attribute frame's skip counter; it is decremented here
    /// rather than passed in as an immutable condition because the decrement itself is part of
    /// this function's contract.
    pub fn add_to_txt<W: Write, T: Write>(
        &mut self,
        c: Option<u8>,
        uccountdown: &mut usize,
        out: &mut W,
        mut text_sink: Option<&mut T>,
    ) -> io::Result<()> {
        if *uccountdown > 0 {
            *uccountdown -= 1;
            return Ok(());
        }

        if !self.deferred {
            // First text byte appended after a clean slate: the raw collected so far precedes
            // this text run and can never participate in a match, so it is safe to commit now.
            if !self.raw.is_empty() && self.txt.is_empty() {
                self.flush_raw(out)?;
            }

            if self.txt.len() + 1 >= self.txt_capacity {
                log::warn!(
                    "text buffer reached its {}-byte capacity with no match found; flushing and resetting",
                    self.txt_capacity
                );
                self.flush_raw(out)?;
                self.reset_txt_by(self.txt.len(), text_sink.as_deref_mut())?;
            }

            self.txtrawmap.push(self.raw.len());
        }

        match c {
            None => self.deferred = true,
            Some(byte) => {
                self.txt.push(byte);
                self.deferred = false;
            },
        }
        Ok(())
    }

    /// Append every byte of `s` to `txt` via [`Buffers::add_to_txt`].
    pub fn add_str_to_txt<W: Write, T: Write>(
        &mut self,
        s: &str,
        uccountdown: &mut usize,
        out: &mut W,
        mut text_sink: Option<&mut T>,
    ) -> io::Result<()> {
        for byte in s.bytes() {
            self.add_to_txt(Some(byte), uccountdown, out, text_sink.as_deref_mut())?;
        }
        Ok(())
    }

    /// Append every byte of `s` to `cmd`.
    pub fn add_str_to_cmd(&mut self, s: &str) -> Result<(), ()> {
        for byte in s.bytes() {
            self.add_to_cmd(byte)?;
        }
        Ok(())
    }

    /// Append every byte of `s` to `raw`.
    pub fn add_str_to_raw<W: Write>(&mut self, s: &[u8], out: &mut W) -> io::Result<()> {
        for &byte in s {
            self.add_to_raw(byte, out)?;
        }
        Ok(())
    }

    /// Discard `raw[0..n]`, shifting the remainder down to offset 0.
    pub fn reset_raw_by(&mut self, n: usize) {
        self.raw.drain(..n.min(self.raw.len()));
    }

    /// Write `raw[0..n]` to `out`, then discard it (a late-partial-match recovery: the bytes
    /// before a match candidate's true start can never participate in it and must be released).
    pub fn commit_raw_by<W: Write>(&mut self, n: usize, out: &mut W) -> io::Result<()> {
        let n = n.min(self.raw.len());
        out.write_all(&self.raw[..n])?;
        self.reset_raw_by(n);
        Ok(())
    }

    /// Discard `txt[0..n]` (and the matching prefix of `txtrawmap`), writing the discarded
    /// bytes to `text_sink` first if one is configured.
    pub fn reset_txt_by<T: Write>(&mut self, n: usize, text_sink: Option<&mut T>) -> io::Result<()> {
        let n = n.min(self.txt.len());
        if let Some(sink) = text_sink {
            sink.write_all(&self.txt[..n])?;
        }
        self.txt.drain(..n);
        self.txtrawmap.drain(..n);
        Ok(())
    }

    /// Discard `cmd[0..n]`.
    pub fn reset_cmd_by(&mut self, n: usize) {
        self.cmd.drain(..n.min(self.cmd.len()));
    }

    /// Clear `raw` entirely (flushed separately by the caller beforehand if needed).
    pub fn clear_raw(&mut self) {
        self.raw.clear();
    }

    /// Clear `txt` and `txtrawmap` entirely, without writing anything to a text sink.
    ///
    /// Used after a successful match: the matched text was rendered into the replacement value,
    /// not extracted, so it must never reach the sink (unlike [`Buffers::reset_txt_by`]).
    pub fn clear_txt(&mut self) {
        self.txt.clear();
        self.txtrawmap.clear();
    }

    /// Clear `cmd` entirely, preparing to read the next control word.
    pub fn clear_cmd(&mut self) {
        self.cmd.clear();
    }
}
