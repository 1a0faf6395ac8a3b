//! Top-level streaming driver (component C10): wires the reader, buffer trio, attribute stack,
//! font table, command processor, pattern matcher, and emitter into the public scan-and-replace
//! loop.

use std::io::{Read, Write};

use crate::common::encoding::{DecodeOutcome, charset_to_codepage, decode_codepage_byte};
use crate::rtf::buffer::Buffers;
use crate::rtf::command::{self, KnownCommand, Token};
use crate::rtf::emitter;
use crate::rtf::error::{RtfError, RtfResult};
use crate::rtf::fonttable::FontTable;
use crate::rtf::frame::AttrStack;
use crate::rtf::matcher::{MatchOutcome, pattern_match};
use crate::rtf::options::ProcessorOptions;
use crate::rtf::reader::PushbackReader;
use crate::rtf::registry::ReplacementRegistry;

/// Control words whose entire enclosing group is markup this processor never wants to treat as
/// rendered text: picture data, color and style tables, and the various document-properties
/// destinations. Everything inside is copied to raw only.
const SHUNT_COMMANDS: &[&str] = &[
    "pict",
    "colortbl",
    "stylesheet",
    "title",
    "subject",
    "author",
    "manager",
    "company",
    "operator",
    "category",
    "keywords",
    "comment",
    "doccomm",
    "hlinkbase",
    "creatim",
    "revtim",
    "printim",
    "buptim",
    "userprops",
    "bin",
];

/// Event passed to a [`RtfProcessor::run_process`] callback at the start, after each main-loop
/// iteration, and at the end (even if the run ended in a latched fatal error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessEvent {
    Start,
    Step,
    End,
}

/// Streaming RTF scanner that rewrites occurrences of registered keys in rendered text while
/// passing every other byte of markup through unchanged.
///
/// `R`, `W`, and `T` are the input reader, output writer, and optional plain-text sink
/// respectively; a caller with no use for the text sink supplies `None::<std::io::Sink>`.
pub struct RtfProcessor<R, W, T> {
    reader: PushbackReader<R>,
    writer: W,
    text_sink: Option<T>,
    buffers: Buffers,
    attrs: AttrStack,
    fonttable: FontTable,
    registry: ReplacementRegistry,
    default_font: i32,
    document_codepage: Option<u32>,
    high_surrogate: Option<u32>,
    fatal_err: Option<RtfError>,
}

impl<R: Read, W: Write, T: Write> RtfProcessor<R, W, T> {
    /// Construct a processor reading `reader`, writing rewritten RTF to `writer`, and optionally
    /// mirroring every extracted rendered-text byte to `text_sink`.
    pub fn new(reader: R, writer: W, text_sink: Option<T>, options: ProcessorOptions) -> Self {
        Self {
            reader: PushbackReader::new(reader),
            writer,
            text_sink,
            buffers: Buffers::new(&options),
            attrs: AttrStack::new(),
            fonttable: FontTable::new(options.fonttbl_capacity),
            registry: ReplacementRegistry::new(),
            default_font: -1,
            document_codepage: None,
            high_surrogate: None,
            fatal_err: None,
        }
    }

    /// Register a batch of replacement pairs; see [`ReplacementRegistry::add_replacements`].
    pub fn add_replacements<K, V>(&mut self, batch: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
    {
        self.registry.add_replacements(batch);
    }

    /// Register (or update) a single replacement pair; see
    /// [`ReplacementRegistry::add_one_replacement`].
    pub fn add_one_replacement(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.registry.add_one_replacement(key, value);
    }

    /// Run to end-of-input, writing the rewritten document to the configured writer.
    pub fn run_replace(&mut self) -> crate::common::Result<()> {
        self.run_process(|_, _| {})
    }

    /// Run to end-of-input like [`Self::run_replace`], invoking `callback` after every
    /// processing event. `Step` fires once per main-loop iteration; `End` always fires, even if
    /// the run is cut short by a latched fatal error.
    pub fn run_process<F>(&mut self, mut callback: F) -> crate::common::Result<()>
    where
        F: FnMut(&mut Self, ProcessEvent),
    {
        callback(self, ProcessEvent::Start);
        self.drive(&mut callback);
        let flush_result = self.buffers.flush_raw(&mut self.writer);
        callback(self, ProcessEvent::End);

        if let Some(err) = self.fatal_err.take() {
            return Err(err.into());
        }
        flush_result.map_err(RtfError::from)?;
        Ok(())
    }

    fn drive<F>(&mut self, callback: &mut F)
    where
        F: FnMut(&mut Self, ProcessEvent),
    {
        loop {
            match self.reader.next_byte() {
                Ok(Some(b)) => {
                    if let Err(err) = self.process_byte(b) {
                        log::error!("rtf processing aborted: {err}");
                        self.fatal_err = Some(err);
                    }
                },
                Ok(None) => break,
                Err(err) => {
                    log::error!("rtf processing aborted: {err}");
                    self.fatal_err = Some(RtfError::Io(err));
                },
            }
            callback(self, ProcessEvent::Step);
            if self.fatal_err.is_some() {
                break;
            }
        }
    }

    fn process_byte(&mut self, b: u8) -> RtfResult<()> {
        match b {
            b'{' => {
                self.buffers.add_to_raw(b, &mut self.writer)?;
                self.attrs.push();
            },
            b'}' => {
                self.buffers.add_to_raw(b, &mut self.writer)?;
                self.attrs.pop();
            },
            b'\\' => self.process_command()?,
            _ => self.process_text_byte(b)?,
        }
        self.check_match()
    }

    fn process_text_byte(&mut self, b: u8) -> RtfResult<()> {
        if self.attrs.top().notxt {
            self.buffers.add_to_raw(b, &mut self.writer)?;
            return Ok(());
        }

        match b {
            b'\r' | b'\n' => {},
            b'\t' => self.emit_text_literal(0x09)?,
            0x0B => self.emit_text_literal(b' ')?,
            _ => self.emit_text_literal(b)?,
        }
        self.buffers.add_to_raw(b, &mut self.writer)?;
        Ok(())
    }

    fn process_command(&mut self) -> RtfResult<()> {
        let (token, consumed) = command::read_command(&mut self.reader)?;

        self.add_cmd_byte(b'\\')?;
        for &cb in &consumed {
            self.add_cmd_byte(cb)?;
        }

        let is_optional_marker = if self.attrs.top().nocmd {
            false
        } else {
            self.dispatch_token(&token)?
        };
        self.attrs.top_mut().blkoptional = is_optional_marker;

        let cmd_bytes = self.buffers.cmd().to_vec();
        self.buffers.add_str_to_raw(&cmd_bytes, &mut self.writer)?;
        self.buffers.clear_cmd();
        Ok(())
    }

    fn add_cmd_byte(&mut self, b: u8) -> RtfResult<()> {
        self.buffers
            .add_to_cmd(b)
            .map_err(|_| RtfError::Logic("control word overflowed the command buffer".to_string()))
    }

    /// Dispatch one already-tokenized command. Returns whether this command was exactly `\*`,
    /// so the caller can latch `blkoptional` for the next command in the same group.
    fn dispatch_token(&mut self, token: &Token) -> RtfResult<bool> {
        match token {
            Token::IgnoredNewline => {
                self.emit_text_literal(b'\n')?;
                Ok(false)
            },
            Token::HexByte(byte) => {
                self.process_hex_byte(*byte)?;
                Ok(false)
            },
            Token::Symbol(sym) => self.process_symbol(*sym),
            Token::Word(word) => {
                self.process_word(word)?;
                Ok(false)
            },
        }
    }

    fn process_symbol(&mut self, sym: u8) -> RtfResult<bool> {
        match sym {
            b'{' | b'}' | b'\\' => self.emit_text_literal(sym)?,
            b'~' => self.emit_text_scalar(0x00A0)?,
            b'_' => self.emit_text_scalar(0x2011)?,
            b'-' => self.emit_text_scalar(0x00AD)?,
            b'*' => return Ok(true),
            _ => {},
        }
        Ok(false)
    }

    fn process_word(&mut self, word: &command::ControlWord) -> RtfResult<()> {
        match command::classify(word) {
            KnownCommand::Uc(arg) => {
                self.attrs.top_mut().uc = arg.unwrap_or(0).max(0) as usize;
            },
            KnownCommand::U(arg) => {
                self.process_unicode_escape(arg.unwrap_or(0))?;
                let uc = self.attrs.top().uc;
                self.attrs.top_mut().uccountdown = uc;
            },
            KnownCommand::FontTable => {
                let frame = self.attrs.top_mut();
                frame.notxt = true;
                frame.fonttbl = true;
                frame.fonttbl_defn_idx = None;
            },
            KnownCommand::Font(arg) => self.process_font(arg.unwrap_or(0)),
            KnownCommand::FCharset(arg) => self.process_fcharset(arg.unwrap_or(0)),
            KnownCommand::Cchs(arg) => {
                let charset = arg.unwrap_or(0).clamp(0, u8::MAX as i32) as u8;
                self.attrs.top_mut().codepage = charset_to_codepage(charset);
            },
            KnownCommand::DefFont(arg) => self.default_font = arg.unwrap_or(-1),
            KnownCommand::Par => {
                self.emit_text_literal(b'\n')?;
                self.emit_text_literal(b'\n')?;
            },
            KnownCommand::Line => self.emit_text_literal(b'\n')?,
            KnownCommand::Unknown => {
                let shunt = SHUNT_COMMANDS.contains(&word.name.as_str()) || self.attrs.top().blkoptional;
                if shunt {
                    let frame = self.attrs.top_mut();
                    frame.nocmd = true;
                    frame.notxt = true;
                }
            },
        }
        Ok(())
    }

    fn process_font(&mut self, number: i32) {
        if self.attrs.top().fonttbl {
            match self.fonttable.define(number) {
                Ok(idx) => self.attrs.top_mut().fonttbl_defn_idx = Some(idx),
                Err(err) => log::warn!("{err}"),
            }
        } else if let Some(charset) = self.fonttable.charset_of(number) {
            self.attrs.top_mut().codepage = charset_to_codepage(charset);
        }
    }

    fn process_fcharset(&mut self, arg: i32) {
        let charset = arg.clamp(0, u8::MAX as i32) as u8;
        let frame = self.attrs.top();
        let (in_fonttbl, defn_idx) = (frame.fonttbl, frame.fonttbl_defn_idx);
        let Some(idx) = (if in_fonttbl { defn_idx } else { None }) else {
            return;
        };
        self.fonttable.set_charset(idx, charset);
        if self.fonttable.index_of(self.default_font) == Some(idx) {
            self.document_codepage = charset_to_codepage(charset);
        }
    }

    fn process_unicode_escape(&mut self, arg: i32) -> RtfResult<()> {
        let mut n = arg as i64;
        if n < 0 {
            n += 65536;
        }
        let n = n as u32;

        if (0xD800..=0xDBFF).contains(&n) {
            self.high_surrogate = Some(n);
            self.emit_deferred_slot()?;
        } else if (0xDC00..=0xDFFF).contains(&n) {
            if let Some(hi) = self.high_surrogate.take() {
                if let Some(cp) = combine_surrogates(hi, n) {
                    self.emit_text_scalar(cp)?;
                }
            }
        } else {
            self.emit_text_scalar(n)?;
        }
        Ok(())
    }

    fn process_hex_byte(&mut self, byte: u8) -> RtfResult<()> {
        if self.attrs.top().uccountdown > 0 {
            self.attrs.top_mut().uccountdown -= 1;
            return Ok(());
        }

        let codepage = self.attrs.top().codepage.or(self.document_codepage).unwrap_or(0);
        let mut carry = self.attrs.top().xtra;
        let outcome = decode_codepage_byte(codepage, byte, &mut carry);
        self.attrs.top_mut().xtra = carry;

        match outcome {
            DecodeOutcome::Codepoint(cp) => self.emit_text_scalar(cp)?,
            DecodeOutcome::Multi(cps) => {
                for cp in cps {
                    self.emit_text_scalar(cp)?;
                }
            },
            DecodeOutcome::Partial => self.emit_deferred_slot()?,
            DecodeOutcome::None => {
                log::debug!("code point for byte {byte:#04x} does not exist in code page {codepage}");
            },
            DecodeOutcome::Unsupported => {
                log::debug!("code page {codepage} is unsupported");
            },
        }
        Ok(())
    }

    /// Reserve a `txt` slot for a not-yet-known byte (the first half of a surrogate pair or
    /// double-byte sequence).
    fn emit_deferred_slot(&mut self) -> RtfResult<()> {
        let mut uccountdown = self.attrs.top().uccountdown;
        self.buffers
            .add_to_txt(None, &mut uccountdown, &mut self.writer, self.text_sink.as_mut())?;
        self.attrs.top_mut().uccountdown = uccountdown;
        Ok(())
    }

    fn emit_text_literal(&mut self, b: u8) -> RtfResult<()> {
        let mut uccountdown = self.attrs.top().uccountdown;
        self.buffers
            .add_to_txt(Some(b), &mut uccountdown, &mut self.writer, self.text_sink.as_mut())?;
        self.attrs.top_mut().uccountdown = uccountdown;
        Ok(())
    }

    fn emit_text_scalar(&mut self, scalar: u32) -> RtfResult<()> {
        let Some(ch) = char::from_u32(scalar) else {
            return Ok(());
        };
        let mut buf = [0u8; 4];
        let bytes = ch.encode_utf8(&mut buf).as_bytes().to_vec();
        let mut uccountdown = self.attrs.top().uccountdown;
        for b in bytes {
            self.buffers
                .add_to_txt(Some(b), &mut uccountdown, &mut self.writer, self.text_sink.as_mut())?;
        }
        self.attrs.top_mut().uccountdown = uccountdown;
        Ok(())
    }

    fn check_match(&mut self) -> RtfResult<()> {
        if self.buffers.txt().is_empty() || self.attrs.top().notxt {
            return Ok(());
        }

        match pattern_match(self.buffers.txt(), &self.registry) {
            MatchOutcome::NoMatch => {
                self.buffers.flush_raw(&mut self.writer)?;
                let txt_len = self.buffers.txt().len();
                self.buffers.reset_txt_by(txt_len, self.text_sink.as_mut())?;
            },
            MatchOutcome::Partial { offset } => {
                if offset > 0 {
                    self.discard_before_offset(offset)?;
                }
            },
            MatchOutcome::Match { key_index, offset } => {
                if offset > 0 {
                    self.discard_before_offset(offset)?;
                }
                let value = String::from_utf8_lossy(self.registry.value(key_index)).into_owned();
                emitter::emit_match(self.buffers.raw(), &value, &mut self.writer)?;
                self.buffers.clear_raw();
                self.buffers.clear_txt();
            },
        }
        Ok(())
    }

    fn discard_before_offset(&mut self, offset: usize) -> RtfResult<()> {
        let raw_cut = self.buffers.txtrawmap(offset);
        self.buffers.commit_raw_by(raw_cut, &mut self.writer)?;
        self.buffers.reset_txt_by(offset, self.text_sink.as_mut())?;
        Ok(())
    }
}

fn combine_surrogates(high: u32, low: u32) -> Option<u32> {
    char::decode_utf16([high as u16, low as u16]).next()?.ok().map(|c| c as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &[u8], pairs: &[(&str, &str)]) -> (Vec<u8>, Vec<u8>) {
        let mut out = Vec::new();
        let mut sink = Vec::new();
        {
            let mut proc = RtfProcessor::new(input, &mut out, Some(&mut sink), ProcessorOptions::default());
            proc.add_replacements(pairs.iter().map(|&(k, v)| (k, v)));
            proc.run_replace().unwrap();
        }
        (out, sink)
    }

    #[test]
    fn raw_passthrough_with_no_replacements() {
        let input = b"{\\rtf1\\ansi Hello, world!}";
        let (out, _) = run(input, &[]);
        assert_eq!(out, input);
    }

    #[test]
    fn run_process_fires_start_step_end_in_order() {
        let input = b"{\\rtf1 hi}";
        let mut out = Vec::new();
        let mut events = Vec::new();
        {
            let mut proc = RtfProcessor::new(&input[..], &mut out, None::<std::io::Sink>, ProcessorOptions::default());
            proc.run_process(|_, event| events.push(event)).unwrap();
        }
        assert_eq!(events.first(), Some(&ProcessEvent::Start));
        assert_eq!(events.last(), Some(&ProcessEvent::End));
        // One Step per byte the top-level loop itself reads; a multi-byte control word like
        // `\rtf1 ` is consumed inside a single Step, so this is less than `input.len()`.
        let steps = events.iter().filter(|&&e| e == ProcessEvent::Step).count();
        assert_eq!(steps, 5, "{{, \\rtf1 , h, i, }} each advance the top-level loop once");
    }

    #[test]
    fn run_process_end_fires_even_on_fatal_error() {
        // A backslash with nothing after it truncates mid control-sequence: a fatal IO error.
        let input = b"\\";
        let mut out = Vec::new();
        let mut saw_end = false;
        {
            let mut proc = RtfProcessor::new(&input[..], &mut out, None::<std::io::Sink>, ProcessorOptions::default());
            let result = proc.run_process(|_, event| {
                if event == ProcessEvent::End {
                    saw_end = true;
                }
            });
            assert!(result.is_err());
        }
        assert!(saw_end, "End must fire even when the run ends in a latched fatal error");
    }

    #[test]
    fn simple_ascii_match() {
        let input = b"{\\rtf1\\ansi JAMES.}";
        let (out, _) = run(input, &[("JAMES", "BOOBEAR")]);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("{\\rtf1\\ansi "));
        assert!(text.contains("BOOBEAR."));
        assert!(text.ends_with('}'));
    }

    #[test]
    fn portmanteau_late_partial_match() {
        let input = b"ATTORTLOCATION";
        let (out, _) = run(input, &[("ATTORNEY", "A"), ("TORTLOCATION", "B")]);
        assert_eq!(out, b"ATB");
    }

    #[test]
    fn starred_optional_group_passes_through_then_matches_after() {
        let input = b"{\\*\\someunknown ignored text}hello";
        let (out, _) = run(input, &[("hello", "HI")]);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "{\\*\\someunknown ignored text}HI");
    }

    #[test]
    fn match_spanning_a_group_preserves_net_brace_balance() {
        let input = b"JA{\\f2 }MES";
        let (out, _) = run(input, &[("JAMES", "X")]);
        let opens = out.iter().filter(|&&b| b == b'{').count();
        let closes = out.iter().filter(|&&b| b == b'}').count();
        assert_eq!(opens, closes);
        assert!(String::from_utf8(out).unwrap().contains('X'));
    }

    #[test]
    fn unicode_escapes_with_default_skip_byte_form_a_match() {
        // Five hiragana code units, each followed by a one-byte ASCII fallback that the default
        // `uc = 1` skip consumes. Every code point here fits in one UTF-16 unit (no surrogates).
        let input = b"\\u12371?\\u12435?\\u12395?\\u12385?\\u12399?";
        let (out, _) = run(input, &[("\u{3053}\u{3093}\u{306B}\u{3061}\u{306F}", "HI")]);
        assert_eq!(out, b"HI", "value is plain ASCII, so no {\\uc0 ...} wrapping is emitted");
    }

    #[test]
    fn shift_jis_fonttable_codepage_decodes_apostrophe_escape() {
        let input = b"{\\fonttbl{\\f0\\fcharset128 MS Mincho;}}{\\f0 \\'94\\'45}";
        let (out, _) = run(input, &[("\u{7766}", "MX")]);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("MX"));
    }

    #[test]
    fn unmatched_text_is_emitted_to_the_sink() {
        let input = b"plain text only";
        let (_, sink) = run(input, &[("nomatch", "x")]);
        assert_eq!(sink, b"plain text only");
    }

    #[test]
    fn matched_text_never_reaches_the_sink() {
        let input = b"JAMES";
        let (_, sink) = run(input, &[("JAMES", "BOOBEAR")]);
        assert!(sink.is_empty());
    }

    #[test]
    fn shunt_destination_is_not_scanned_for_matches() {
        let input = b"{\\colortbl;\\red255\\green0\\blue0;}JAMES";
        let (out, _) = run(input, &[("red", "x")]);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\\red255"), "shunted group must pass through unmodified");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        /// A small well-formed RTF fragment: balanced `{`/`}` groups wrapping runs of plain
        /// ASCII words. No control words, so every byte outside a matched span is plain
        /// rendered text and the brace nesting is always closed.
        fn rtf_fragment_strategy() -> impl Strategy<Value = String> {
            let word = "[A-Za-z]{1,8}";
            let leaf = word.prop_map(|w| format!("{w} "));
            leaf.prop_recursive(3, 32, 4, |inner| {
                prop::collection::vec(inner, 0..4).prop_map(|parts| format!("{{{}}}", parts.concat()))
            })
        }

        fn replacement_pairs_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
            prop::collection::vec(("[A-Z]{2,6}", "[a-z]{1,6}"), 0..4)
        }

        fn process(doc: &[u8], pairs: &[(String, String)]) -> Vec<u8> {
            let mut out = Vec::new();
            {
                let mut proc = RtfProcessor::new(doc, &mut out, None::<std::io::Sink>, ProcessorOptions::default());
                proc.add_replacements(pairs.iter().map(|(k, v)| (k.clone(), v.clone())));
                proc.run_replace().unwrap();
            }
            out
        }

        fn brace_count(bytes: &[u8]) -> (i64, i64) {
            let opens = bytes.iter().filter(|&&b| b == b'{').count() as i64;
            let closes = bytes.iter().filter(|&&b| b == b'}').count() as i64;
            (opens, closes)
        }

        proptest! {
            /// Brace balance preservation: the net count of `{` minus `}` is unchanged by a run
            /// over a fragment with no backslash escapes (so every brace is structural).
            #[test]
            fn brace_balance_is_preserved(doc in rtf_fragment_strategy(), pairs in replacement_pairs_strategy()) {
                let out = process(doc.as_bytes(), &pairs);
                let (in_open, in_close) = brace_count(doc.as_bytes());
                let (out_open, out_close) = brace_count(&out);
                prop_assert_eq!(in_open - in_close, out_open - out_close);
            }

            /// Raw passthrough: with no registered replacements, the output is byte-identical to
            /// the input.
            #[test]
            fn no_replacements_is_byte_identical(doc in rtf_fragment_strategy()) {
                let out = process(doc.as_bytes(), &[]);
                prop_assert_eq!(out, doc.into_bytes());
            }

            /// Idempotence over disjoint replacements: running the same replacement set twice
            /// produces the same output as running it once, provided no value contains any key
            /// as a substring (the keys are uppercase, the values lowercase, so they never do).
            #[test]
            fn idempotent_over_disjoint_replacements(doc in rtf_fragment_strategy(), pairs in replacement_pairs_strategy()) {
                let once = process(doc.as_bytes(), &pairs);
                let twice = process(&once, &pairs);
                prop_assert_eq!(once, twice);
            }
        }
    }
}
