//! Control-word tokenizer and classification (components C4/C5).

use std::io::{self, Read};

use crate::rtf::error::{RtfError, RtfResult};
use crate::rtf::reader::PushbackReader;

/// A parsed control word: its name and optional signed decimal argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlWord {
    pub name: String,
    pub arg: Option<i32>,
}

/// One lexical unit following a `\` that has already been consumed by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An alphabetic control word, e.g. `\par`, `\uc1`, `\f-1`.
    Word(ControlWord),
    /// A single non-alphabetic escape, e.g. `\~`, `\-`, `\{`, `\}`, `\\`, `\*`.
    Symbol(u8),
    /// A `\'hh` hexadecimal byte escape.
    HexByte(u8),
    /// A literal CR or LF directly after the backslash: whitespace some writers insert for
    /// human readability, carrying no semantic weight.
    IgnoredNewline,
}

/// Read one control sequence (the part after an already-consumed leading `\`).
///
/// Returns the token plus every byte read from `reader` while parsing it, in order, so the
/// caller can mirror them into the raw buffer without this function depending on buffer state.
pub fn read_command<R: Read>(reader: &mut PushbackReader<R>) -> RtfResult<(Token, Vec<u8>)> {
    let mut consumed = Vec::new();
    let first = read_required_byte(reader, &mut consumed)?;

    if first == b'\r' || first == b'\n' {
        // A writer emitting CRLF line breaks inside a control sequence produces this pair as
        // one unit; absorb a following LF into the same token rather than surfacing it as a
        // second, spurious ignored-newline command.
        if first == b'\r' {
            match reader.next_byte()? {
                Some(b'\n') => consumed.push(b'\n'),
                Some(b) => reader.pushback(b),
                None => {},
            }
        }
        return Ok((Token::IgnoredNewline, consumed));
    }

    if first == b'\'' {
        let hi = read_required_byte(reader, &mut consumed)?;
        let lo = read_required_byte(reader, &mut consumed)?;
        let value = (hex_digit(hi)? << 4) | hex_digit(lo)?;
        return Ok((Token::HexByte(value), consumed));
    }

    // `{`, `}`, `\`, `~`, `_`, `-`, `*` are the only punctuation lead bytes this format
    // recognizes as single-character commands; anything else unescaped after a `\` that
    // isn't the start of a keyword is malformed input, not a silently-accepted symbol.
    const RECOGNIZED_SYMBOLS: &[u8] = b"{}\\~_*-";
    if RECOGNIZED_SYMBOLS.contains(&first) {
        return Ok((Token::Symbol(first), consumed));
    }

    if !first.is_ascii_alphanumeric() {
        return Err(RtfError::InvalidCommand(format!(
            "'\\{}' is not a recognized control sequence",
            first as char
        )));
    }

    if !first.is_ascii_alphabetic() {
        // Digit-led: not a keyword this processor recognizes, but well-formed enough that
        // rejecting it outright would be overreach; treated as an unrecognized symbol.
        return Ok((Token::Symbol(first), consumed));
    }

    let mut name = String::new();
    name.push(first as char);
    loop {
        match reader.next_byte()? {
            Some(b) if b.is_ascii_alphabetic() => {
                consumed.push(b);
                name.push(b as char);
            },
            Some(b) => {
                reader.pushback(b);
                break;
            },
            None => break,
        }
    }

    let mut digits = String::new();
    let mut negative = false;
    match reader.next_byte()? {
        Some(b'-') => match reader.next_byte()? {
            Some(d) if d.is_ascii_digit() => {
                consumed.push(b'-');
                consumed.push(d);
                negative = true;
                digits.push(d as char);
            },
            Some(d) => {
                reader.pushback(d);
                reader.pushback(b'-');
            },
            None => reader.pushback(b'-'),
        },
        Some(d) if d.is_ascii_digit() => {
            consumed.push(d);
            digits.push(d as char);
        },
        Some(b) => reader.pushback(b),
        None => {},
    }
    if !digits.is_empty() {
        loop {
            match reader.next_byte()? {
                Some(d) if d.is_ascii_digit() => {
                    consumed.push(d);
                    digits.push(d as char);
                },
                Some(b) => {
                    reader.pushback(b);
                    break;
                },
                None => break,
            }
        }
    }
    let arg = if digits.is_empty() {
        None
    } else {
        digits.parse::<i32>().ok().map(|v| if negative { -v } else { v })
    };

    // A single trailing space is the conventional delimiter and is swallowed; anything else
    // belongs to whatever comes next and is pushed back.
    match reader.next_byte()? {
        Some(b' ') => consumed.push(b' '),
        Some(b) => reader.pushback(b),
        None => {},
    }

    Ok((Token::Word(ControlWord { name, arg }), consumed))
}

fn read_required_byte<R: Read>(reader: &mut PushbackReader<R>, consumed: &mut Vec<u8>) -> RtfResult<u8> {
    match reader.next_byte()? {
        Some(b) => {
            consumed.push(b);
            Ok(b)
        },
        None => Err(RtfError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "control sequence truncated"))),
    }
}

fn hex_digit(b: u8) -> RtfResult<u8> {
    (b as char)
        .to_digit(16)
        .map(|d| d as u8)
        .ok_or_else(|| RtfError::InvalidCommand(format!("invalid hex digit '{}' in \\'xx escape", b as char)))
}

/// Control words this processor gives special meaning to; everything else is [`KnownCommand::Unknown`]
/// and is either passed through or shunted depending on the enclosing frame's `blkoptional` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownCommand {
    /// `\ucN`: set the number of rendered-text bytes following each `\uN` to skip.
    Uc(Option<i32>),
    /// `\uN`: a Unicode scalar, to be combined with surrogate-pair handling if needed.
    U(Option<i32>),
    /// `\fonttbl`: enter the font table destination group.
    FontTable,
    /// `\fN`: select (outside `\fonttbl`) or begin defining (inside it) font `N`.
    Font(Option<i32>),
    /// `\fcharsetN`: set the character set of the font currently being defined.
    FCharset(Option<i32>),
    /// `\cchsN`: alternate spelling of `\fcharsetN` emitted by some writers.
    Cchs(Option<i32>),
    /// `\deffN`: set the document's default font number.
    DefFont(Option<i32>),
    /// `\par`: paragraph break.
    Par,
    /// `\line`: hard line break.
    Line,
    /// Anything not recognized above.
    Unknown,
}

/// Classify a parsed control word by name, carrying its argument along.
pub fn classify(word: &ControlWord) -> KnownCommand {
    match word.name.as_str() {
        "uc" => KnownCommand::Uc(word.arg),
        "u" => KnownCommand::U(word.arg),
        "fonttbl" => KnownCommand::FontTable,
        "f" => KnownCommand::Font(word.arg),
        "fcharset" => KnownCommand::FCharset(word.arg),
        "cchs" => KnownCommand::Cchs(word.arg),
        "deff" => KnownCommand::DefFont(word.arg),
        "par" => KnownCommand::Par,
        "line" => KnownCommand::Line,
        _ => KnownCommand::Unknown,
    }
}
