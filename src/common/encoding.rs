//! Code-page and character-set decoding for the RTF `\'hh` escape (component C7).
//!
//! `codepage_to_encoding` maps a Windows code-page identifier to the `encoding_rs` encoding
//! that decodes it. `charset_to_codepage` maps an RTF `\fcharsetN`/`\cchsN` value to the same
//! identifier space, so a font table entry or inline charset override can be turned into a
//! decoder. `decode_codepage_byte` is the actual byte-at-a-time translator the command
//! processor calls for every `\'hh` escape.

use encoding_rs::{DecoderResult, Encoding};

/// Map a Windows code-page identifier to its `encoding_rs` encoding.
///
/// Returns `None` if the code page is not one this crate recognizes.
#[inline]
pub fn codepage_to_encoding(codepage: u32) -> Option<&'static Encoding> {
    match codepage {
        // DOS code pages
        437 | 850 => Some(encoding_rs::IBM866), // approximation

        // Windows code pages (single-byte)
        874 => Some(encoding_rs::WINDOWS_874),
        1250 => Some(encoding_rs::WINDOWS_1250),
        1251 => Some(encoding_rs::WINDOWS_1251),
        1252 => Some(encoding_rs::WINDOWS_1252), // Western European, the common RTF "ansi" page
        1253 => Some(encoding_rs::WINDOWS_1253),
        1254 => Some(encoding_rs::WINDOWS_1254),
        1255 => Some(encoding_rs::WINDOWS_1255),
        1256 => Some(encoding_rs::WINDOWS_1256),
        1257 => Some(encoding_rs::WINDOWS_1257),
        1258 => Some(encoding_rs::WINDOWS_1258),

        // East Asian code pages (double-byte)
        932 | 1041 => Some(encoding_rs::SHIFT_JIS),
        936 | 2052 | 4100 => Some(encoding_rs::GBK),
        20936 => Some(encoding_rs::GBK), // GB2312
        54936 => Some(encoding_rs::GB18030),
        949 | 1042 => Some(encoding_rs::EUC_KR),
        950 | 1028 | 3076 | 5124 => Some(encoding_rs::BIG5),
        20932 => Some(encoding_rs::EUC_JP),

        // ISO-8859 series
        28591 => Some(encoding_rs::WINDOWS_1252),
        28592 => Some(encoding_rs::ISO_8859_2),
        28593 => Some(encoding_rs::ISO_8859_3),
        28594 => Some(encoding_rs::ISO_8859_4),
        28595 => Some(encoding_rs::ISO_8859_5),
        28596 => Some(encoding_rs::ISO_8859_6),
        28597 => Some(encoding_rs::ISO_8859_7),
        28598 => Some(encoding_rs::ISO_8859_8),
        28603 => Some(encoding_rs::ISO_8859_13),
        28605 => Some(encoding_rs::ISO_8859_15),

        // KOI8
        20866 => Some(encoding_rs::KOI8_R),
        21866 => Some(encoding_rs::KOI8_U),

        // Macintosh
        10000 => Some(encoding_rs::MACINTOSH),
        10001 => Some(encoding_rs::SHIFT_JIS),
        10004 => Some(encoding_rs::ISO_8859_6),
        10005 => Some(encoding_rs::WINDOWS_1255),
        10007 => Some(encoding_rs::KOI8_R),

        // Unicode
        1200 => Some(encoding_rs::UTF_16LE),
        1201 => Some(encoding_rs::UTF_16BE),
        65000 | 65001 => Some(encoding_rs::UTF_8),

        _ => None,
    }
}

/// Map an RTF `\fcharsetN`/`\cchsN` value to the Windows code-page identifier space used by
/// [`codepage_to_encoding`].
///
/// These values are the ones documented for the RTF `\fcharset` control word; there is no
/// single canonical source table for them (unlike Windows code-page numbers), so this mapping
/// is built directly from the RTF specification's font-charset list rather than adapted from
/// an existing table in the corpus.
#[inline]
pub fn charset_to_codepage(charset: u8) -> Option<u32> {
    match charset {
        0 => Some(1252),   // ANSI
        2 => Some(42),     // Symbol: no text mapping, handled specially by callers
        77 => Some(10000),  // Mac Roman
        78 => Some(10001),  // Mac Shift-JIS
        79 => Some(10003),  // Mac Hangul
        80 => Some(10008),  // Mac GB2312
        81 => Some(10002),  // Mac Big5
        83 => Some(10005),  // Mac Hebrew
        84 => Some(10004),  // Mac Arabic
        85 => Some(10021),  // Mac Thai
        86 => Some(10000),  // Mac Latin2 (approximation)
        87 => Some(10007),  // Mac Cyrillic
        88 => Some(10029),  // Mac Latin2
        89 => Some(10006),  // Mac Greek
        90 => Some(10081),  // Mac Turkish
        128 => Some(932),   // Shift-JIS
        129 => Some(949),   // Hangul
        130 => Some(1361),  // Johab
        134 => Some(936),   // GB2312
        136 => Some(950),   // Big5
        161 => Some(1253),  // Greek
        162 => Some(1254),  // Turkish
        163 => Some(1258),  // Vietnamese
        177 => Some(1255),  // Hebrew
        178 => Some(1256),  // Arabic
        186 => Some(1257),  // Baltic
        204 => Some(1251),  // Russian/Cyrillic
        222 => Some(874),   // Thai
        238 => Some(1250),  // Eastern European
        254 => Some(437),   // PC 437
        255 => Some(850),   // OEM
        _ => None,
    }
}

/// Outcome of decoding one `\'hh` byte under a given code page (external callable of C7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// A single BMP or astral code point was produced.
    Codepoint(u32),
    /// Several code points were produced (precomposed forms some double-byte pages expand to).
    Multi(Vec<u32>),
    /// First byte of a double-byte sequence; caller should reserve a text slot and wait.
    Partial,
    /// The byte has no mapping under this code page.
    None,
    /// The code page itself is not recognized.
    Unsupported,
}

/// Decode one byte of a `\'hh` escape under `codepage`, given an in-progress carry byte.
///
/// `carry` holds the first byte of a double-byte sequence across calls (mirrors the
/// `xtra` field of the attribute frame in the data model). On `Partial`, the caller must
/// retain `carry` until the next byte arrives; every other outcome clears it.
pub fn decode_codepage_byte(codepage: u32, byte: u8, carry: &mut Option<u8>) -> DecodeOutcome {
    let Some(encoding) = codepage_to_encoding(codepage) else {
        *carry = None;
        return DecodeOutcome::Unsupported;
    };

    let mut out = [0u8; 16];

    if let Some(lead) = carry.take() {
        let mut decoder = encoding.new_decoder_without_bom_handling();
        let (result, _read, written) =
            decoder.decode_to_utf8_without_replacement(&[lead, byte], &mut out, true);
        return match result {
            DecoderResult::Malformed(_, _) => DecodeOutcome::None,
            _ if written == 0 => DecodeOutcome::None,
            _ => codepoints_from_utf8(&out[..written]),
        };
    }

    let mut decoder = encoding.new_decoder_without_bom_handling();
    let (result, _read, written) =
        decoder.decode_to_utf8_without_replacement(&[byte], &mut out, false);

    match result {
        DecoderResult::Malformed(_, _) => DecodeOutcome::None,
        _ if written == 0 => {
            // Byte was absorbed as the lead of a double-byte sequence.
            *carry = Some(byte);
            DecodeOutcome::Partial
        },
        _ => codepoints_from_utf8(&out[..written]),
    }
}

fn codepoints_from_utf8(bytes: &[u8]) -> DecodeOutcome {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(_) => return DecodeOutcome::None,
    };
    let mut chars = text.chars().map(|c| c as u32);
    match (chars.next(), chars.next()) {
        (None, _) => DecodeOutcome::None,
        (Some(cp), None) => DecodeOutcome::Codepoint(cp),
        (Some(first), Some(second)) => {
            let mut all = vec![first, second];
            all.extend(chars);
            DecodeOutcome::Multi(all)
        },
    }
}
