//! Font table (component C6): font number → character set.

use crate::rtf::error::RtfError;

/// Dense, bounded font → character-set table.
///
/// Mirrors the original's parallel-array layout (`fonttbl_f`/`fonttbl_charset`) rather than a
/// `HashMap`: font tables are small (a handful of entries in realistic documents) and lookups
/// are by linear scan, which is both what the source does and faster than hashing for tables
/// this size.
#[derive(Debug, Clone)]
pub struct FontTable {
    numbers: Vec<i32>,
    charsets: Vec<u8>,
    capacity: usize,
}

impl FontTable {
    /// Create an empty table bounded to `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            numbers: Vec::new(),
            charsets: Vec::new(),
            capacity,
        }
    }

    /// Find the table index for font `number`, if defined.
    #[inline]
    pub fn index_of(&self, number: i32) -> Option<usize> {
        self.numbers.iter().position(|&n| n == number)
    }

    /// Character set recorded for font `number`, if any.
    #[inline]
    pub fn charset_of(&self, number: i32) -> Option<u8> {
        self.index_of(number).map(|idx| self.charsets[idx])
    }

    /// Begin (or resume) defining font `number`, returning its slot index.
    ///
    /// If the font is already known its existing slot is reused (a redefinition, e.g. a
    /// duplicate `\fN` inside the same `\fonttbl` group). Otherwise a new slot is allocated
    /// with charset `0` (ANSI) until a `\fcharsetN` arrives. Fails with
    /// [`RtfError::OutOfMemory`] once `capacity` entries are defined.
    pub fn define(&mut self, number: i32) -> Result<usize, RtfError> {
        if let Some(idx) = self.index_of(number) {
            return Ok(idx);
        }
        if self.numbers.len() >= self.capacity {
            return Err(RtfError::OutOfMemory(format!(
                "font table full ({} entries), dropping definition of f{number}",
                self.capacity
            )));
        }
        self.numbers.push(number);
        self.charsets.push(0);
        Ok(self.numbers.len() - 1)
    }

    /// Set the character set for a previously defined slot.
    pub fn set_charset(&mut self, idx: usize, charset: u8) {
        if let Some(slot) = self.charsets.get_mut(idx) {
            *slot = charset;
        }
    }

    /// Number of fonts currently defined.
    #[inline]
    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    /// Whether the table has any entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }
}
