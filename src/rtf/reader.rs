//! One-byte pushback wrapper around an arbitrary [`Read`] (component C1 support).
//!
//! Control-word parsing routinely reads one byte past the end of a token (the delimiter space,
//! or the first character of whatever follows) and must be able to hand it back for the main
//! loop to see again.

use std::io::{self, Read};

pub struct PushbackReader<R> {
    inner: R,
    pushed: Option<u8>,
}

impl<R: Read> PushbackReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, pushed: None }
    }

    /// Read the next byte, or `Ok(None)` at end of input.
    pub fn next_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.pushed.take() {
            return Ok(Some(b));
        }
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }

    /// Hand a byte back; it will be the next byte returned by [`Self::next_byte`].
    ///
    /// Only one byte of lookahead is ever needed by this parser; a second push before the first
    /// is consumed would indicate a logic error in the caller.
    pub fn pushback(&mut self, byte: u8) {
        debug_assert!(self.pushed.is_none(), "pushback buffer already holds a byte");
        self.pushed = Some(byte);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_bytes_in_order() {
        let mut reader = PushbackReader::new(&b"ab"[..]);
        assert_eq!(reader.next_byte().unwrap(), Some(b'a'));
        assert_eq!(reader.next_byte().unwrap(), Some(b'b'));
        assert_eq!(reader.next_byte().unwrap(), None);
    }

    #[test]
    fn pushback_replays_byte() {
        let mut reader = PushbackReader::new(&b"a"[..]);
        assert_eq!(reader.next_byte().unwrap(), Some(b'a'));
        reader.pushback(b'a');
        assert_eq!(reader.next_byte().unwrap(), Some(b'a'));
        assert_eq!(reader.next_byte().unwrap(), None);
    }
}
