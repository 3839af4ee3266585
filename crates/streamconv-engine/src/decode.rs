//! # UTF-8 unit decoding
//!
//! Splits a block buffer into [`Unit`]s: complete code points, or spans of
//! invalid bytes that must be passed through untouched.
//!
//! Decoding is lazy and stops at the first incomplete-but-valid prefix at the
//! end of the buffer. Whatever is left in [`Units::remainder`] at that point
//! is carried into the next block, so a code point split across two reads is
//! decoded whole once the rest of its bytes arrive:
//!
//! ```
//! use streamconv_engine::decode::{Unit, Units};
//!
//! // "é" is 0xC3 0xA9; the read boundary fell between the two bytes
//! let mut units = Units::new(b"ab\xC3");
//! assert_eq!(units.next(), Some(Unit::Char { ch: 'a', len: 1 }));
//! assert_eq!(units.next(), Some(Unit::Char { ch: 'b', len: 1 }));
//! assert_eq!(units.next(), None);
//! assert_eq!(units.remainder(), b"\xC3");
//! ```

/// Longest UTF-8 encoding of a single code point.
pub const MAX_UTF8_WIDTH: usize = 4;

/// One decoded unit taken from the head of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit<'a> {
    /// A complete code point and the number of bytes it occupied in the input.
    Char { ch: char, len: usize },
    /// A malformed byte span. Written out exactly as read.
    Raw(&'a [u8]),
}

impl Unit<'_> {
    /// Number of input bytes this unit consumed.
    pub fn encoded_len(&self) -> usize {
        match self {
            Unit::Char { len, .. } => *len,
            Unit::Raw(bytes) => bytes.len(),
        }
    }
}

/// Decodes the unit at the head of `buf`.
///
/// Returns `None` when `buf` is empty or holds only the start of a code point
/// whose remaining bytes have not been read yet.
pub fn decode_head(buf: &[u8]) -> Option<Unit<'_>> {
    if buf.is_empty() {
        return None;
    }

    let window = &buf[..buf.len().min(MAX_UTF8_WIDTH)];
    let valid = match std::str::from_utf8(window) {
        Ok(s) => s,
        Err(e) if e.valid_up_to() > 0 => std::str::from_utf8(&window[..e.valid_up_to()]).ok()?,
        // error_len() is None only when the window ends inside a sequence
        // that could still complete
        Err(e) => return e.error_len().map(|len| Unit::Raw(&window[..len])),
    };

    valid.chars().next().map(|ch| Unit::Char {
        ch,
        len: ch.len_utf8(),
    })
}

/// Lazy, single-pass sequence of units over one block buffer.
#[derive(Debug, Clone)]
pub struct Units<'a> {
    rest: &'a [u8],
}

impl<'a> Units<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { rest: buf }
    }

    /// Decodes the next unit without consuming it.
    pub fn peek(&self) -> Option<Unit<'a>> {
        decode_head(self.rest)
    }

    /// Bytes not yet consumed: either rejected units or an incomplete tail.
    pub fn remainder(&self) -> &'a [u8] {
        self.rest
    }
}

impl<'a> Iterator for Units<'a> {
    type Item = Unit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let unit = self.peek()?;
        self.rest = &self.rest[unit.encoded_len()..];
        Some(unit)
    }
}
