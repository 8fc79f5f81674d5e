//! UTF-8 decoding and encoding on top of [`FurryString`].
//!
//! Decoding is a byte-at-a-time state machine so that callers reading from a
//! stream (a UART, a file chunk) can feed bytes as they arrive.

use super::FurryString;

/// Decoder state after consuming a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utf8State {
    /// Ready for a new code point; after a completed sequence the
    /// accumulator holds the decoded value.
    Starting,
    /// One continuation byte remains.
    Decoding1,
    /// Two continuation bytes remain.
    Decoding2,
    /// Three continuation bytes remain.
    Decoding3,
    /// Malformed input. Terminal until the caller resets to `Starting`.
    Error,
}

/// Feed one byte into the decoder.
///
/// In `Starting`, an ASCII byte is decoded immediately into `unicode`. A lead
/// byte loads its payload bits and moves to the matching `DecodingN` state;
/// each continuation byte shifts six more bits in. When the last continuation
/// byte arrives the state returns to `Starting` with the full value in
/// `unicode`.
pub fn utf8_decode_step(byte: u8, state: &mut Utf8State, unicode: &mut u32) {
    let b = u32::from(byte);
    *state = match *state {
        Utf8State::Starting => match byte {
            0x00..=0x7F => {
                *unicode = b;
                Utf8State::Starting
            }
            0xC0..=0xDF => {
                *unicode = b & 0x1F;
                Utf8State::Decoding1
            }
            0xE0..=0xEF => {
                *unicode = b & 0x0F;
                Utf8State::Decoding2
            }
            0xF0..=0xF7 => {
                *unicode = b & 0x07;
                Utf8State::Decoding3
            }
            _ => Utf8State::Error,
        },
        pending @ (Utf8State::Decoding1 | Utf8State::Decoding2 | Utf8State::Decoding3) => {
            if byte & 0xC0 != 0x80 {
                Utf8State::Error
            } else {
                *unicode = (*unicode << 6) | (b & 0x3F);
                match pending {
                    Utf8State::Decoding3 => Utf8State::Decoding2,
                    Utf8State::Decoding2 => Utf8State::Decoding1,
                    _ => Utf8State::Starting,
                }
            }
        }
        Utf8State::Error => Utf8State::Error,
    };
}

/// Iterator over the code points of a byte slice.
///
/// Malformed sequences yield U+FFFD and decoding resumes at the next byte.
/// A truncated sequence at the end of input yields one U+FFFD.
pub struct Utf8Chars<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Utf8Chars<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }
}

impl Iterator for Utf8Chars<'_> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let mut state = Utf8State::Starting;
        let mut unicode = 0;
        while let Some(&byte) = self.bytes.get(self.pos) {
            let previous = state;
            utf8_decode_step(byte, &mut state, &mut unicode);
            match state {
                Utf8State::Starting => {
                    self.pos += 1;
                    return Some(char::from_u32(unicode).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
                Utf8State::Error => {
                    // A bad byte in the middle of a sequence may start the next one.
                    if previous == Utf8State::Starting {
                        self.pos += 1;
                    }
                    return Some(char::REPLACEMENT_CHARACTER);
                }
                _ => self.pos += 1,
            }
        }
        Some(char::REPLACEMENT_CHARACTER)
    }
}

impl FurryString {
    /// Number of code points. Each malformed sequence counts as one.
    pub fn utf8_length(&self) -> usize {
        self.utf8_chars().count()
    }

    /// Iterate over the decoded code points.
    pub fn utf8_chars(&self) -> Utf8Chars<'_> {
        Utf8Chars::new(self.as_bytes())
    }

    /// Append `c` encoded as UTF-8 (one to four bytes).
    pub fn utf8_push(&mut self, c: char) {
        let mut encoded = [0u8; 4];
        self.push_bytes(c.encode_utf8(&mut encoded).as_bytes());
    }
}
