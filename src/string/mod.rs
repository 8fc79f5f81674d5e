//! Growable, binary-safe string.
//!
//! [`FurryString`] owns a heap buffer that is always NUL-terminated at its
//! logical length, so [`FurryString::as_cstr`] can be handed to C-string
//! consumers at any time. The length is authoritative: embedded NUL bytes are
//! allowed and every operation works on bytes, not characters. UTF-8 aware
//! operations live in [`utf8`].
//!
//! A `FurryString` has exactly one owner and no internal locking; share it
//! between threads only behind external mutual exclusion.

pub mod format;
pub mod search;
pub mod utf8;

use crate::error::{Error, Result};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{Hash, Hasher};
use std::ffi::CStr;

pub use format::Arg;
pub use utf8::{utf8_decode_step, Utf8Chars, Utf8State};

/// Bytes removed by [`FurryString::trim_whitespace`].
pub const DEFAULT_TRIM_CHARSET: &[u8] = b" \n\r\t";

const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Length of a C string stored in `bytes`: up to the first NUL, or all of it.
fn cstr_len(bytes: &[u8]) -> usize {
    bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len())
}

/// Owned, growable, NUL-terminated byte string.
#[derive(Clone, PartialEq, Eq)]
pub struct FurryString {
    /// Content followed by exactly one terminating NUL; never empty.
    buf: Vec<u8>,
}

impl FurryString {
    /// Create an empty string.
    pub fn new() -> Self {
        Self::with_capacity(1)
    }

    /// Create an empty string able to hold `capacity - 1` bytes plus the
    /// terminator without reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buf = Vec::with_capacity(capacity.max(1));
        buf.push(0);
        Self { buf }
    }

    /// Copy a C string: everything up to the first NUL in `bytes`, or the
    /// whole slice if it contains none.
    pub fn from_cstr(bytes: impl AsRef<[u8]>) -> Self {
        let bytes = bytes.as_ref();
        Self::from_bytes(&bytes[..cstr_len(bytes)])
    }

    /// Copy arbitrary bytes, embedded NULs included.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut s = Self::with_capacity(bytes.len() + 1);
        s.push_bytes(bytes);
        s
    }

    /// Take over the buffer of `source`, leaving `source` empty.
    ///
    /// No bytes are copied. `source` stays usable.
    pub fn take_from(source: &mut FurryString) -> Self {
        core::mem::take(source)
    }

    /// Byte length, not counting the terminator.
    pub fn len(&self) -> usize {
        self.buf.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocated size of the buffer, terminator slot included.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Make the allocation exactly large enough for `min_capacity` bytes
    /// (terminator included), but never smaller than the current content.
    ///
    /// Growing is fallible here; every other growth path aborts on
    /// allocation failure.
    pub fn reserve(&mut self, min_capacity: usize) -> Result<()> {
        let target = min_capacity.max(self.buf.len());
        if target > self.buf.capacity() {
            self.buf
                .try_reserve_exact(target - self.buf.len())
                .map_err(|_| Error::OutOfMemory)?;
        } else {
            self.buf.shrink_to(target);
        }
        Ok(())
    }

    /// Empty the string, keeping its allocation.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.buf.push(0);
    }

    /// Exchange the buffers of two strings without copying.
    pub fn swap(&mut self, other: &mut FurryString) {
        core::mem::swap(&mut self.buf, &mut other.buf);
    }

    /// 32-bit FNV-1a hash of the content.
    ///
    /// Stable across calls and runs; equal content always hashes equal.
    /// This is not the firmware's string hash: `"abracadabra"` gives
    /// `0xd6f44513` here, so values must not be compared with checksums
    /// the firmware produced.
    pub fn hash(&self) -> u32 {
        self.as_bytes().iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
            (hash ^ u32::from(b)).wrapping_mul(FNV_PRIME)
        })
    }

    /// Byte at `index`.
    pub fn get_char(&self, index: usize) -> Result<u8> {
        self.as_bytes().get(index).copied().ok_or(Error::OutOfBounds)
    }

    /// Content without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len()]
    }

    /// Content followed by the terminating NUL.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.buf
    }

    /// C-string view, valid until the next mutation.
    ///
    /// A C consumer stops at the first NUL, so content after an embedded NUL
    /// is not visible through this view.
    pub fn as_cstr(&self) -> &CStr {
        // The buffer always ends with a NUL, so this cannot fail.
        CStr::from_bytes_until_nul(&self.buf).unwrap_or_default()
    }

    /// Content as `&str`, if it is valid UTF-8.
    pub fn to_str(&self) -> core::result::Result<&str, core::str::Utf8Error> {
        core::str::from_utf8(self.as_bytes())
    }

    /// Replace the content with a copy of `source`.
    pub fn set(&mut self, source: &FurryString) {
        self.set_bytes(source.as_bytes());
    }

    /// Replace the content with the C string in `bytes`.
    pub fn set_from_cstr(&mut self, bytes: impl AsRef<[u8]>) {
        let bytes = bytes.as_ref();
        self.set_bytes(&bytes[..cstr_len(bytes)]);
    }

    /// Replace the content with at most `n` bytes of the C string in `bytes`.
    pub fn set_from_cstr_n(&mut self, bytes: impl AsRef<[u8]>, n: usize) {
        let bytes = bytes.as_ref();
        let len = cstr_len(bytes).min(n);
        self.set_bytes(&bytes[..len]);
    }

    /// Replace the content with arbitrary bytes.
    pub fn set_bytes(&mut self, bytes: &[u8]) {
        self.buf.clear();
        self.buf.reserve(bytes.len() + 1);
        self.buf.extend_from_slice(bytes);
        self.buf.push(0);
    }

    /// Overwrite the byte at `index`.
    pub fn set_char(&mut self, index: usize, c: u8) -> Result<()> {
        if index >= self.len() {
            return Err(Error::OutOfBounds);
        }
        self.buf[index] = c;
        Ok(())
    }

    /// Replace the content with `length` bytes of `source` starting at
    /// `offset`. Both are clamped to what `source` actually holds.
    pub fn set_substring(&mut self, source: &FurryString, offset: usize, length: usize) {
        let bytes = source.as_bytes();
        let start = offset.min(bytes.len());
        let end = start + length.min(bytes.len() - start);
        self.set_bytes(&bytes[start..end]);
    }

    /// Append one byte.
    pub fn push_back(&mut self, c: u8) {
        let last = self.buf.len() - 1;
        self.buf[last] = c;
        self.buf.push(0);
    }

    /// Append raw bytes, embedded NULs included.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.pop();
        self.buf.extend_from_slice(bytes);
        self.buf.push(0);
    }

    /// Append the content of `other`.
    pub fn concat(&mut self, other: &FurryString) {
        self.push_bytes(other.as_bytes());
    }

    /// Append the C string in `bytes`.
    pub fn concat_cstr(&mut self, bytes: impl AsRef<[u8]>) {
        let bytes = bytes.as_ref();
        self.push_bytes(&bytes[..cstr_len(bytes)]);
    }

    /// Keep the first `n` bytes.
    pub fn left(&mut self, n: usize) {
        if n < self.len() {
            self.buf.truncate(n);
            self.buf.push(0);
        }
    }

    /// Keep the last `n` bytes.
    pub fn right(&mut self, n: usize) {
        let len = self.len();
        if n < len {
            self.buf.drain(..len - n);
        }
    }

    /// Keep the `size` bytes starting at `index`, clamped to the content.
    pub fn mid(&mut self, index: usize, size: usize) {
        let len = self.len();
        let start = index.min(len);
        let end = start + size.min(len - start);
        self.buf.truncate(end);
        self.buf.drain(..start);
        self.buf.push(0);
    }

    /// Strip leading and trailing bytes that appear in `charset`.
    pub fn trim(&mut self, charset: &[u8]) {
        let bytes = self.as_bytes();
        let start = bytes
            .iter()
            .position(|b| !charset.contains(b))
            .unwrap_or(bytes.len());
        let end = bytes
            .iter()
            .rposition(|b| !charset.contains(b))
            .map_or(start, |i| i + 1);
        self.mid(start, end - start);
    }

    /// [`trim`](Self::trim) with [`DEFAULT_TRIM_CHARSET`].
    pub fn trim_whitespace(&mut self) {
        self.trim(DEFAULT_TRIM_CHARSET);
    }

    pub(crate) fn replace_range_bytes(&mut self, start: usize, end: usize, with: &[u8]) {
        self.buf.splice(start..end, with.iter().copied());
    }
}

impl Default for FurryString {
    fn default() -> Self {
        Self::new()
    }
}

impl Hash for FurryString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl PartialOrd for FurryString {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FurryString {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl AsRef<[u8]> for FurryString {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl Borrow<[u8]> for FurryString {
    fn borrow(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<&str> for FurryString {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }
}

impl From<&[u8]> for FurryString {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<String> for FurryString {
    fn from(s: String) -> Self {
        let mut buf = s.into_bytes();
        buf.push(0);
        Self { buf }
    }
}

impl fmt::Display for FurryString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&String::from_utf8_lossy(self.as_bytes()), f)
    }
}

impl fmt::Debug for FurryString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FurryString")
            .field(&String::from_utf8_lossy(self.as_bytes()))
            .finish()
    }
}

impl fmt::Write for FurryString {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_bytes(s.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    fn assert_terminated(s: &FurryString) {
        assert_eq!(s.as_bytes_with_nul().last(), Some(&0));
        assert_eq!(s.as_bytes_with_nul().len(), s.len() + 1);
        assert!(s.capacity() >= s.len() + 1);
    }

    #[test]
    fn test_new_is_empty() {
        let s = FurryString::new();
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
        assert!(s.capacity() >= 1);
        assert_eq!(s.as_cstr().to_bytes(), b"");
        assert_terminated(&s);
    }

    #[test]
    fn test_from_cstr_stops_at_nul() {
        let s = FurryString::from_cstr(b"abc\0def");
        assert_eq!(s.as_bytes(), b"abc");
        let s = FurryString::from_cstr("plain");
        assert_eq!(s.as_bytes(), b"plain");
        assert_eq!(s.as_cstr().to_bytes(), b"plain");
    }

    #[test]
    fn test_binary_content_is_kept() {
        let s = FurryString::from_bytes(b"a\0b");
        assert_eq!(s.len(), 3);
        assert_eq!(s.get_char(1), Ok(0));
        assert_eq!(s.as_cstr().to_bytes(), b"a");
        assert_terminated(&s);
    }

    #[test]
    fn test_copy_is_independent() {
        let original = FurryString::from("data");
        let mut copy = original.clone();
        copy.push_back(b'!');
        assert_eq!(original.as_bytes(), b"data");
        assert_eq!(copy.as_bytes(), b"data!");
    }

    #[test]
    fn test_take_from_empties_source() {
        let mut src = FurryString::from("moved content");
        let dst = FurryString::take_from(&mut src);
        assert_eq!(dst.as_bytes(), b"moved content");
        assert!(src.is_empty());
        assert_terminated(&src);
        src.concat_cstr("reuse");
        assert_eq!(src.as_bytes(), b"reuse");
    }

    #[test]
    fn test_reserve_and_reset() {
        let mut s = FurryString::from("hello");
        s.reserve(100).unwrap();
        assert!(s.capacity() >= 100);
        assert_eq!(s.as_bytes(), b"hello");

        s.reserve(2).unwrap();
        assert!(s.capacity() >= s.len() + 1);
        assert_eq!(s.as_bytes(), b"hello");

        let capacity = s.capacity();
        s.reset();
        assert!(s.is_empty());
        assert_eq!(s.capacity(), capacity);
        assert_terminated(&s);
    }

    #[test]
    fn test_swap() {
        let mut a = FurryString::from("first");
        let mut b = FurryString::from("second");
        a.swap(&mut b);
        assert_eq!(a.as_bytes(), b"second");
        assert_eq!(b.as_bytes(), b"first");
    }

    #[test]
    fn test_hash_is_stable_and_content_based() {
        let a = FurryString::from("abracadabra");
        let b = FurryString::from_cstr(b"abracadabra\0ignored");
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.hash(), 0xd6f4_4513);
        assert_ne!(a.hash(), FurryString::from("abracadabrA").hash());
        assert_eq!(FurryString::new().hash(), FNV_OFFSET_BASIS);
    }

    #[test]
    fn test_char_access() {
        let mut s = FurryString::from("abc");
        assert_eq!(s.get_char(0), Ok(b'a'));
        assert_eq!(s.get_char(3), Err(Error::OutOfBounds));
        s.set_char(1, b'X').unwrap();
        assert_eq!(s.as_bytes(), b"aXc");
        assert_eq!(s.set_char(3, b'!'), Err(Error::OutOfBounds));
    }

    #[test]
    fn test_setters() {
        let mut s = FurryString::from("old");
        s.set(&FurryString::from("new value"));
        assert_eq!(s.as_bytes(), b"new value");
        s.set_from_cstr(b"cstr\0tail");
        assert_eq!(s.as_bytes(), b"cstr");
        s.set_from_cstr_n("truncated", 5);
        assert_eq!(s.as_bytes(), b"trunc");
        s.set_from_cstr_n("ab", 10);
        assert_eq!(s.as_bytes(), b"ab");
        assert_terminated(&s);
    }

    #[test]
    fn test_set_substring_clamps() {
        let source = FurryString::from("0123456789");
        let mut s = FurryString::new();
        s.set_substring(&source, 2, 3);
        assert_eq!(s.as_bytes(), b"234");
        s.set_substring(&source, 8, 100);
        assert_eq!(s.as_bytes(), b"89");
        s.set_substring(&source, 20, 5);
        assert!(s.is_empty());
    }

    #[test]
    fn test_push_back_growth() {
        let mut s = FurryString::new();
        for i in 0..1000u32 {
            s.push_back(b'a' + (i % 26) as u8);
        }
        assert_eq!(s.len(), 1000);
        for (i, &b) in s.as_bytes().iter().enumerate() {
            assert_eq!(b, b'a' + (i % 26) as u8);
        }
        assert_terminated(&s);
    }

    #[test]
    fn test_concat() {
        let mut s = FurryString::from("con");
        s.concat(&FurryString::from_bytes(b"c\0at"));
        assert_eq!(s.as_bytes(), b"conc\0at");
        s.concat_cstr(b"!\0?");
        assert_eq!(s.as_bytes(), b"conc\0at!");
    }

    #[test]
    fn test_left_right_mid() {
        let mut s = FurryString::from("0123456789");
        s.left(20);
        assert_eq!(s.as_bytes(), b"0123456789");
        s.left(8);
        assert_eq!(s.as_bytes(), b"01234567");
        s.right(5);
        assert_eq!(s.as_bytes(), b"34567");
        s.right(10);
        assert_eq!(s.as_bytes(), b"34567");
        s.mid(1, 3);
        assert_eq!(s.as_bytes(), b"456");
        s.mid(2, 10);
        assert_eq!(s.as_bytes(), b"6");
        s.mid(5, 1);
        assert!(s.is_empty());
        assert_terminated(&s);
    }

    #[test]
    fn test_trim() {
        let mut s = FurryString::from(" \t\r\n  text with spaces \n");
        s.trim_whitespace();
        assert_eq!(s.as_bytes(), b"text with spaces");
        let once = s.clone();
        s.trim_whitespace();
        assert_eq!(s, once);

        let mut s = FurryString::from("xxhixx");
        s.trim(b"x");
        assert_eq!(s.as_bytes(), b"hi");

        let mut s = FurryString::from(" \n ");
        s.trim_whitespace();
        assert!(s.is_empty());
    }

    #[test]
    fn test_fmt_write_and_display() {
        let mut s = FurryString::new();
        write!(s, "{}-{:03}", "id", 7).unwrap();
        assert_eq!(s.as_bytes(), b"id-007");
        assert_eq!(s.to_string(), "id-007");
        assert_eq!(format!("{s:?}"), "FurryString(\"id-007\")");
        assert_eq!(s.to_str(), Ok("id-007"));
    }

    #[test]
    fn test_ordering_follows_bytes() {
        let a = FurryString::from("abc");
        let b = FurryString::from("abd");
        assert!(a < b);
        assert_eq!(a.cmp(&a.clone()), core::cmp::Ordering::Equal);
    }
}
