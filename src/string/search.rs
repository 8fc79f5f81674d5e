//! Comparison, search and replacement on [`FurryString`].
//!
//! Searches return `None` when nothing matches. Offsets are byte offsets.

use super::FurryString;
use crate::error::{Error, Result};

/// `strcmp`-style comparison: the difference of the first differing bytes,
/// where the end of the shorter input counts as a NUL byte.
fn byte_compare(a: &[u8], b: &[u8], map: impl Fn(u8) -> u8) -> i32 {
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = map(a.get(i).copied().unwrap_or(0));
        let y = map(b.get(i).copied().unwrap_or(0));
        if x != y {
            return i32::from(x) - i32::from(y);
        }
    }
    0
}

fn find_bytes(haystack: &[u8], needle: &[u8], start: usize) -> Option<usize> {
    if start > haystack.len() {
        return None;
    }
    if needle.is_empty() {
        return Some(start);
    }
    haystack[start..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| start + offset)
}

impl FurryString {
    /// Byte-wise comparison with `strcmp` semantics.
    ///
    /// Negative, zero or positive; the magnitude is the difference between
    /// the first pair of bytes that differ.
    pub fn compare(&self, other: impl AsRef<[u8]>) -> i32 {
        byte_compare(self.as_bytes(), other.as_ref(), |b| b)
    }

    /// [`compare`](Self::compare) after ASCII lowercasing both sides.
    pub fn compare_case_insensitive(&self, other: impl AsRef<[u8]>) -> i32 {
        byte_compare(self.as_bytes(), other.as_ref(), |b| b.to_ascii_lowercase())
    }

    /// Whether both strings hold the same bytes.
    pub fn equal(&self, other: impl AsRef<[u8]>) -> bool {
        self.as_bytes() == other.as_ref()
    }

    /// Offset of the first occurrence of `needle` at or after `start`.
    pub fn find(&self, needle: impl AsRef<[u8]>, start: usize) -> Option<usize> {
        find_bytes(self.as_bytes(), needle.as_ref(), start)
    }

    /// Offset of the first `c` at or after `start`.
    pub fn find_char(&self, c: u8, start: usize) -> Option<usize> {
        self.as_bytes()
            .get(start..)?
            .iter()
            .position(|&b| b == c)
            .map(|offset| start + offset)
    }

    /// Offset of the last `c` at or before `start`; `None` scans from the end.
    pub fn find_char_reverse(&self, c: u8, start: Option<usize>) -> Option<usize> {
        let bytes = self.as_bytes();
        let end = match start {
            Some(start) => start.saturating_add(1).min(bytes.len()),
            None => bytes.len(),
        };
        bytes[..end].iter().rposition(|&b| b == c)
    }

    pub fn starts_with(&self, prefix: impl AsRef<[u8]>) -> bool {
        self.as_bytes().starts_with(prefix.as_ref())
    }

    pub fn ends_with(&self, suffix: impl AsRef<[u8]>) -> bool {
        self.as_bytes().ends_with(suffix.as_ref())
    }

    /// Replace the `len` bytes at `pos` with `replacement`.
    ///
    /// `len` is clamped to the end of the string; `pos` past the end fails.
    pub fn replace_range(&mut self, pos: usize, len: usize, replacement: impl AsRef<[u8]>) -> Result<()> {
        let size = self.len();
        if pos > size {
            return Err(Error::OutOfBounds);
        }
        let end = pos + len.min(size - pos);
        self.replace_range_bytes(pos, end, replacement.as_ref());
        Ok(())
    }

    /// Replace the first `needle` at or after `start`.
    ///
    /// Returns the offset of the replacement, or `None` if `needle` does not
    /// occur there.
    pub fn replace_first(
        &mut self,
        needle: impl AsRef<[u8]>,
        replacement: impl AsRef<[u8]>,
        start: usize,
    ) -> Option<usize> {
        let needle = needle.as_ref();
        let pos = self.find(needle, start)?;
        self.replace_range_bytes(pos, pos + needle.len(), replacement.as_ref());
        Some(pos)
    }

    /// Replace every non-overlapping occurrence of `needle`.
    ///
    /// Scanning resumes after each inserted replacement, so a replacement
    /// that contains `needle` is never matched again. An empty needle
    /// replaces nothing. Returns the number of replacements.
    pub fn replace_all(&mut self, needle: impl AsRef<[u8]>, replacement: impl AsRef<[u8]>) -> usize {
        let needle = needle.as_ref();
        let replacement = replacement.as_ref();
        if needle.is_empty() {
            return 0;
        }
        let mut count = 0;
        let mut start = 0;
        while let Some(pos) = self.find(needle, start) {
            self.replace_range_bytes(pos, pos + needle.len(), replacement);
            start = pos + replacement.len();
            count += 1;
        }
        count
    }
}
