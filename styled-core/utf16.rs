//! Conversions between UTF-16 code-unit offsets and char indices.
//!
//! Host platform string and range APIs address text in UTF-16 code units,
//! while everything in this workspace operates on char (Unicode scalar)
//! indices so that no edit can ever split an encoded code point. This module
//! is the boundary between the two worlds: it converts offsets and
//! (location, length) ranges coming from the platform into [`CharRange`]s,
//! and maps internal ranges back out.
//!
//! # Offsets
//!
//! A UTF-16 offset is *scalar aligned* when it sits on the boundary between
//! two encoded scalars (or at either end of the buffer). Supplementary-plane
//! scalars occupy two code units, so not every offset is aligned:
//!
//! ```text
//! "a🌍b"   chars:   a     🌍      b
//!          utf-16:  0  1  2   3  4
//!                        ^^^ offset 2 splits the surrogate pair
//! ```
//!
//! Conversions reject misaligned and out-of-range offsets instead of
//! rounding or clamping; silently moving an offset corrupts text. The
//! boundary-stepping lookups ([`location_before`], [`location_after`],
//! [`index_from_location`]) return `None` at the buffer edges and on invalid
//! offsets so callers can probe without handling errors.
//!
//! All functions are pure over `(offset, buffer contents)` and walk the
//! buffer in one pass, accumulating [`char::len_utf16`] per scalar.

use ropey::RopeSlice;
use thiserror::Error;

use crate::range::CharRange;

pub type Result<T> = std::result::Result<T, Utf16Error>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum Utf16Error {
  #[error("utf-16 offset {offset} is out of bounds for utf-16 length {len}")]
  OutOfBounds { offset: usize, len: usize },
  #[error("utf-16 offset {offset} falls inside a surrogate pair")]
  MisalignedOffset { offset: usize },
  #[error("char index {index} is out of bounds for char length {len}")]
  CharIndexOutOfBounds { index: usize, len: usize },
}

/// A (location, length) pair in UTF-16 code units, as exchanged with the
/// host platform's range APIs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Utf16Range {
  pub location: usize,
  pub length:   usize,
}

impl Utf16Range {
  pub fn new(location: usize, length: usize) -> Self {
    Self { location, length }
  }

  /// First offset past the range.
  #[inline]
  #[must_use]
  pub fn end_location(&self) -> usize {
    self.location + self.length
  }

  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.length == 0
  }
}

/// Total length of `text` in UTF-16 code units.
pub fn utf16_len(text: RopeSlice) -> usize {
  text.chars().map(|ch| ch.len_utf16()).sum()
}

/// Converts a UTF-16 offset into the corresponding char index.
///
/// Errors with [`Utf16Error::OutOfBounds`] past the end of the buffer and
/// with [`Utf16Error::MisalignedOffset`] when the offset lands strictly
/// inside a surrogate pair. Never rounds.
pub fn char_idx_from_utf16(text: RopeSlice, offset: usize) -> Result<usize> {
  let mut cu = 0;
  for (idx, ch) in text.chars().enumerate() {
    if cu == offset {
      return Ok(idx);
    }
    cu += ch.len_utf16();
    if cu > offset {
      return Err(Utf16Error::MisalignedOffset { offset });
    }
  }

  if cu == offset {
    Ok(text.len_chars())
  } else {
    Err(Utf16Error::OutOfBounds { offset, len: cu })
  }
}

/// Converts a char index into the corresponding UTF-16 offset.
///
/// Total for every index in `0..=len_chars`; char indices are always scalar
/// aligned by construction.
pub fn utf16_offset_from_char(text: RopeSlice, char_idx: usize) -> Result<usize> {
  if char_idx > text.len_chars() {
    return Err(Utf16Error::CharIndexOutOfBounds {
      index: char_idx,
      len:   text.len_chars(),
    });
  }

  Ok(text.chars().take(char_idx).map(|ch| ch.len_utf16()).sum())
}

/// Converts a platform range into a [`CharRange`], validating both
/// endpoints.
pub fn char_range_from_utf16(text: RopeSlice, range: Utf16Range) -> Result<CharRange> {
  let start = char_idx_from_utf16(text, range.location)?;
  let end = char_idx_from_utf16(text, range.end_location())?;
  Ok(CharRange::new(start, end))
}

/// Converts a [`CharRange`] into a platform range. The inverse of
/// [`char_range_from_utf16`].
pub fn utf16_range_from_chars(text: RopeSlice, range: CharRange) -> Result<Utf16Range> {
  let location = utf16_offset_from_char(text, range.start)?;
  let end = utf16_offset_from_char(text, range.end)?;
  Ok(Utf16Range {
    location,
    length: end - location,
  })
}

/// The UTF-16 offset of the scalar boundary preceding `offset`, stepping by
/// the full width of the scalar before it.
///
/// `None` at offset 0, on a misaligned or out-of-range offset, and on an
/// empty buffer.
pub fn location_before(text: RopeSlice, offset: usize) -> Option<usize> {
  let mut prev = None;
  let mut cu = 0;

  for ch in text.chars() {
    if cu >= offset {
      break;
    }
    prev = Some(cu);
    cu += ch.len_utf16();
  }

  if cu == offset { prev } else { None }
}

/// The UTF-16 offset of the scalar boundary following `offset`, stepping by
/// the full width of the scalar after it.
///
/// `None` at the end of the buffer, on a misaligned or out-of-range offset,
/// and on an empty buffer.
pub fn location_after(text: RopeSlice, offset: usize) -> Option<usize> {
  use std::cmp::Ordering;

  let mut cu = 0;
  for ch in text.chars() {
    match cu.cmp(&offset) {
      Ordering::Less => cu += ch.len_utf16(),
      Ordering::Equal => return Some(cu + ch.len_utf16()),
      Ordering::Greater => return None,
    }
  }

  None
}

/// The char index at a UTF-16 offset, or `None` when the offset is not a
/// valid scalar boundary. The `Option` form of [`char_idx_from_utf16`].
pub fn index_from_location(text: RopeSlice, offset: usize) -> Option<usize> {
  char_idx_from_utf16(text, offset).ok()
}

/// The zero-length range positioned at the very end of the buffer, used as
/// an "append here" insertion point.
pub fn end_of_text_range(text: RopeSlice) -> Utf16Range {
  Utf16Range {
    location: utf16_len(text),
    length:   0,
  }
}
