//! A text buffer with attribute spans, and search/replace over it.
//!
//! [`StyledText`] pairs a rope with a [`SpanSet`] and keeps the two in sync
//! through every edit. The only substring-level mutation entry point is
//! `replace_occurrences` (and its bounded/UTF-16 variants): it scans for
//! every match, rewrites the rope in a single transaction, and remaps the
//! spans through the same change list, so the buffer and its styling can
//! never drift apart.
//!
//! ```ignore
//! use styled_text::styled::StyledText;
//!
//! let mut text = StyledText::from("Hello 🌎 World!");
//! text.replace_occurrences("🌎 ", "")?;
//! assert_eq!(text.text(), "Hello World!");
//! ```
//!
//! # Attribute inheritance
//!
//! Replacement text is tagged with a copy of the attributes of the scalar
//! immediately preceding the match. A match at position 0 inherits from the
//! first following scalar not consumed by another match; when nothing
//! remains, the replacement stays unstyled. The copies share no identity
//! with their source spans.

use ropey::{
  Rope,
  RopeSlice,
};
use styled_core::{
  range::CharRange,
  utf16::{
    self,
    Utf16Range,
  },
};
use thiserror::Error;

use crate::{
  Tendril,
  search::find_occurrences_within,
  spans::{
    AttrSet,
    Span,
    SpanSet,
  },
  transaction::{
    Transaction,
    TransactionError,
  },
};

pub type Result<T> = std::result::Result<T, StyledTextError>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StyledTextError {
  #[error("range {start}..{end} is out of bounds for text length {len}")]
  OutOfBounds {
    start: usize,
    end:   usize,
    len:   usize,
  },
  #[error("input is not well-formed utf-16")]
  InvalidUtf16(#[from] std::string::FromUtf16Error),
  #[error(transparent)]
  Convert(#[from] utf16::Utf16Error),
  #[error(transparent)]
  Transaction(#[from] TransactionError),
}

/// A rope plus the attribute spans styling it.
///
/// Compares by value: char-for-char text equality and run-for-run span
/// equality (the normalized [`SpanSet`] form makes the latter well
/// defined).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyledText {
  text:  Rope,
  spans: SpanSet,
}

impl StyledText {
  pub fn new() -> Self {
    Self::default()
  }

  /// Builds a buffer from platform UTF-16 content. Ill-formed input
  /// (unpaired surrogates) is rejected here, before any scan or edit can
  /// see it.
  pub fn from_utf16(units: &[u16]) -> Result<Self> {
    let text = String::from_utf16(units)?;
    Ok(Self {
      text:  Rope::from(text.as_str()),
      spans: SpanSet::new(),
    })
  }

  pub fn text(&self) -> RopeSlice<'_> {
    self.text.slice(..)
  }

  pub fn spans(&self) -> &SpanSet {
    &self.spans
  }

  pub fn len_chars(&self) -> usize {
    self.text.len_chars()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.text.len_chars() == 0
  }

  /// Overwrites the attributes on `range`. An empty `attrs` clears it.
  pub fn set_attrs(&mut self, range: impl Into<CharRange>, attrs: AttrSet) -> Result<()> {
    let range = range.into();
    self.ensure_range(range)?;
    self.spans.set(range, attrs);
    Ok(())
  }

  /// The attributes in effect at one char position.
  pub fn attrs_at(&self, pos: usize) -> Option<&AttrSet> {
    self.spans.attrs_at(pos)
  }

  /// Replaces every occurrence of `query` with `replacement`, carrying the
  /// attribute spans across the edit. Returns the number of occurrences
  /// replaced; zero matches (including an empty query) leave the buffer
  /// untouched.
  pub fn replace_occurrences(&mut self, query: &str, replacement: &str) -> Result<usize> {
    let full = CharRange::new(0, self.text.len_chars());
    self.replace_occurrences_within(query, replacement, full)
  }

  /// Like [`replace_occurrences`](Self::replace_occurrences), but only
  /// matches lying entirely inside a platform UTF-16 range are replaced.
  pub fn replace_occurrences_in_utf16_range(
    &mut self,
    query: &str,
    replacement: &str,
    range: Utf16Range,
  ) -> Result<usize> {
    let bounds = utf16::char_range_from_utf16(self.text.slice(..), range)?;
    self.replace_occurrences_within(query, replacement, bounds)
  }

  /// Like [`replace_occurrences`](Self::replace_occurrences), but only
  /// matches lying entirely inside `bounds` are replaced; a match
  /// straddling either edge is left alone.
  pub fn replace_occurrences_within(
    &mut self,
    query: &str,
    replacement: &str,
    bounds: CharRange,
  ) -> Result<usize> {
    self.ensure_range(bounds)?;

    let matches: Vec<CharRange> =
      find_occurrences_within(self.text.slice(..), query, bounds).collect();
    if matches.is_empty() {
      return Ok(0);
    }

    let inherited = self.inherited_spans(&matches, replacement.chars().count());

    let transaction = Transaction::change(
      &self.text,
      matches.iter().map(|found| {
        let fragment = (!replacement.is_empty()).then(|| Tendril::from(replacement));
        (found.start, found.end, fragment)
      }),
    )?;
    tracing::trace!("replace transaction: {:#?}", transaction);

    let mut spans = self.spans.remap(transaction.changes_iter());
    for span in inherited {
      spans.set(span.range, span.attrs);
    }

    transaction.apply(&mut self.text)?;
    self.spans = spans;

    tracing::debug!("replaced {} occurrence(s) of {query:?}", matches.len());

    Ok(matches.len())
  }

  /// Attribute spans for the replacement fragments, in post-edit
  /// coordinates.
  fn inherited_spans(&self, matches: &[CharRange], ins_len: usize) -> Vec<Span> {
    if ins_len == 0 {
      return Vec::new();
    }

    let mut spans = Vec::new();
    let mut delta = 0isize;

    for (idx, found) in matches.iter().enumerate() {
      let start = found.start.saturating_add_signed(delta);
      delta += ins_len as isize - found.len() as isize;

      let attrs = self.inherited_attrs(matches, idx);
      if !attrs.is_empty() {
        spans.push(Span::new(CharRange::new(start, start + ins_len), attrs));
      }
    }

    spans
  }

  fn inherited_attrs(&self, matches: &[CharRange], idx: usize) -> AttrSet {
    let found = matches[idx];
    if found.start > 0 {
      return self
        .spans
        .attrs_at(found.start - 1)
        .cloned()
        .unwrap_or_default();
    }

    // A match at position 0 inherits from the first scalar after it that
    // no other match consumes.
    let mut pos = found.end;
    for later in &matches[idx + 1..] {
      if later.start != pos {
        break;
      }
      pos = later.end;
    }

    if pos < self.text.len_chars() {
      self.spans.attrs_at(pos).cloned().unwrap_or_default()
    } else {
      AttrSet::new()
    }
  }

  fn ensure_range(&self, range: CharRange) -> Result<()> {
    let len = self.text.len_chars();
    if range.start > range.end || range.end > len {
      return Err(StyledTextError::OutOfBounds {
        start: range.start,
        end:   range.end,
        len,
      });
    }
    Ok(())
  }
}

impl From<&str> for StyledText {
  fn from(text: &str) -> Self {
    Self {
      text:  Rope::from(text),
      spans: SpanSet::new(),
    }
  }
}

impl std::fmt::Display for StyledText {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.text)
  }
}
