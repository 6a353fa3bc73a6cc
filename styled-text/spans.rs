//! Attribute spans attached to ranges of a text buffer.
//!
//! The styling layer hangs opaque key/value attribute sets off contiguous
//! char ranges. This module stores them as a [`SpanSet`], kept in a
//! normalized form so that two sets describing the same per-char attributes
//! always compare equal:
//!
//! - spans are sorted by start and pairwise non-overlapping
//! - no span has an empty range or an empty attribute set (an empty set is
//!   simply the absence of a span)
//! - adjacent spans with equal attributes are merged into one
//!
//! The attribute contents are never interpreted here; they are copied,
//! split, and shifted as the text underneath them changes. [`SpanSet::remap`]
//! carries a set across an applied [`Transaction`](crate::transaction): spans
//! fully inside a replaced range disappear, spans overlapping a boundary are
//! truncated at it, and everything downstream shifts by the accumulated
//! length delta.

use std::collections::BTreeMap;

use smallvec::SmallVec;
use styled_core::range::CharRange;

use crate::{
  Tendril,
  transaction::Change,
};

/// An opaque set of styling attributes, compared by value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrSet {
  entries: BTreeMap<Tendril, Tendril>,
}

impl AttrSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, key: impl Into<Tendril>, value: impl Into<Tendril>) -> Option<Tendril> {
    self.entries.insert(key.into(), value.into())
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.entries.get(key).map(Tendril::as_str)
  }

  pub fn remove(&mut self, key: &str) -> Option<Tendril> {
    self.entries.remove(key)
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .entries
      .iter()
      .map(|(key, value)| (key.as_str(), value.as_str()))
  }
}

impl<K: Into<Tendril>, V: Into<Tendril>> FromIterator<(K, V)> for AttrSet {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self {
      entries: iter
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect(),
    }
  }
}

/// One attribute set attached to one char range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
  pub range: CharRange,
  pub attrs: AttrSet,
}

impl Span {
  pub fn new(range: impl Into<CharRange>, attrs: AttrSet) -> Self {
    Self {
      range: range.into(),
      attrs,
    }
  }
}

/// A normalized collection of non-overlapping attribute spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanSet {
  spans: SmallVec<[Span; 1]>,
}

impl SpanSet {
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.spans.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.spans.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Span> {
    self.spans.iter()
  }

  /// The attributes in effect at one char position.
  pub fn attrs_at(&self, pos: usize) -> Option<&AttrSet> {
    self
      .spans
      .iter()
      .find(|span| span.range.contains(pos))
      .map(|span| &span.attrs)
  }

  /// Overwrites the attributes on `range`: existing spans are carved around
  /// it, then `attrs` covers it. An empty `attrs` clears the range.
  pub fn set(&mut self, range: CharRange, attrs: AttrSet) {
    if range.is_empty() {
      return;
    }

    let mut next: SmallVec<[Span; 1]> = SmallVec::new();
    for span in self.spans.drain(..) {
      if !span.range.overlaps(&range) {
        next.push(span);
        continue;
      }
      if span.range.start < range.start {
        next.push(Span::new(
          CharRange::new(span.range.start, range.start),
          span.attrs.clone(),
        ));
      }
      if span.range.end > range.end {
        next.push(Span::new(CharRange::new(range.end, span.range.end), span.attrs));
      }
    }

    if !attrs.is_empty() {
      next.push(Span::new(range, attrs));
    }
    next.sort_by_key(|span| span.range.start);

    self.spans = merged(next);
  }

  /// Maps every span through an ascending, non-overlapping change list (as
  /// produced by
  /// [`Transaction::changes_iter`](crate::transaction::Transaction::changes_iter)).
  ///
  /// For each change replacing `from..to` with a fragment of `ins` chars:
  /// span parts inside `from..to` are deleted, a span end inside it is
  /// truncated to the change start, a span start inside it moves past the
  /// inserted fragment, and spans past `to` shift by the signed length
  /// delta. A fragment lands inside a span only when the span strictly
  /// contains its change; at span boundaries it is not absorbed. Callers
  /// attach attributes for inserted text separately.
  pub fn remap(&self, changes: impl IntoIterator<Item = Change>) -> SpanSet {
    let edits: Vec<(usize, usize, usize)> = changes
      .into_iter()
      .map(|(from, to, fragment)| {
        (from, to, fragment.map_or(0, |text| text.chars().count()))
      })
      .collect();

    if edits.is_empty() {
      return self.clone();
    }

    let mut next: SmallVec<[Span; 1]> = SmallVec::new();
    for span in &self.spans {
      let start = remap_start(span.range.start, &edits);
      let end = remap_end(span.range.end, &edits);
      if start < end {
        next.push(Span::new(CharRange::new(start, end), span.attrs.clone()));
      }
    }

    SpanSet {
      spans: merged(next),
    }
  }
}

impl FromIterator<Span> for SpanSet {
  fn from_iter<I: IntoIterator<Item = Span>>(iter: I) -> Self {
    let mut set = Self::new();
    for span in iter {
      set.set(span.range, span.attrs);
    }
    set
  }
}

/// Drops degenerate spans and merges equal neighbors. Expects `spans`
/// sorted by start.
fn merged(spans: SmallVec<[Span; 1]>) -> SmallVec<[Span; 1]> {
  let mut out: SmallVec<[Span; 1]> = SmallVec::new();

  for span in spans {
    if span.range.is_empty() || span.attrs.is_empty() {
      continue;
    }
    match out.last_mut() {
      Some(last) if last.range.end == span.range.start && last.attrs == span.attrs => {
        last.range.end = span.range.end;
      },
      _ => out.push(span),
    }
  }

  out
}

fn remap_start(pos: usize, edits: &[(usize, usize, usize)]) -> usize {
  let mut delta = 0isize;

  for &(from, to, ins) in edits {
    if to <= pos {
      delta += ins as isize - (to - from) as isize;
      continue;
    }
    if from <= pos {
      // Start inside the edit: the surviving tail begins after the
      // inserted fragment.
      return from.saturating_add_signed(delta) + ins;
    }
    break;
  }

  pos.saturating_add_signed(delta)
}

fn remap_end(pos: usize, edits: &[(usize, usize, usize)]) -> usize {
  let mut delta = 0isize;

  for &(from, to, ins) in edits {
    if to < pos {
      delta += ins as isize - (to - from) as isize;
      continue;
    }
    if from < pos {
      // End inside the edit: truncate at the edit boundary.
      return from.saturating_add_signed(delta);
    }
    break;
  }

  pos.saturating_add_signed(delta)
}
