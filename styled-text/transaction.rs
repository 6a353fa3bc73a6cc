//! Batched edit application with running-offset bookkeeping.
//!
//! Replacing several occurrences of a substring shifts every coordinate
//! after the first edit, so match ranges computed against the original
//! buffer cannot be applied to it one by one. A [`ChangeSet`] solves this by
//! describing all edits as a single sequence of [`Operation`]s applied
//! front to back:
//!
//! - **Retain(n)** - keep `n` chars unchanged
//! - **Delete(n)** - remove `n` chars
//! - **Insert(s)** - insert the fragment `s`
//!
//! Because the operations are expressed as relative runs, one linear pass
//! rewrites the whole buffer while every edit's coordinates stay valid in
//! the original index space.
//!
//! # Basic Usage
//!
//! ```ignore
//! use ropey::Rope;
//! use styled_text::transaction::Transaction;
//!
//! let mut doc = Rope::from("hello world");
//!
//! // Replace "world" with "rust".
//! let tx = Transaction::change(&doc, vec![
//!     (6, 11, Some("rust".into()))
//! ])?;
//! tx.apply(&mut doc)?;
//! assert_eq!(doc, "hello rust");
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, TransactionError>`]:
//!
//! - **LengthMismatch** - document length doesn't match changeset
//!   expectation
//! - **InvalidRange** - change range has start > end
//! - **RangeOutOfBounds** - change range extends past document end
//! - **OverlappingRange** - changes overlap a previous range

use ropey::{
  Rope,
  RopeBuilder,
  RopeSlice,
};
use thiserror::Error;

use crate::Tendril;

pub type Result<T> = std::result::Result<T, TransactionError>;

/// (from, to) replacement.
pub type Change = (usize, usize, Option<Tendril>);

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransactionError {
  #[error("changeset length mismatch: expected {expected}, got {actual}")]
  LengthMismatch { expected: usize, actual: usize },
  #[error("invalid change range: start {from} is after end {to}")]
  InvalidRange { from: usize, to: usize },
  #[error("change range {from}..{to} is out of bounds for document length {len}")]
  RangeOutOfBounds {
    from: usize,
    to:   usize,
    len:  usize,
  },
  #[error("change range {from}..{to} overlaps previous end {prev_end}")]
  OverlappingRange {
    prev_end: usize,
    from:     usize,
    to:       usize,
  },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
  /// Move past n characters.
  Retain(usize),

  /// Delete n characters.
  Delete(usize),

  /// Insert text at position.
  Insert(Tendril),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
  pub(crate) changes: Vec<Operation>,
  /// The required document length. Will refuse to apply changes unless it
  /// matches.
  len:                usize,
  len_after:          usize,
}

impl ChangeSet {
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      changes:   Vec::with_capacity(capacity),
      len:       0,
      len_after: 0,
    }
  }

  #[must_use]
  pub fn new(doc: RopeSlice) -> Self {
    let len = doc.len_chars();
    Self {
      changes: Vec::new(),
      len,
      len_after: len,
    }
  }

  /// Returns the expected document length for this changeset.
  pub fn len(&self) -> usize {
    self.len
  }

  /// Returns the document length after this changeset is applied.
  pub fn len_after(&self) -> usize {
    self.len_after
  }

  // Changeset builder operations: delete/insert/retain.
  //

  pub fn delete(&mut self, n: usize) {
    use Operation::*;

    if n == 0 {
      return;
    }

    self.len += n;

    if let Some(Delete(count)) = self.changes.last_mut() {
      *count += n;
    } else {
      self.changes.push(Delete(n))
    }
  }

  pub fn insert(&mut self, fragment: Tendril) {
    use Operation::*;

    if fragment.is_empty() {
      return;
    }

    self.len_after += fragment.chars().count();

    let new_last = match self.changes.as_mut_slice() {
      [.., Insert(prev)] | [.., Insert(prev), Delete(_)] => {
        prev.push_str(&fragment);
        return;
      },
      [.., last @ Delete(_)] => std::mem::replace(last, Insert(fragment)),
      _ => Insert(fragment),
    };

    self.changes.push(new_last);
  }

  pub fn retain(&mut self, n: usize) {
    use Operation::*;

    if n == 0 {
      return;
    }

    self.len += n;
    self.len_after += n;

    if let Some(Retain(count)) = self.changes.last_mut() {
      *count += n;
    } else {
      self.changes.push(Retain(n))
    }
  }

  fn ensure_len(&self, text_len: usize) -> Result<()> {
    if text_len != self.len {
      return Err(TransactionError::LengthMismatch {
        expected: self.len,
        actual:   text_len,
      });
    }
    Ok(())
  }

  /// Apply this changeset in-place.
  pub fn apply(&self, text: &mut Rope) -> Result<()> {
    self.ensure_len(text.len_chars())?;
    let mut pos = 0;

    for change in &self.changes {
      use Operation::*;
      match change {
        Retain(n) => pos += n,
        Delete(n) => text.remove(pos..pos + *n),
        Insert(s) => {
          text.insert(pos, s);
          pos += s.chars().count();
        },
      }
    }

    Ok(())
  }

  /// Apply this changeset to a rope and return the updated rope.
  pub fn apply_to(&self, text: &Rope) -> Result<Rope> {
    self.ensure_len(text.len_chars())?;
    if self.is_empty() {
      return Ok(text.clone());
    }

    let mut builder = RopeBuilder::new();
    let mut pos = 0;

    let append_slice = |from: usize, to: usize, builder: &mut RopeBuilder| {
      if from >= to {
        return;
      }
      let slice = text.slice(from..to);
      for chunk in slice.chunks() {
        builder.append(chunk);
      }
    };

    for change in &self.changes {
      use Operation::*;
      match change {
        Retain(n) => {
          append_slice(pos, pos + *n, &mut builder);
          pos += n;
        },
        Delete(n) => {
          pos += n;
        },
        Insert(s) => {
          builder.append(s.as_str());
        },
      }
    }

    append_slice(pos, self.len, &mut builder);

    Ok(builder.finish())
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.changes.is_empty() || self.changes == [Operation::Retain(self.len)]
  }

  pub fn changes_iter(&self) -> ChangeIterator<'_> {
    ChangeIterator::new(self)
  }
}

/// Recovers the coalesced `(from, to, fragment)` triples of a changeset, in
/// ascending original-buffer coordinates.
pub struct ChangeIterator<'a> {
  iter: std::iter::Peekable<std::slice::Iter<'a, Operation>>,
  pos:  usize,
}

impl<'a> ChangeIterator<'a> {
  fn new(changeset: &'a ChangeSet) -> Self {
    let iter = changeset.changes.iter().peekable();
    Self { iter, pos: 0 }
  }
}

impl Iterator for ChangeIterator<'_> {
  type Item = Change;

  fn next(&mut self) -> Option<Self::Item> {
    use Operation::*;

    loop {
      match self.iter.next()? {
        Retain(len) => {
          self.pos += len;
        },
        Delete(len) => {
          let start = self.pos;
          self.pos += len;
          return Some((start, self.pos, None));
        },
        Insert(s) => {
          let start = self.pos;
          // a subsequent delete means a replace, consume it
          if let Some(Delete(len)) = self.iter.peek() {
            self.iter.next();

            self.pos += len;
            return Some((start, self.pos, Some(s.clone())));
          } else {
            return Some((start, start, Some(s.clone())));
          }
        },
      }
    }
  }
}

fn validate_change_bounds(from: usize, to: usize, len: usize) -> Result<()> {
  if from > to {
    return Err(TransactionError::InvalidRange { from, to });
  }
  if to > len {
    return Err(TransactionError::RangeOutOfBounds { from, to, len });
  }
  Ok(())
}

impl From<ChangeSet> for Transaction {
  fn from(changes: ChangeSet) -> Self {
    Self { changes }
  }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transaction {
  changes: ChangeSet,
}

impl Transaction {
  /// Apply this transaction in-place.
  pub fn apply(&self, doc: &mut Rope) -> Result<()> {
    self.changes.apply(doc)
  }

  /// Apply this transaction to a rope and return the updated rope.
  pub fn apply_to(&self, doc: &Rope) -> Result<Rope> {
    self.changes.apply_to(doc)
  }

  /// Generate a transaction from a set of changes. The changes must be
  /// sorted by position and non-overlapping.
  pub fn change<I>(doc: &Rope, changes: I) -> Result<Self>
  where
    I: IntoIterator<Item = Change>,
  {
    let len = doc.len_chars();
    let changes = changes.into_iter();
    let (lower, upper) = changes.size_hint();
    let size = upper.unwrap_or(lower);
    let mut changeset = ChangeSet::with_capacity(2 * size + 1); // rough estimate

    let mut last = 0;
    for (from, to, tendril) in changes {
      validate_change_bounds(from, to, len)?;
      if from < last {
        return Err(TransactionError::OverlappingRange {
          prev_end: last,
          from,
          to,
        });
      }

      // Retain from last "to" to current "from"
      changeset.retain(from - last);
      let span = to - from;
      match tendril {
        Some(text) => {
          changeset.insert(text);
          changeset.delete(span);
        },
        None => changeset.delete(span),
      }
      last = to;
    }

    changeset.retain(len - last);

    Ok(Self::from(changeset))
  }

  pub fn changes_iter(&self) -> ChangeIterator<'_> {
    self.changes.changes_iter()
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn transaction_change() {
    let mut doc = Rope::from("hello world!\ntest 123");
    let transaction = Transaction::change(
      &doc,
      // (1, 1, None) is a useless 0-width delete that gets factored out
      vec![(1, 1, None), (6, 11, Some("void".into())), (12, 17, None)],
    )
    .unwrap();
    transaction.apply(&mut doc).unwrap();
    assert_eq!(doc, Rope::from_str("hello void! 123"));
  }

  #[test]
  fn changes_iter() {
    let doc = Rope::from("hello world!\ntest 123");
    let changes = vec![(6, 11, Some("void".into())), (12, 17, None)];
    let transaction = Transaction::change(&doc, changes.clone()).unwrap();
    assert_eq!(transaction.changes_iter().collect::<Vec<_>>(), changes);
  }

  #[test]
  fn builder_coalesces_runs() {
    use Operation::*;

    let mut changes = ChangeSet::with_capacity(4);
    changes.retain(2);
    changes.retain(3);
    changes.insert("ab".into());
    changes.insert("cd".into());
    changes.delete(1);
    changes.delete(2);

    assert_eq!(changes.changes, &[
      Retain(5),
      Insert("abcd".into()),
      Delete(3)
    ]);
    assert_eq!(changes.len(), 8);
    assert_eq!(changes.len_after(), 9);
  }

  #[test]
  fn apply_to_matches_in_place() {
    let doc = Rope::from("hello world!");
    let transaction = Transaction::change(&doc, vec![
      (6, 11, Some("void".into())),
      (12, 12, Some("!!".into())),
    ])
    .unwrap();

    let mut in_place = doc.clone();
    transaction.apply(&mut in_place).unwrap();
    let persistent = transaction.apply_to(&doc).unwrap();

    assert_eq!(in_place, persistent);
    assert_eq!(doc, Rope::from("hello world!"));
  }

  #[test]
  fn change_rejects_overlapping_ranges() {
    let doc = Rope::from("hello world!");
    let err = Transaction::change(&doc, vec![(0, 5, None), (3, 8, None)]).unwrap_err();
    assert_eq!(err, TransactionError::OverlappingRange {
      prev_end: 5,
      from:     3,
      to:       8,
    });
  }

  #[test]
  fn change_rejects_invalid_ranges() {
    let doc = Rope::from("hello");
    let err = Transaction::change(&doc, vec![(4, 2, None)]).unwrap_err();
    assert_eq!(err, TransactionError::InvalidRange { from: 4, to: 2 });

    let err = Transaction::change(&doc, vec![(2, 9, None)]).unwrap_err();
    assert_eq!(err, TransactionError::RangeOutOfBounds {
      from: 2,
      to:   9,
      len:  5,
    });
  }

  #[test]
  fn apply_errors_on_length_mismatch() {
    let doc = Rope::from("hello");
    let changes = ChangeSet::new(doc.slice(..));
    let mut other = Rope::from("nope");

    let err = changes.apply(&mut other).unwrap_err();
    assert!(matches!(err, TransactionError::LengthMismatch {
      expected: 5,
      actual:   4,
    }));
    let err = changes.apply_to(&other).unwrap_err();
    assert!(matches!(err, TransactionError::LengthMismatch {
      expected: 5,
      actual:   4,
    }));
    assert_eq!(other, Rope::from("nope"));
  }
}
