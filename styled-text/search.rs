//! Substring search within a rope slice.
//!
//! [`find_occurrences`] walks a buffer strictly left to right and yields
//! every non-overlapping occurrence of a query as a
//! [`CharRange`], restarting immediately after the end of each match, so
//! overlapping candidates are never double-counted (searching "aaa" for
//! "aa" yields one match, not two).
//!
//! # Examples
//!
//! ```ignore
//! use ropey::Rope;
//! use styled_text::search::find_occurrences;
//!
//! let text = Rope::from("one, two, three");
//! let matches: Vec<_> = find_occurrences(text.slice(..), ", ").collect();
//! assert_eq!(matches.len(), 2);
//! ```
//!
//! # Design Notes
//!
//! - **Char positions**: matches are char ranges, never byte or UTF-16
//!   ranges, so they can be fed straight into a transaction.
//! - **Empty query**: yields no matches; there is no sensible occurrence of
//!   "" anywhere.
//! - **Bounds**: [`find_occurrences_within`] only yields matches lying
//!   entirely inside the bounding range; a match straddling either edge is
//!   excluded. Bounds are clamped to the buffer.

use ropey::RopeSlice;
use smallvec::SmallVec;
use styled_core::range::CharRange;

/// Lazy iterator over non-overlapping occurrences of a query, in ascending
/// order.
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
  text:  RopeSlice<'a>,
  query: SmallVec<[char; 8]>,
  pos:   usize,
  end:   usize,
}

/// Find every occurrence of `query` in the whole buffer.
pub fn find_occurrences<'a>(text: RopeSlice<'a>, query: &str) -> Occurrences<'a> {
  let len = text.len_chars();
  find_occurrences_within(text, query, CharRange::new(0, len))
}

/// Find every occurrence of `query` lying entirely within `bounds`.
pub fn find_occurrences_within<'a>(
  text: RopeSlice<'a>,
  query: &str,
  bounds: CharRange,
) -> Occurrences<'a> {
  let end = bounds.end.min(text.len_chars());
  Occurrences {
    text,
    query: query.chars().collect(),
    pos: bounds.start.min(end),
    end,
  }
}

impl Iterator for Occurrences<'_> {
  type Item = CharRange;

  fn next(&mut self) -> Option<CharRange> {
    let len = self.query.len();
    if len == 0 {
      return None;
    }

    while self.pos + len <= self.end {
      let mut chars = self.text.chars_at(self.pos);
      if self.query.iter().all(|&q| chars.next() == Some(q)) {
        let found = CharRange::new(self.pos, self.pos + len);
        self.pos = found.end;
        return Some(found);
      }
      self.pos += 1;
    }

    None
  }
}

#[cfg(test)]
mod test {
  use ropey::Rope;

  use super::*;

  #[test]
  fn find_single_occurrence() {
    let text = Rope::from("Hello World!");
    let slice = text.slice(..);

    let matches: Vec<_> = find_occurrences(slice, "World").collect();
    assert_eq!(matches, vec![CharRange::new(6, 11)]);
  }

  #[test]
  fn find_repeated_occurrences() {
    let text = Rope::from("Hello 🌎, Hello World! Hello There!");
    let slice = text.slice(..);

    let matches: Vec<_> = find_occurrences(slice, "Hello ").collect();
    assert_eq!(matches, vec![
      CharRange::new(0, 6),
      CharRange::new(9, 15),
      CharRange::new(22, 28),
    ]);
  }

  #[test]
  fn matches_are_char_ranges() {
    let text = Rope::from("🌎🍎🍎😬🍎🌎");
    let slice = text.slice(..);

    let matches: Vec<_> = find_occurrences(slice, "🍎").collect();
    assert_eq!(matches, vec![
      CharRange::new(1, 2),
      CharRange::new(2, 3),
      CharRange::new(4, 5),
    ]);
  }

  #[test]
  fn overlapping_candidates_are_not_double_counted() {
    let text = Rope::from("aaa");
    let slice = text.slice(..);

    // The scan restarts after each match end.
    let matches: Vec<_> = find_occurrences(slice, "aa").collect();
    assert_eq!(matches, vec![CharRange::new(0, 2)]);
  }

  #[test]
  fn empty_and_absent_queries_yield_nothing() {
    let text = Rope::from("Hello World!");
    let slice = text.slice(..);

    assert_eq!(find_occurrences(slice, "").count(), 0);
    assert_eq!(find_occurrences(slice, "🍎").count(), 0);
    assert_eq!(find_occurrences(slice, "Worlds").count(), 0);
  }

  #[test]
  fn bounded_search_excludes_straddling_matches() {
    let text = Rope::from("abcabcabc");
    let slice = text.slice(..);

    // Only the middle occurrence lies entirely inside 2..7.
    let matches: Vec<_> = find_occurrences_within(slice, "abc", CharRange::new(2, 7)).collect();
    assert_eq!(matches, vec![CharRange::new(3, 6)]);

    // A match ending exactly at the bound is included.
    let matches: Vec<_> = find_occurrences_within(slice, "abc", CharRange::new(3, 6)).collect();
    assert_eq!(matches, vec![CharRange::new(3, 6)]);

    // Bounds past the buffer are clamped.
    let matches: Vec<_> = find_occurrences_within(slice, "abc", CharRange::new(6, 42)).collect();
    assert_eq!(matches, vec![CharRange::new(6, 9)]);
  }
}
