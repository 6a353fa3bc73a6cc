//! Benchmarks for occurrence scanning and styled replacement.
//!
//! Run with: `cargo bench -p styled-text --bench replace`

use divan::{
  Bencher,
  black_box,
};
use ropey::Rope;
use styled_text::{
  search::find_occurrences,
  spans::AttrSet,
  styled::StyledText,
};

fn main() {
  divan::main();
}

fn make_source(size: usize, needles: usize) -> String {
  let filler = "The quick brown fox jumps over the lazy dog. ";
  let chunk_len = size / (needles + 1);
  let mut chunk = String::with_capacity(chunk_len + filler.len());
  while chunk.len() < chunk_len {
    chunk.push_str(filler);
  }
  chunk.truncate(chunk_len);

  let mut s = String::with_capacity(size + 2 * needles);
  s.push_str(&chunk);
  for _ in 0..needles {
    s.push_str("@@");
    s.push_str(&chunk);
  }
  s
}

fn make_styled(size: usize, needles: usize) -> StyledText {
  let source = make_source(size, needles);
  let mut text = StyledText::from(source.as_str());
  let len = text.len_chars();
  let mut attrs = AttrSet::new();
  attrs.insert("font", "mono");
  text.set_attrs(0..len / 2, attrs).unwrap();
  text
}

mod scan {
  use super::*;

  const SIZE: usize = 64 * 1024;

  #[divan::bench(args = [8, 64])]
  fn occurrences(bencher: Bencher, needles: usize) {
    let rope = Rope::from(make_source(SIZE, needles).as_str());

    bencher.bench(|| find_occurrences(black_box(rope.slice(..)), black_box("@@")).count());
  }
}

mod replace {
  use super::*;

  const SIZE: usize = 64 * 1024;

  #[divan::bench(args = [8, 64])]
  fn same_width(bencher: Bencher, needles: usize) {
    let text = make_styled(SIZE, needles);

    bencher.bench(|| {
      let mut text = text.clone();
      text.replace_occurrences(black_box("@@"), black_box("!!")).unwrap();
      black_box(text);
    });
  }

  #[divan::bench(args = [8, 64])]
  fn shrinking(bencher: Bencher, needles: usize) {
    let text = make_styled(SIZE, needles);

    bencher.bench(|| {
      let mut text = text.clone();
      text.replace_occurrences(black_box("@@"), black_box("")).unwrap();
      black_box(text);
    });
  }
}
