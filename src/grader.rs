//! Answer grading: normalization, equality checks and character-level diff highlighting.
//!
//! Everything in here is pure. The session layer decides *when* to grade; this module
//! only decides *what* counts as equal and how a mismatch is shown.

use serde::Serialize;
use unicode_properties::{GeneralCategoryGroup, UnicodeGeneralCategory};

use crate::util::escape_html;

/// Above this many DP cells the middle of the two strings is reported as one replace span.
const MAX_DIFF_CELLS: usize = 4_000_000;

/// True for any code point in a Unicode punctuation category (Pc, Pd, Ps, Pe, Pi, Pf, Po).
pub fn is_punctuation(c: char) -> bool {
  c.general_category_group() == GeneralCategoryGroup::Punctuation
}

/// Strip punctuation and whitespace, then lower-case.
pub fn normalize(text: &str) -> String {
  let stripped: String = text
    .chars()
    .filter(|c| !is_punctuation(*c) && !c.is_whitespace())
    .collect();
  stripped.to_lowercase()
}

/// Case-, punctuation- and whitespace-insensitive comparison for free-text answers.
pub fn is_correct(user: &str, correct: &str) -> bool {
  normalize(user) == normalize(correct)
}

/// Multiple-choice options come verbatim from the corpus, so plain equality is enough.
pub fn is_match(selected: &str, correct: &str) -> bool {
  selected == correct
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffTag {
  Equal,
  Replace,
  Insert,
  Delete,
}

/// One aligned span. `correct` and `user` hold the substrings of each side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiffSpan {
  pub tag: DiffTag,
  pub correct: String,
  pub user: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Highlight {
  pub spans: Vec<DiffSpan>,
  pub markup: String,
}

/// Align the raw user text against the raw correct text and mark what differs.
///
/// Equal spans are emitted from the correct text. Mismatched spans echo what the user
/// typed; a deletion (user typed nothing there) echoes the missing correct text instead,
/// with a different class so the page can tell the two apart.
pub fn diff_highlight(correct: &str, user: &str) -> Highlight {
  let spans = diff_spans(correct, user);
  let markup = render_markup(&spans);
  Highlight { spans, markup }
}

pub fn render_markup(spans: &[DiffSpan]) -> String {
  let mut out = String::new();
  for s in spans {
    match s.tag {
      DiffTag::Equal => out.push_str(&escape_html(&s.correct)),
      DiffTag::Delete => {
        out.push_str("<mark class=\"missing\">");
        out.push_str(&escape_html(&s.correct));
        out.push_str("</mark>");
      }
      DiffTag::Replace | DiffTag::Insert => {
        out.push_str("<mark class=\"diff\">");
        out.push_str(&escape_html(&s.user));
        out.push_str("</mark>");
      }
    }
  }
  out
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Step {
  Keep,
  Drop,
  Add,
}

/// Opcode alignment over code points, built from a longest common subsequence.
pub fn diff_spans(correct: &str, user: &str) -> Vec<DiffSpan> {
  let a: Vec<char> = correct.chars().collect();
  let b: Vec<char> = user.chars().collect();

  let prefix = a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count();
  let suffix = a[prefix..]
    .iter()
    .rev()
    .zip(b[prefix..].iter().rev())
    .take_while(|(x, y)| x == y)
    .count();

  let mid_a = &a[prefix..a.len() - suffix];
  let mid_b = &b[prefix..b.len() - suffix];

  let mut steps = Vec::with_capacity(a.len() + b.len());
  steps.extend(std::iter::repeat(Step::Keep).take(prefix));
  steps.extend(align(mid_a, mid_b));
  steps.extend(std::iter::repeat(Step::Keep).take(suffix));

  group(&a, &b, &steps)
}

fn align(a: &[char], b: &[char]) -> Vec<Step> {
  let (m, n) = (a.len(), b.len());
  if m == 0 || n == 0 || (m + 1) * (n + 1) > MAX_DIFF_CELLS {
    let mut steps = vec![Step::Drop; m];
    steps.extend(std::iter::repeat(Step::Add).take(n));
    return steps;
  }

  // lcs[i][j] = LCS length of a[i..] and b[j..], flattened row-major.
  let w = n + 1;
  let mut lcs = vec![0u32; (m + 1) * w];
  for i in (0..m).rev() {
    for j in (0..n).rev() {
      lcs[i * w + j] = if a[i] == b[j] {
        lcs[(i + 1) * w + j + 1] + 1
      } else {
        lcs[(i + 1) * w + j].max(lcs[i * w + j + 1])
      };
    }
  }

  let mut steps = Vec::with_capacity(m + n);
  let (mut i, mut j) = (0, 0);
  while i < m && j < n {
    if a[i] == b[j] {
      steps.push(Step::Keep);
      i += 1;
      j += 1;
    } else if lcs[(i + 1) * w + j] >= lcs[i * w + j + 1] {
      steps.push(Step::Drop);
      i += 1;
    } else {
      steps.push(Step::Add);
      j += 1;
    }
  }
  steps.extend(std::iter::repeat(Step::Drop).take(m - i));
  steps.extend(std::iter::repeat(Step::Add).take(n - j));
  steps
}

fn group(a: &[char], b: &[char], steps: &[Step]) -> Vec<DiffSpan> {
  let mut spans = Vec::new();
  let (mut i, mut j) = (0usize, 0usize);
  let mut k = 0;
  while k < steps.len() {
    let (i0, j0) = (i, j);
    if steps[k] == Step::Keep {
      while k < steps.len() && steps[k] == Step::Keep {
        i += 1;
        j += 1;
        k += 1;
      }
      spans.push(DiffSpan {
        tag: DiffTag::Equal,
        correct: a[i0..i].iter().collect(),
        user: b[j0..j].iter().collect(),
      });
      continue;
    }
    while k < steps.len() && steps[k] != Step::Keep {
      match steps[k] {
        Step::Drop => i += 1,
        Step::Add => j += 1,
        Step::Keep => {}
      }
      k += 1;
    }
    let tag = match (i > i0, j > j0) {
      (true, true) => DiffTag::Replace,
      (true, false) => DiffTag::Delete,
      _ => DiffTag::Insert,
    };
    spans.push(DiffSpan {
      tag,
      correct: a[i0..i].iter().collect(),
      user: b[j0..j].iter().collect(),
    });
  }
  spans
}
