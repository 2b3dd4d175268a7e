//! Headline splitting: free text → (line 1, line 2).

/// Longest allowed headline, in characters.
pub const LINE_1_MAX: usize = 120;
/// Longest allowed subheadline, in characters.
pub const LINE_2_MAX: usize = 180;

const ELLIPSIS: char = '…';
const EMPTY_HEADLINE: &str = "Memory";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline {
  pub line_1: String,
  pub line_2: Option<String>,
}

/// Split `text` into a headline and subheadline.
///
/// The first non-empty line becomes `line_1`; every later line is trimmed and
/// joined with single spaces into `line_2`. Both are truncated with a
/// trailing ellipsis so the result fits [`LINE_1_MAX`] / [`LINE_2_MAX`].
pub fn split_headline(text: &str) -> Headline {
  let mut lines = text.lines().map(str::trim).skip_while(|l| l.is_empty());

  let Some(first) = lines.next() else {
    return Headline { line_1: EMPTY_HEADLINE.to_owned(), line_2: None };
  };

  let rest = lines.filter(|l| !l.is_empty()).collect::<Vec<_>>().join(" ");

  Headline {
    line_1: truncate(first, LINE_1_MAX),
    line_2: Some(truncate(rest.trim(), LINE_2_MAX)).filter(|l| !l.is_empty()),
  }
}

/// Cut `s` to at most `max` characters, replacing the last kept character
/// with an ellipsis when anything was dropped.
pub fn truncate(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    return s.to_owned();
  }
  let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
  out.push(ELLIPSIS);
  out
}
