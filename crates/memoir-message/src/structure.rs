//! Heuristic parsing of labeled post text.
//!
//! Authors sometimes write posts as a loose form:
//!
//! ```text
//! Name: Graduation
//! Date: 2020-05-01
//! Type - milestone
//! Post: Proud moment.
//! More of the body…
//! ```
//!
//! Labels are case-insensitive and may be followed by `:` or `-`. `Post:`
//! swallows the rest of the text, newlines included. Unlabeled text is taken
//! verbatim as the description.

use std::sync::LazyLock;

use memoir_core::post::Attachment;
use regex::Regex;

use crate::attachments;

static LABEL: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)^\s*(name|date|type|post)\s*[:\-]\s*(.*)$").expect("label pattern is valid")
});

/// The normalized tuple derived from one post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMessage {
  pub title:       Option<String>,
  pub description: String,
  pub event_date:  Option<String>,
  pub event_type:  Option<String>,
}

#[derive(Default)]
struct Labels {
  name: Option<String>,
  date: Option<String>,
  kind: Option<String>,
  post: Option<String>,
}

/// Structure `raw_text` into a [`ParsedMessage`].
///
/// - `fallback_date` is used when no `Date:` label is present.
/// - `roots` is the attachment forest, searched for text when `raw_text` is
///   empty.
/// - `primary` supplies the title and type when no label does.
/// - `place_name`, when known, is appended as a `Location:` line unless the
///   description already mentions it.
pub fn structure(
  raw_text: &str,
  fallback_date: Option<&str>,
  roots: &[Attachment],
  primary: Option<&Attachment>,
  place_name: Option<&str>,
) -> ParsedMessage {
  let text = raw_text.trim();
  let labels = scan_labels(text);

  let mut description = match labels.post {
    Some(body) => body,
    None if !text.is_empty() => text.to_owned(),
    None => attachments::first_text(roots)
      .unwrap_or_default()
      .to_owned(),
  };

  if let Some(place) = place_name.map(str::trim).filter(|p| !p.is_empty())
    && !description.to_lowercase().contains(&place.to_lowercase())
  {
    if !description.is_empty() {
      description.push('\n');
    }
    description.push_str("Location: ");
    description.push_str(place);
  }

  ParsedMessage {
    title: labels
      .name
      .or_else(|| primary.and_then(Attachment::title_text).map(str::to_owned)),
    description,
    event_date: labels.date.or_else(|| fallback_date.map(str::to_owned)),
    event_type: labels.kind.or_else(|| {
      primary
        .and_then(|a| a.kind.as_deref())
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_owned)
    }),
  }
}

/// First occurrence of each label wins; `Post:` ends the scan.
fn scan_labels(text: &str) -> Labels {
  let lines: Vec<&str> = text.lines().collect();
  let mut labels = Labels::default();

  for (i, line) in lines.iter().enumerate() {
    let Some(caps) = LABEL.captures(line) else {
      continue;
    };
    let value = caps.get(2).map_or("", |m| m.as_str()).trim();
    let captured = Some(value.to_owned()).filter(|v| !v.is_empty());

    match caps[1].to_ascii_lowercase().as_str() {
      "name" => labels.name = labels.name.or(captured),
      "date" => labels.date = labels.date.or(captured),
      "type" => labels.kind = labels.kind.or(captured),
      _ => {
        let mut body = value.to_owned();
        for rest in &lines[i + 1..] {
          body.push('\n');
          body.push_str(rest);
        }
        labels.post = Some(body.trim().to_owned());
        break;
      }
    }
  }

  labels
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn plain(text: &str) -> ParsedMessage { structure(text, None, &[], None, None) }

  #[test]
  fn labeled_fields_override_raw_text() {
    let p = plain("Name: Graduation\nDate: 2020-05-01\nPost: Proud moment");
    assert_eq!(p.title.as_deref(), Some("Graduation"));
    assert_eq!(p.event_date.as_deref(), Some("2020-05-01"));
    assert_eq!(p.description, "Proud moment");
    assert_eq!(p.event_type, None);
  }

  #[test]
  fn labels_are_case_insensitive_and_accept_dash() {
    let p = plain("NAME - Wedding\ntype: milestone\npost - We did it");
    assert_eq!(p.title.as_deref(), Some("Wedding"));
    assert_eq!(p.event_type.as_deref(), Some("milestone"));
    assert_eq!(p.description, "We did it");
  }

  #[test]
  fn post_label_keeps_following_lines() {
    let p = plain("Name: Trip\nPost: Day one\nDay two\n\nDay three");
    assert_eq!(p.description, "Day one\nDay two\n\nDay three");
  }

  #[test]
  fn post_label_on_its_own_line_takes_the_body_below() {
    let p = plain("Post:\n  Body text  ");
    assert_eq!(p.description, "Body text");
  }

  #[test]
  fn unlabeled_text_is_the_description() {
    let p = plain("  Just a regular update.\nSecond line.  ");
    assert_eq!(p.description, "Just a regular update.\nSecond line.");
    assert_eq!(p.title, None);
  }

  #[test]
  fn labels_without_post_keep_the_whole_text() {
    let p = plain("Name: Party\nWe had fun");
    assert_eq!(p.title.as_deref(), Some("Party"));
    assert_eq!(p.description, "Name: Party\nWe had fun");
  }

  #[test]
  fn empty_text_falls_back_to_attachment_text() {
    let roots = vec![Attachment {
      kind: Some("album".into()),
      subattachments: Some(memoir_core::post::AttachmentList {
        data: vec![Attachment {
          title: Some("Nested title".into()),
          ..Default::default()
        }],
      }),
      ..Default::default()
    }];
    let p = structure("   ", None, &roots, None, None);
    assert_eq!(p.description, "Nested title");
  }

  #[test]
  fn primary_attachment_supplies_title_and_type() {
    let primary = Attachment {
      kind: Some("life_event".into()),
      title: Some("Started a new job".into()),
      ..Default::default()
    };
    let p = structure("So excited", Some("2021-01-01T00:00:00+0000"), &[], Some(&primary), None);
    assert_eq!(p.title.as_deref(), Some("Started a new job"));
    assert_eq!(p.event_type.as_deref(), Some("life_event"));
    assert_eq!(p.event_date.as_deref(), Some("2021-01-01T00:00:00+0000"));

    let labeled = structure("Name: Mine\nType: custom", None, &[], Some(&primary), None);
    assert_eq!(labeled.title.as_deref(), Some("Mine"));
    assert_eq!(labeled.event_type.as_deref(), Some("custom"));
  }

  #[test]
  fn place_is_appended_once() {
    let p = structure("Dinner out", None, &[], None, Some("Lisbon"));
    assert_eq!(p.description, "Dinner out\nLocation: Lisbon");

    let mentioned = structure("Dinner in lisbon", None, &[], None, Some("Lisbon"));
    assert_eq!(mentioned.description, "Dinner in lisbon");

    let empty = structure("", None, &[], None, Some("Lisbon"));
    assert_eq!(empty.description, "Location: Lisbon");
  }

  #[test]
  fn first_occurrence_of_a_label_wins() {
    let p = plain("Name: First\nName: Second");
    assert_eq!(p.title.as_deref(), Some("First"));
  }
}
