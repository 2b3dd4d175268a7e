//! Walks over a post's attachment tree.
//!
//! The tree is walked iteratively with an explicit stack so a pathological
//! payload cannot blow the call stack; nodes deeper than [`MAX_DEPTH`] are
//! ignored.

use memoir_core::post::{Attachment, Post};

/// Depth of the deepest node visited; top-level attachments are depth 0.
pub const MAX_DEPTH: usize = 8;

/// Pre-order, depth-first iterator over an attachment forest.
pub struct Walk<'a> {
  stack: Vec<(usize, &'a Attachment)>,
}

impl<'a> Iterator for Walk<'a> {
  type Item = &'a Attachment;

  fn next(&mut self) -> Option<Self::Item> {
    let (depth, node) = self.stack.pop()?;
    if depth < MAX_DEPTH {
      self
        .stack
        .extend(node.children().iter().rev().map(|c| (depth + 1, c)));
    }
    Some(node)
  }
}

/// Visit `roots` and all their descendants in document order.
pub fn walk(roots: &[Attachment]) -> Walk<'_> {
  Walk { stack: roots.iter().rev().map(|a| (0, a)).collect() }
}

/// Top-level attachments and their direct children, in document order.
fn shallow(post: &Post) -> impl Iterator<Item = &Attachment> {
  post
    .attachments()
    .iter()
    .flat_map(|a| std::iter::once(a).chain(a.children()))
}

/// The attachment the structurer draws titles and types from: the first
/// life-event node among the top-level attachments and their direct children,
/// else the first top-level attachment.
pub fn primary(post: &Post) -> Option<&Attachment> {
  shallow(post)
    .find(|a| a.is_life_event())
    .or_else(|| post.attachments().first())
}

/// Whether the post is a life-event: its status type says so, or a top-level
/// attachment or one of that attachment's direct children is typed as one.
pub fn is_life_event(post: &Post) -> bool {
  let status = post
    .status_type
    .as_deref()
    .is_some_and(|s| s.to_ascii_lowercase().contains("life_event"));

  status || shallow(post).any(Attachment::is_life_event)
}

/// The first non-empty description (else title) found walking the tree.
pub fn first_text(roots: &[Attachment]) -> Option<&str> {
  walk(roots).find_map(|a| a.description_text().or_else(|| a.title_text()))
}

/// Every `media.image.src` in the tree, in visitation order, duplicates kept.
/// Falls back to the post's top-level picture when the tree has no images.
pub fn photo_urls(post: &Post) -> Vec<String> {
  let mut urls: Vec<String> = walk(post.attachments())
    .filter_map(Attachment::image_src)
    .map(str::to_owned)
    .collect();

  if urls.is_empty()
    && let Some(picture) = post
      .full_picture
      .as_deref()
      .map(str::trim)
      .filter(|p| !p.is_empty())
  {
    urls.push(picture.to_owned());
  }
  urls
}

// ─── Tests ────────────────────────────────────────────────────────────────────
