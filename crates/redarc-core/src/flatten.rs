//! Comment tree flattening.
//!
//! Turns a resolved comment forest into a flat, pre-order list of records:
//! every comment is immediately followed by its whole subtree, siblings keep
//! the source's order, and each record's depth is its nesting level.

use tracing::debug;

use crate::{mapper, record::CommentRecord, source::CommentNode};

/// Flatten `forest`. Continuation markers still present are skipped.
pub fn flatten(forest: Vec<CommentNode>) -> Vec<CommentRecord> {
  let mut out = Vec::new();
  flatten_into(forest, 0, &mut out);
  out
}

fn flatten_into(nodes: Vec<CommentNode>, depth: u32, out: &mut Vec<CommentRecord>) {
  for node in nodes {
    match node {
      CommentNode::Comment(mut comment) => {
        let replies = std::mem::take(&mut comment.replies);
        out.push(mapper::comment_record(comment, depth));
        flatten_into(replies, depth + 1, out);
      }
      CommentNode::More(marker) => {
        debug!(marker = %marker.id, parent = %marker.parent_id, "skipped continuation marker");
      }
    }
  }
}

/// Group a pre-order list into levels by depth, keeping the list order inside
/// each level. Level `n` holds every comment of depth `n`.
pub fn levels(comments: &[CommentRecord]) -> Vec<Vec<&CommentRecord>> {
  let mut levels: Vec<Vec<&CommentRecord>> = Vec::new();
  for comment in comments {
    let depth = comment.depth as usize;
    if levels.len() <= depth {
      levels.resize_with(depth + 1, Vec::new);
    }
    levels[depth].push(comment);
  }
  levels
}
