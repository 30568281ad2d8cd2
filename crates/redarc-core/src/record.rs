//! Storage-ready records produced by the [`mapper`](crate::mapper).

use chrono::{DateTime, Utc};

/// A normalised post row.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
  /// Fullname (`t3_…`); primary key.
  pub reddit_id:     String,
  pub author:        Option<String>,
  pub created_utc:   DateTime<Utc>,
  pub distinguished: Option<String>,
  pub edited:        bool,
  pub locked:        bool,
  pub num_comments:  i64,
  pub over_18:       bool,
  pub selftext:      Option<String>,
  pub is_textual:    bool,
  pub spoiler:       bool,
  pub subreddit:     String,
  pub title:         String,
  pub score:         i64,
  /// Link target for link posts, permalink for self posts.
  pub url:           String,
  pub upvote_ratio:  Option<f64>,
}

/// A normalised comment row. The owning post is supplied at save time.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentRecord {
  /// Fullname (`t1_…`); primary key.
  pub reddit_id:     String,
  /// Fullname of the parent comment, or of the post for top-level comments.
  pub parent_id:     Option<String>,
  pub author:        Option<String>,
  pub body:          Option<String>,
  pub created_utc:   DateTime<Utc>,
  pub distinguished: Option<String>,
  pub edited:        bool,
  pub saved:         bool,
  pub stickied:      bool,
  /// Nesting level; 0 for top-level comments.
  pub depth:         u32,
  pub score:         i64,
  pub subreddit:     String,
}

/// One unit of work for the store: a post and, unless comments were skipped,
/// its flattened comment tree in pre-order.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivedPost {
  pub post:     PostRecord,
  pub comments: Option<Vec<CommentRecord>>,
}

impl ArchivedPost {
  pub fn comment_count(&self) -> usize { self.comments.as_ref().map_or(0, Vec::len) }
}
