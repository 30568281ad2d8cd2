//! The content source abstraction and the raw shapes it hands out.
//!
//! Implemented by `redarc-reddit`. Pagination, authentication and transport
//! live behind [`ContentSource`]; the pipeline only pulls posts and comment
//! forests from it.

use std::{collections::VecDeque, future::Future, pin::Pin};

use serde::Deserialize;

use crate::{SourceError, sort::SortSpec};

// ─── Raw shapes ──────────────────────────────────────────────────────────────

/// The `edited` field is either `false` or the edit timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Edited {
  Flag(bool),
  At(f64),
}

impl Default for Edited {
  fn default() -> Self { Self::Flag(false) }
}

impl Edited {
  pub fn is_edited(self) -> bool {
    match self {
      Self::Flag(b) => b,
      Self::At(_) => true,
    }
  }
}

/// A post exactly as the source describes it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawPost {
  /// Short id, e.g. `abc123`.
  pub id:            String,
  /// Fullname, e.g. `t3_abc123`.
  pub name:          String,
  #[serde(default)]
  pub author:        Option<String>,
  pub created_utc:   f64,
  #[serde(default)]
  pub distinguished: Option<String>,
  #[serde(default)]
  pub edited:        Edited,
  #[serde(default)]
  pub locked:        bool,
  #[serde(default)]
  pub num_comments:  i64,
  #[serde(default)]
  pub over_18:       bool,
  #[serde(default)]
  pub selftext:      Option<String>,
  #[serde(default)]
  pub is_self:       bool,
  #[serde(default)]
  pub spoiler:       bool,
  #[serde(default)]
  pub stickied:      bool,
  pub subreddit:     String,
  pub title:         String,
  #[serde(default)]
  pub score:         i64,
  #[serde(default)]
  pub url:           Option<String>,
  #[serde(default)]
  pub permalink:     String,
  #[serde(default)]
  pub upvote_ratio:  Option<f64>,
}

/// A comment as the source describes it, with its replies attached.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawComment {
  pub id:            String,
  pub name:          String,
  #[serde(default)]
  pub author:        Option<String>,
  #[serde(default)]
  pub body:          Option<String>,
  pub created_utc:   f64,
  #[serde(default)]
  pub distinguished: Option<String>,
  #[serde(default)]
  pub edited:        Edited,
  #[serde(default)]
  pub parent_id:     Option<String>,
  #[serde(default)]
  pub saved:         bool,
  #[serde(default)]
  pub score:         i64,
  #[serde(default)]
  pub stickied:      bool,
  #[serde(default)]
  pub subreddit:     String,
  /// Depth as reported by the source, if any.
  #[serde(default)]
  pub depth:         Option<u32>,
  #[serde(skip)]
  pub replies:       Vec<CommentNode>,
}

/// A "load more" placeholder standing in for unfetched replies.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MoreMarker {
  pub id:        String,
  /// Fullname of the comment (or post) the hidden replies hang off.
  pub parent_id: String,
  /// Ids of the hidden comments. Empty for "continue this thread" markers.
  #[serde(default)]
  pub children:  Vec<String>,
  #[serde(default)]
  pub count:     i64,
  #[serde(default)]
  pub depth:     Option<u32>,
}

/// A node in a comment forest.
#[derive(Debug, Clone, PartialEq)]
pub enum CommentNode {
  Comment(RawComment),
  More(MoreMarker),
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// A lazily paginated listing of posts. Not restartable.
pub trait PostStream: Send {
  /// Pull the next post, fetching a new page when needed. `Ok(None)` marks
  /// the end of the listing.
  fn next_post(
    &mut self,
  ) -> impl Future<Output = Result<Option<RawPost>, SourceError>> + Send + '_;
}

/// Abstraction over the remote content source.
pub trait ContentSource: Send + Sync {
  type Listing: PostStream;

  /// Start a listing of `subreddit` in the given order.
  fn listing(&self, subreddit: &str, sort: SortSpec) -> Self::Listing;

  /// Fetch the comment forest of `post`. The forest may contain
  /// [`CommentNode::More`] markers at any level.
  fn comments<'a>(
    &'a self,
    post: &'a RawPost,
  ) -> impl Future<Output = Result<Vec<CommentNode>, SourceError>> + Send + 'a;

  /// Expand one continuation marker into the nodes it stands for. The result
  /// replaces the marker in place and may itself contain markers.
  fn expand<'a>(
    &'a self,
    post: &'a RawPost,
    marker: &'a MoreMarker,
  ) -> impl Future<Output = Result<Vec<CommentNode>, SourceError>> + Send + 'a;
}

// ─── Continuation resolution ─────────────────────────────────────────────────

type ResolveFuture<'a> =
  Pin<Box<dyn Future<Output = Result<Vec<CommentNode>, SourceError>> + Send + 'a>>;

/// Replace every continuation marker in `forest`, at any depth, with its
/// expansion until no marker is left. Sibling order is preserved: expanded
/// nodes take the marker's position.
pub fn resolve_forest<'a, S: ContentSource>(
  source: &'a S,
  post: &'a RawPost,
  forest: Vec<CommentNode>,
) -> ResolveFuture<'a> {
  Box::pin(async move {
    let mut pending: VecDeque<CommentNode> = forest.into();
    let mut resolved = Vec::with_capacity(pending.len());

    while let Some(node) = pending.pop_front() {
      match node {
        CommentNode::Comment(mut comment) => {
          let replies = std::mem::take(&mut comment.replies);
          if !replies.is_empty() {
            comment.replies = resolve_forest(source, post, replies).await?;
          }
          resolved.push(CommentNode::Comment(comment));
        }
        CommentNode::More(marker) => {
          tracing::debug!(post = %post.id, marker = %marker.id, count = marker.count, "expanding continuation");
          let expansion = source.expand(post, &marker).await?;
          for node in expansion.into_iter().rev() {
            pending.push_front(node);
          }
        }
      }
    }

    Ok(resolved)
  })
}
