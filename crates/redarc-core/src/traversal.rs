//! Listing traversal: pulls posts from a [`ContentSource`] listing, applies
//! the skip policy and the post limit, and fetches each accepted post's
//! comment tree.

use std::collections::HashSet;

use tracing::info;

use crate::{
  SourceError, flatten, mapper,
  record::ArchivedPost,
  sort::{PostLimit, SortSpec},
  source::{ContentSource, PostStream, RawPost, resolve_forest},
};

/// Stickied posts with at least this many comments are treated as
/// megathreads and skipped when comments are fetched.
pub const DEFAULT_MEGATHREAD_THRESHOLD: i64 = 50;

// ─── Options ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TraversalOptions {
  pub sort:                 SortSpec,
  pub limit:                PostLimit,
  /// Archive posts only; their comments are left out.
  pub skip_comments:        bool,
  pub megathread_threshold: i64,
}

impl Default for TraversalOptions {
  fn default() -> Self {
    Self {
      sort:                 SortSpec::default(),
      limit:                PostLimit::Unbounded,
      skip_comments:        false,
      megathread_threshold: DEFAULT_MEGATHREAD_THRESHOLD,
    }
  }
}

/// Why a candidate post was passed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
  AlreadyArchived,
  Megathread { num_comments: i64 },
}

// ─── Traversal ───────────────────────────────────────────────────────────────

/// A lazy, non-restartable sequence of [`ArchivedPost`]s.
pub struct Traversal<'a, S: ContentSource> {
  source:   &'a S,
  listing:  S::Listing,
  seen:     HashSet<String>,
  options:  TraversalOptions,
  accepted: u64,
  skipped:  u64,
  done:     bool,
}

impl<'a, S: ContentSource> Traversal<'a, S> {
  /// Start traversing `subreddit`. `archived` is the dedup set of post
  /// identifiers already in storage.
  pub fn new(
    source: &'a S,
    subreddit: &str,
    archived: HashSet<String>,
    options: TraversalOptions,
  ) -> Self {
    Self {
      source,
      listing: source.listing(subreddit, options.sort),
      seen: archived,
      options,
      accepted: 0,
      skipped: 0,
      done: false,
    }
  }

  pub fn accepted(&self) -> u64 { self.accepted }

  pub fn skipped(&self) -> u64 { self.skipped }

  /// The skip predicate, evaluated before a candidate counts towards the
  /// limit.
  pub fn skip_reason(&self, post: &RawPost) -> Option<SkipReason> {
    if self.seen.contains(&post.name) {
      return Some(SkipReason::AlreadyArchived);
    }
    if post.stickied
      && post.num_comments >= self.options.megathread_threshold
      && !self.options.skip_comments
    {
      return Some(SkipReason::Megathread { num_comments: post.num_comments });
    }
    None
  }

  /// Pull the next accepted post, with its comments unless they are skipped.
  ///
  /// Returns `Ok(None)` once the limit is reached or the listing runs dry.
  pub async fn next(&mut self) -> Result<Option<ArchivedPost>, SourceError> {
    while !self.done {
      if self.options.limit.is_reached(self.accepted) {
        self.done = true;
        break;
      }

      let Some(raw) = self.listing.next_post().await? else {
        self.done = true;
        break;
      };

      if let Some(reason) = self.skip_reason(&raw) {
        self.skipped += 1;
        match reason {
          SkipReason::AlreadyArchived => {
            info!(post = %raw.id, "skipping post, already archived");
          }
          SkipReason::Megathread { num_comments } => {
            info!(post = %raw.id, num_comments, "skipping stickied megathread");
          }
        }
        continue;
      }

      self.accepted += 1;
      info!(post = %raw.id, subreddit = %raw.subreddit, n = self.accepted, "found post");

      let comments = if self.options.skip_comments {
        None
      } else {
        let forest = self.source.comments(&raw).await?;
        let forest = resolve_forest(self.source, &raw, forest).await?;
        Some(flatten::flatten(forest))
      };

      self.seen.insert(raw.name.clone());
      return Ok(Some(ArchivedPost { post: mapper::post_record(raw), comments }));
    }

    Ok(None)
  }
}
