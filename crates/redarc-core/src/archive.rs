//! The archive runner: drives a [`Traversal`] and hands every accepted post
//! to an [`ArchiveStore`].
//!
//! Posts are fetched and saved one at a time, in listing order. A failed save
//! is logged and the run moves on; a content-source failure ends the run.

use tracing::{error, info};

use crate::{
  Error, Result,
  source::ContentSource,
  store::ArchiveStore,
  traversal::{Traversal, TraversalOptions},
};

/// Counters for one run. Updated as the run progresses, so a caller that
/// abandons the run future (e.g. on Ctrl-C) still sees accurate numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
  pub archived: u64,
  pub skipped:  u64,
  pub failed:   u64,
  pub comments: u64,
}

/// Archive `subreddit` from `source` into `store`.
///
/// Returns `Err` only for fatal errors: a forbidden or failed content source,
/// or a store that cannot produce its dedup set.
pub async fn run<S, D>(
  source: &S,
  store: &D,
  subreddit: &str,
  options: TraversalOptions,
  summary: &mut RunSummary,
) -> Result<()>
where
  S: ContentSource,
  D: ArchiveStore,
{
  let archived = store
    .archived_ids()
    .await
    .map_err(|e| Error::Store(Box::new(e)))?;
  info!(count = archived.len(), "loaded archived post ids");

  let mut traversal = Traversal::new(source, subreddit, archived, options);

  loop {
    let next = traversal.next().await;
    summary.skipped = traversal.skipped();

    let Some(post) = next? else { break };

    let outcome = store.save(&post).await.map_err(|e| Error::Persist {
      post:   post.post.reddit_id.clone(),
      source: Box::new(e),
    });

    match outcome {
      Ok(()) => {
        summary.archived += 1;
        summary.comments += post.comment_count() as u64;
        info!(
          post = %post.post.reddit_id,
          comments = post.comment_count(),
          "saved post"
        );
      }
      Err(e) if !e.is_fatal() => {
        summary.failed += 1;
        error!(post = %post.post.reddit_id, error = %e, "database post saving error");
      }
      Err(e) => return Err(e),
    }
  }

  Ok(())
}
