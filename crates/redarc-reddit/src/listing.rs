//! Lazily paginated subreddit listings.

use std::collections::VecDeque;

use redarc_core::{
  SourceError,
  sort::SortSpec,
  source::{PostStream, RawPost},
};
use serde_json::Value;
use tracing::debug;

use crate::{RedditSource, thing};

/// Posts per listing page; Reddit's maximum.
const PAGE_SIZE: &str = "100";

/// Paging state: posts buffered from the last page and the cursor to the
/// next one.
#[derive(Debug, Default)]
struct Pages {
  buffer:    VecDeque<RawPost>,
  after:     Option<String>,
  exhausted: bool,
}

impl Pages {
  /// Take in one decoded listing page. The listing is exhausted once Reddit
  /// returns no `after` cursor or an empty page.
  fn absorb(&mut self, page: &Value) -> Result<usize, SourceError> {
    let (posts, after) = thing::decode_listing(page)?;
    let count = posts.len();
    self.exhausted = after.is_none() || posts.is_empty();
    self.after = after;
    self.buffer.extend(posts);
    Ok(count)
  }

  /// Whether another page has to be fetched before the next post.
  fn wants_page(&self) -> bool { self.buffer.is_empty() && !self.exhausted }
}

/// A subreddit listing that fetches the next page only when the buffered one
/// runs out.
pub struct RedditListing {
  source: RedditSource,
  path:   String,
  sort:   SortSpec,
  pages:  Pages,
}

impl RedditListing {
  pub(crate) fn new(source: RedditSource, subreddit: &str, sort: SortSpec) -> Self {
    let subreddit = subreddit.trim().trim_start_matches("/r/").trim_start_matches("r/");
    Self {
      source,
      path: format!("/r/{subreddit}/{}", sort.kind.as_str()),
      sort,
      pages: Pages::default(),
    }
  }

  async fn fetch_page(&mut self) -> Result<(), SourceError> {
    let mut query = vec![("limit", PAGE_SIZE.to_owned()), ("raw_json", "1".to_owned())];
    if let Some(window) = self.sort.window {
      query.push(("t", window.as_str().to_owned()));
    }
    if let Some(after) = &self.pages.after {
      query.push(("after", after.clone()));
    }

    let body = self.source.get_json(&self.path, &query).await?;
    let posts = self.pages.absorb(&body)?;
    debug!(path = %self.path, posts, after = ?self.pages.after, "fetched listing page");
    Ok(())
  }
}

impl PostStream for RedditListing {
  async fn next_post(&mut self) -> Result<Option<RawPost>, SourceError> {
    while self.pages.wants_page() {
      self.fetch_page().await?;
    }
    Ok(self.pages.buffer.pop_front())
  }
}
