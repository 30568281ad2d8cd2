//! In-memory fakes of [`ContentSource`] and [`ArchiveStore`] plus builders
//! for raw posts and comment forests.

use std::{
  collections::{HashMap, HashSet, VecDeque},
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use crate::{
  SourceError,
  record::ArchivedPost,
  sort::SortSpec,
  source::{CommentNode, ContentSource, Edited, MoreMarker, PostStream, RawComment, RawPost},
  store::ArchiveStore,
};

// ─── Builders ────────────────────────────────────────────────────────────────

/// A plain link post with short id `id` in r/test.
pub fn raw_post(id: &str) -> RawPost {
  RawPost {
    id:            id.to_owned(),
    name:          format!("t3_{id}"),
    author:        Some("poster".into()),
    created_utc:   1_700_000_000.0,
    distinguished: None,
    edited:        Edited::Flag(false),
    locked:        false,
    num_comments:  0,
    over_18:       false,
    selftext:      None,
    is_self:       false,
    spoiler:       false,
    stickied:      false,
    subreddit:     "test".into(),
    title:         format!("post {id}"),
    score:         1,
    url:           Some(format!("https://example.com/{id}")),
    permalink:     format!("/r/test/comments/{id}/"),
    upvote_ratio:  Some(1.0),
  }
}

/// A bare comment `t1_{id}` under `parent` with no replies.
pub fn raw_comment(id: &str, parent: &str) -> RawComment {
  RawComment {
    id:            id.to_owned(),
    name:          format!("t1_{id}"),
    author:        Some("commenter".into()),
    body:          Some(format!("body of {id}")),
    created_utc:   1_700_000_100.0,
    distinguished: None,
    edited:        Edited::Flag(false),
    parent_id:     Some(parent.to_owned()),
    saved:         false,
    score:         1,
    stickied:      false,
    subreddit:     "test".into(),
    depth:         None,
    replies:       Vec::new(),
  }
}

pub fn comment(id: &str, parent: &str, replies: Vec<CommentNode>) -> CommentNode {
  CommentNode::Comment(RawComment { replies, ..raw_comment(id, parent) })
}

pub fn more(id: &str, parent: &str, children: &[&str]) -> CommentNode {
  CommentNode::More(MoreMarker {
    id:        id.to_owned(),
    parent_id: parent.to_owned(),
    children:  children.iter().map(|c| (*c).to_owned()).collect(),
    count:     children.len() as i64,
    depth:     None,
  })
}

// ─── Source ──────────────────────────────────────────────────────────────────

/// A scripted content source.
#[derive(Debug, Default)]
pub struct FakeSource {
  posts:           Vec<RawPost>,
  /// Comment forest per short post id; posts without one have no comments.
  forests:         HashMap<String, Vec<CommentNode>>,
  /// Expansion per continuation marker id.
  expansions:      HashMap<String, Vec<CommentNode>>,
  forbidden_after: Option<usize>,
  pulled:          Arc<AtomicUsize>,
}

impl FakeSource {
  pub fn with_posts(posts: impl IntoIterator<Item = RawPost>) -> Self {
    Self { posts: posts.into_iter().collect(), ..Self::default() }
  }

  pub fn forest(mut self, post_id: &str, forest: Vec<CommentNode>) -> Self {
    self.forests.insert(post_id.to_owned(), forest);
    self
  }

  pub fn expansion(mut self, marker_id: &str, nodes: Vec<CommentNode>) -> Self {
    self.expansions.insert(marker_id.to_owned(), nodes);
    self
  }

  /// Answer `Forbidden` once `n` posts have been handed out.
  pub fn forbidden_after(mut self, n: usize) -> Self {
    self.forbidden_after = Some(n);
    self
  }

  /// Number of posts pulled from listings so far.
  pub fn pulled(&self) -> usize { self.pulled.load(Ordering::SeqCst) }
}

pub struct FakeListing {
  posts:           VecDeque<RawPost>,
  forbidden_after: Option<usize>,
  pulled:          Arc<AtomicUsize>,
}

impl PostStream for FakeListing {
  async fn next_post(&mut self) -> Result<Option<RawPost>, SourceError> {
    if self.forbidden_after.is_some_and(|n| self.pulled.load(Ordering::SeqCst) >= n) {
      return Err(SourceError::Forbidden);
    }
    let post = self.posts.pop_front();
    if post.is_some() {
      self.pulled.fetch_add(1, Ordering::SeqCst);
    }
    Ok(post)
  }
}

impl ContentSource for FakeSource {
  type Listing = FakeListing;

  fn listing(&self, _subreddit: &str, _sort: SortSpec) -> FakeListing {
    self.pulled.store(0, Ordering::SeqCst);
    FakeListing {
      posts:           self.posts.iter().cloned().collect(),
      forbidden_after: self.forbidden_after,
      pulled:          self.pulled.clone(),
    }
  }

  async fn comments(&self, post: &RawPost) -> Result<Vec<CommentNode>, SourceError> {
    Ok(self.forests.get(&post.id).cloned().unwrap_or_default())
  }

  async fn expand(
    &self,
    _post: &RawPost,
    marker: &MoreMarker,
  ) -> Result<Vec<CommentNode>, SourceError> {
    Ok(self.expansions.get(&marker.id).cloned().unwrap_or_default())
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("refusing to save {0}")]
pub struct MemoryStoreError(pub String);

/// An in-memory store that records save order and can be told to fail.
#[derive(Debug, Default)]
pub struct MemoryStore {
  posts:   Mutex<HashMap<String, ArchivedPost>>,
  order:   Mutex<Vec<String>>,
  fail_on: HashSet<String>,
}

impl MemoryStore {
  pub fn failing_on(mut self, post_id: &str) -> Self {
    self.fail_on.insert(post_id.to_owned());
    self
  }

  /// Post identifiers in the order they were saved.
  pub fn saved_order(&self) -> Vec<String> {
    self.order.lock().map(|o| o.clone()).unwrap_or_default()
  }
}

impl ArchiveStore for MemoryStore {
  type Error = MemoryStoreError;

  async fn archived_ids(&self) -> Result<HashSet<String>, MemoryStoreError> {
    let posts = self.posts.lock().map_err(|e| MemoryStoreError(e.to_string()))?;
    Ok(posts.keys().cloned().collect())
  }

  async fn save(&self, archived: &ArchivedPost) -> Result<(), MemoryStoreError> {
    let id = archived.post.reddit_id.clone();
    if self.fail_on.contains(&id) {
      return Err(MemoryStoreError(id));
    }
    let mut posts = self.posts.lock().map_err(|e| MemoryStoreError(e.to_string()))?;
    let mut order = self.order.lock().map_err(|e| MemoryStoreError(e.to_string()))?;
    posts.insert(id.clone(), archived.clone());
    order.push(id);
    Ok(())
  }
}
