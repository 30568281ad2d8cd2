//! [`SqliteStore`] — the SQLite implementation of [`ArchiveStore`].

use std::{collections::HashSet, path::Path};

use rusqlite::OptionalExtension as _;
use tracing::debug;

use redarc_core::{
  flatten,
  record::{ArchivedPost, CommentRecord, PostRecord},
  store::ArchiveStore,
};

use crate::{
  Result,
  encode::{COMMENT_COLUMNS, POST_COLUMNS, RawCommentRow, RawPostRow, encode_dt},
  schema::{SCHEMA, UPSERT_COMMENT, UPSERT_POST},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An archive backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) an archive at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory archive — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  #[cfg(test)]
  pub(crate) fn conn_for_tests(&self) -> &tokio_rusqlite::Connection { &self.conn }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub async fn post_count(&self) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM post", [], |r| r.get(0))?))
      .await?;
    Ok(n as u64)
  }

  pub async fn comment_count(&self) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM comment", [], |r| r.get(0))?))
      .await?;
    Ok(n as u64)
  }

  /// Fetch a post by identifier. Returns `None` if it was never archived.
  pub async fn get_post(&self, reddit_id: &str) -> Result<Option<PostRecord>> {
    let id = reddit_id.to_owned();

    let raw: Option<RawPostRow> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {POST_COLUMNS} FROM post WHERE reddit_id = ?1"),
              rusqlite::params![id],
              RawPostRow::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPostRow::into_record).transpose()
  }

  /// All comments belonging to `post`, ordered by depth then identifier.
  pub async fn comments_for(&self, post: &str) -> Result<Vec<CommentRecord>> {
    let post = post.to_owned();

    let raws: Vec<RawCommentRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMMENT_COLUMNS} FROM comment WHERE post = ?1 ORDER BY depth, reddit_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![post], RawCommentRow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCommentRow::into_record).collect()
  }
}

// ─── Writes ──────────────────────────────────────────────────────────────────

fn upsert_post(tx: &rusqlite::Transaction<'_>, post: &PostRecord) -> rusqlite::Result<()> {
  tx.execute(
    UPSERT_POST,
    rusqlite::params![
      post.reddit_id,
      post.author,
      encode_dt(post.created_utc),
      post.distinguished,
      post.edited,
      post.locked,
      post.num_comments,
      post.over_18,
      post.selftext,
      post.is_textual,
      post.spoiler,
      post.subreddit,
      post.title,
      post.score,
      post.url,
      post.upvote_ratio,
    ],
  )?;
  Ok(())
}

/// Upsert one tree level. Every comment is bound to `post`.
fn upsert_comments(
  tx: &rusqlite::Transaction<'_>,
  post: &str,
  level: &[CommentRecord],
) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare_cached(UPSERT_COMMENT)?;
  for comment in level {
    debug!(post, comment = %comment.reddit_id, "saving comment");
    stmt.execute(rusqlite::params![
      comment.reddit_id,
      post,
      comment.parent_id,
      comment.author,
      comment.body,
      encode_dt(comment.created_utc),
      comment.distinguished,
      comment.edited,
      comment.saved,
      comment.stickied,
      comment.depth,
      comment.score,
      comment.subreddit,
    ])?;
  }
  Ok(())
}

// ─── ArchiveStore impl ───────────────────────────────────────────────────────

impl ArchiveStore for SqliteStore {
  type Error = crate::Error;

  async fn archived_ids(&self) -> Result<HashSet<String>> {
    let ids = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT reddit_id FROM post")?;
        let ids = stmt
          .query_map([], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(ids)
      })
      .await?;
    Ok(ids)
  }

  /// The post and every comment level are written in one transaction; any
  /// failure rolls the whole post back.
  async fn save(&self, archived: &ArchivedPost) -> Result<()> {
    let post = archived.post.clone();
    // Level-by-level: every depth-n comment is written before any depth n+1.
    let levels: Vec<Vec<CommentRecord>> = archived
      .comments
      .as_deref()
      .map(flatten::levels)
      .unwrap_or_default()
      .into_iter()
      .map(|level| level.into_iter().cloned().collect())
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        debug!(post = %post.reddit_id, "saving post");
        upsert_post(&tx, &post)?;
        for level in &levels {
          upsert_comments(&tx, &post.reddit_id, level)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(())
  }
}
