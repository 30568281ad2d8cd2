//! Encoding and decoding helpers between the core records and their SQLite
//! columns.
//!
//! Timestamps are stored as RFC 3339 strings. Booleans are stored as
//! integers by rusqlite.

use chrono::{DateTime, Utc};
use redarc_core::record::{CommentRecord, PostRecord};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row → record ────────────────────────────────────────────────────────────

/// A `post` row as read from SQLite, before timestamp decoding.
pub struct RawPostRow {
  pub reddit_id:     String,
  pub author:        Option<String>,
  pub created_utc:   String,
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
  pub url:           String,
  pub upvote_ratio:  Option<f64>,
}

pub const POST_COLUMNS: &str = "reddit_id, author, created_utc, distinguished, edited, \
  locked, num_comments, over_18, selftext, is_textual, spoiler, subreddit, title, score, \
  url, upvote_ratio";

impl RawPostRow {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      reddit_id:     row.get(0)?,
      author:        row.get(1)?,
      created_utc:   row.get(2)?,
      distinguished: row.get(3)?,
      edited:        row.get(4)?,
      locked:        row.get(5)?,
      num_comments:  row.get(6)?,
      over_18:       row.get(7)?,
      selftext:      row.get(8)?,
      is_textual:    row.get(9)?,
      spoiler:       row.get(10)?,
      subreddit:     row.get(11)?,
      title:         row.get(12)?,
      score:         row.get(13)?,
      url:           row.get(14)?,
      upvote_ratio:  row.get(15)?,
    })
  }

  pub fn into_record(self) -> Result<PostRecord> {
    Ok(PostRecord {
      reddit_id:     self.reddit_id,
      author:        self.author,
      created_utc:   decode_dt(&self.created_utc)?,
      distinguished: self.distinguished,
      edited:        self.edited,
      locked:        self.locked,
      num_comments:  self.num_comments,
      over_18:       self.over_18,
      selftext:      self.selftext,
      is_textual:    self.is_textual,
      spoiler:       self.spoiler,
      subreddit:     self.subreddit,
      title:         self.title,
      score:         self.score,
      url:           self.url,
      upvote_ratio:  self.upvote_ratio,
    })
  }
}

/// A `comment` row as read from SQLite, without its `post` column.
pub struct RawCommentRow {
  pub reddit_id:     String,
  pub parent_id:     Option<String>,
  pub author:        Option<String>,
  pub body:          Option<String>,
  pub created_utc:   String,
  pub distinguished: Option<String>,
  pub edited:        bool,
  pub saved:         bool,
  pub stickied:      bool,
  pub depth:         u32,
  pub score:         i64,
  pub subreddit:     String,
}

pub const COMMENT_COLUMNS: &str = "reddit_id, parent_id, author, body, created_utc, \
  distinguished, edited, saved, stickied, depth, score, subreddit";

impl RawCommentRow {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      reddit_id:     row.get(0)?,
      parent_id:     row.get(1)?,
      author:        row.get(2)?,
      body:          row.get(3)?,
      created_utc:   row.get(4)?,
      distinguished: row.get(5)?,
      edited:        row.get(6)?,
      saved:         row.get(7)?,
      stickied:      row.get(8)?,
      depth:         row.get(9)?,
      score:         row.get(10)?,
      subreddit:     row.get(11)?,
    })
  }

  pub fn into_record(self) -> Result<CommentRecord> {
    Ok(CommentRecord {
      reddit_id:     self.reddit_id,
      parent_id:     self.parent_id,
      author:        self.author,
      body:          self.body,
      created_utc:   decode_dt(&self.created_utc)?,
      distinguished: self.distinguished,
      edited:        self.edited,
      saved:         self.saved,
      stickied:      self.stickied,
      depth:         self.depth,
      score:         self.score,
      subreddit:     self.subreddit,
    })
  }
}
