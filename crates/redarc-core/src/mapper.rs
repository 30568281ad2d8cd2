//! Conversion of raw source shapes into storage-ready records.

use chrono::{DateTime, Utc};

use crate::{
  record::{CommentRecord, PostRecord},
  source::{RawComment, RawPost},
};

/// Authors the source reports for removed or deleted accounts.
const MISSING_AUTHORS: &[&str] = &["", "[deleted]", "None"];

/// Convert fractional epoch seconds into a UTC timestamp. Out-of-range values
/// collapse to the epoch.
pub fn timestamp(secs: f64) -> DateTime<Utc> {
  let whole = secs.trunc();
  let nanos = ((secs - whole) * 1e9).round().clamp(0.0, 999_999_999.0) as u32;
  DateTime::from_timestamp(whole as i64, nanos).unwrap_or_default()
}

/// Map deleted or missing authors to `None`.
pub fn normalize_author(author: Option<String>) -> Option<String> {
  author.filter(|a| !MISSING_AUTHORS.contains(&a.as_str()))
}

pub fn post_record(raw: RawPost) -> PostRecord {
  let selftext = raw.selftext.filter(|t| raw.is_self || !t.is_empty());
  let url = match raw.url {
    Some(url) if !url.is_empty() => url,
    _ => raw.permalink,
  };

  PostRecord {
    reddit_id:     raw.name,
    author:        normalize_author(raw.author),
    created_utc:   timestamp(raw.created_utc),
    distinguished: raw.distinguished,
    edited:        raw.edited.is_edited(),
    locked:        raw.locked,
    num_comments:  raw.num_comments,
    over_18:       raw.over_18,
    selftext,
    is_textual:    raw.is_self,
    spoiler:       raw.spoiler,
    subreddit:     raw.subreddit,
    title:         raw.title,
    score:         raw.score,
    url,
    upvote_ratio:  raw.upvote_ratio,
  }
}

/// Map a comment found at nesting level `depth`. Replies are not carried
/// over; the flattener walks them separately.
pub fn comment_record(raw: RawComment, depth: u32) -> CommentRecord {
  if raw.depth.is_some_and(|d| d != depth) {
    tracing::debug!(
      comment = %raw.name,
      reported = ?raw.depth,
      depth,
      "source depth disagrees with nesting level"
    );
  }

  CommentRecord {
    reddit_id:     raw.name,
    parent_id:     raw.parent_id,
    author:        normalize_author(raw.author),
    body:          raw.body,
    created_utc:   timestamp(raw.created_utc),
    distinguished: raw.distinguished,
    edited:        raw.edited.is_edited(),
    saved:         raw.saved,
    stickied:      raw.stickied,
    depth,
    score:         raw.score,
    subreddit:     raw.subreddit,
  }
}
