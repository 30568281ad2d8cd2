//! SQL schema for the redarc SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Connection pragmas plus the full schema DDL; idempotent thanks to
/// `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA cache_size = -65536;
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Rows are fully overwritten whenever a post is archived again.
CREATE TABLE IF NOT EXISTS post (
    reddit_id     TEXT PRIMARY KEY CHECK (length(reddit_id) <= 15),
    author        TEXT,
    created_utc   TEXT NOT NULL,      -- RFC 3339 UTC
    distinguished TEXT,
    edited        INTEGER NOT NULL,
    locked        INTEGER NOT NULL,
    num_comments  INTEGER NOT NULL DEFAULT 0,
    over_18       INTEGER NOT NULL,
    selftext      TEXT,
    is_textual    INTEGER NOT NULL DEFAULT 0,
    spoiler       INTEGER NOT NULL,
    subreddit     TEXT NOT NULL,
    title         TEXT NOT NULL,
    score         INTEGER NOT NULL DEFAULT 0,
    url           TEXT NOT NULL,
    upvote_ratio  REAL
);

CREATE TABLE IF NOT EXISTS comment (
    reddit_id     TEXT PRIMARY KEY CHECK (length(reddit_id) <= 15),
    post          TEXT NOT NULL REFERENCES post(reddit_id),
    parent_id     TEXT CHECK (parent_id IS NULL OR length(parent_id) <= 15),
    author        TEXT,
    body          TEXT,
    created_utc   TEXT NOT NULL,
    distinguished TEXT,
    edited        INTEGER NOT NULL,
    saved         INTEGER NOT NULL DEFAULT 0,
    stickied      INTEGER NOT NULL DEFAULT 0,
    depth         INTEGER NOT NULL CHECK (depth >= 0),
    score         INTEGER NOT NULL DEFAULT 0,
    subreddit     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS comment_parent_idx ON comment(parent_id);
CREATE INDEX IF NOT EXISTS comment_post_idx   ON comment(post);

PRAGMA user_version = 1;
";

/// Insert a post, overwriting every column on primary-key conflict.
pub const UPSERT_POST: &str = "
INSERT INTO post (
    reddit_id, author, created_utc, distinguished, edited, locked,
    num_comments, over_18, selftext, is_textual, spoiler, subreddit,
    title, score, url, upvote_ratio
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
ON CONFLICT (reddit_id) DO UPDATE SET
    author        = excluded.author,
    created_utc   = excluded.created_utc,
    distinguished = excluded.distinguished,
    edited        = excluded.edited,
    locked        = excluded.locked,
    num_comments  = excluded.num_comments,
    over_18       = excluded.over_18,
    selftext      = excluded.selftext,
    is_textual    = excluded.is_textual,
    spoiler       = excluded.spoiler,
    subreddit     = excluded.subreddit,
    title         = excluded.title,
    score         = excluded.score,
    url           = excluded.url,
    upvote_ratio  = excluded.upvote_ratio
";

/// Insert a comment, overwriting every column on primary-key conflict.
pub const UPSERT_COMMENT: &str = "
INSERT INTO comment (
    reddit_id, post, parent_id, author, body, created_utc, distinguished,
    edited, saved, stickied, depth, score, subreddit
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
ON CONFLICT (reddit_id) DO UPDATE SET
    post          = excluded.post,
    parent_id     = excluded.parent_id,
    author        = excluded.author,
    body          = excluded.body,
    created_utc   = excluded.created_utc,
    distinguished = excluded.distinguished,
    edited        = excluded.edited,
    saved         = excluded.saved,
    stickied      = excluded.stickied,
    depth         = excluded.depth,
    score         = excluded.score,
    subreddit     = excluded.subreddit
";
