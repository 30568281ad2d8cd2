//! Error types for `redarc-core`.

use thiserror::Error;

/// A failure reported by a [`ContentSource`](crate::source::ContentSource).
#[derive(Debug, Error)]
pub enum SourceError {
  /// The source refused the request (HTTP 401/403).
  #[error("forbidden")]
  Forbidden,

  #[error("authentication failed: {0}")]
  Auth(String),

  #[error("transport error: {0}")]
  Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("unexpected response shape: {0}")]
  Decode(String),
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(
    "the content source answered 403 Forbidden; verify your client id, API key \
     and user agent"
  )]
  Forbidden,

  #[error("content source error: {0}")]
  Source(#[source] SourceError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// Saving a single post (and its comments) failed; that post's transaction
  /// was rolled back.
  #[error("failed to persist post {post}: {source}")]
  Persist {
    post:   String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("invalid sort specification: {0:?}")]
  InvalidSort(String),

  #[error("invalid post limit: {0} (use -1 for no limit)")]
  InvalidLimit(i64),
}

impl Error {
  /// Whether this error must abort the run. Only per-post persistence
  /// failures are recoverable.
  pub fn is_fatal(&self) -> bool { !matches!(self, Self::Persist { .. }) }
}

impl From<SourceError> for Error {
  fn from(e: SourceError) -> Self {
    match e {
      SourceError::Forbidden => Self::Forbidden,
      other => Self::Source(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
