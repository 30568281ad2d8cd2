//! The `ArchiveStore` trait.
//!
//! Implemented by storage backends (e.g. `redarc-store-sqlite`). The runner
//! in [`archive`](crate::archive) depends on this abstraction only.

use std::{collections::HashSet, future::Future};

use crate::record::ArchivedPost;

pub trait ArchiveStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Identifiers of every post currently stored. Loaded once per run and
  /// used as the dedup set.
  fn archived_ids(
    &self,
  ) -> impl Future<Output = Result<HashSet<String>, Self::Error>> + Send + '_;

  /// Persist a post and its comments as one unit.
  ///
  /// Existing rows with the same identifiers are replaced wholesale. Either
  /// everything is written or, on error, nothing is.
  fn save<'a>(
    &'a self,
    archived: &'a ArchivedPost,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
