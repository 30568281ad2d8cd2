//! Core types and the archival pipeline for redarc.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! content source (`redarc-reddit`) and the storage backend
//! (`redarc-store-sqlite`) plug in through the [`source::ContentSource`] and
//! [`store::ArchiveStore`] traits.

// Native `async fn` in traits; the futures are bounded `Send` explicitly.
#![allow(async_fn_in_trait)]

pub mod archive;
pub mod error;
pub mod flatten;
pub mod mapper;
pub mod record;
pub mod sort;
pub mod source;
pub mod store;
pub mod traversal;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{Error, Result, SourceError};
