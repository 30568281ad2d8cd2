//! Reddit content source for redarc.
//!
//! Implements [`redarc_core::source::ContentSource`] over Reddit's OAuth JSON
//! API with application-only authentication. Pagination and continuation
//! expansion happen here; retries and rate limiting do not.

mod client;
mod listing;
mod thing;

pub use client::{Credentials, RedditSource};
pub use listing::RedditListing;
pub use thing::{
  continuation_parent, continued_replies, decode_comment_page, decode_forest, decode_listing,
  nest_things,
};
