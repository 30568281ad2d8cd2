//! Layered run settings: defaults, then the optional TOML file, then
//! `REDARC_*` environment variables, then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use redarc_core::traversal::DEFAULT_MEGATHREAD_THRESHOLD;
use serde::Deserialize;

pub const DEFAULT_DATABASE: &str = "reddit-scraper.db";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  pub database:                     PathBuf,
  pub sort:                         String,
  /// `-1` for no limit.
  pub num_posts:                    i64,
  pub skip_comments:                bool,
  pub megathread_comment_threshold: i64,
  #[serde(default)]
  pub user_agent:                   Option<String>,
}

/// Flag values that override every other source when present.
#[derive(Debug, Default)]
pub struct Overrides {
  pub database:      Option<PathBuf>,
  pub sort:          Option<String>,
  pub num_posts:     Option<i64>,
  pub skip_comments: bool,
}

pub fn load(config_file: &Path, overrides: Overrides) -> anyhow::Result<Settings> {
  let settings = config::Config::builder()
    .set_default("database", DEFAULT_DATABASE)?
    .set_default("sort", "hot")?
    .set_default("num_posts", -1_i64)?
    .set_default("skip_comments", false)?
    .set_default("megathread_comment_threshold", DEFAULT_MEGATHREAD_THRESHOLD)?
    .add_source(config::File::from(config_file).required(false))
    .add_source(config::Environment::with_prefix("REDARC"))
    .set_override_option(
      "database",
      overrides.database.map(|p| p.to_string_lossy().into_owned()),
    )?
    .set_override_option("sort", overrides.sort)?
    .set_override_option("num_posts", overrides.num_posts)?
    .set_override_option("skip_comments", overrides.skip_comments.then_some(true))?
    .build()
    .context("failed to read config file")?;

  settings
    .try_deserialize()
    .context("failed to deserialise settings")
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  #[test]
  fn defaults_apply_without_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let s = load(&dir.path().join("absent.toml"), Overrides::default()).unwrap();
    assert_eq!(s.database, PathBuf::from(DEFAULT_DATABASE));
    assert_eq!(s.sort, "hot");
    assert_eq!(s.num_posts, -1);
    assert!(!s.skip_comments);
    assert_eq!(s.megathread_comment_threshold, 50);
  }

  #[test]
  fn file_is_read_and_flags_win() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("redarc.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "sort = \"top-week\"\nnum_posts = 25\nuser_agent = \"ua\"").unwrap();

    let s = load(&path, Overrides::default()).unwrap();
    assert_eq!(s.sort, "top-week");
    assert_eq!(s.num_posts, 25);
    assert_eq!(s.user_agent.as_deref(), Some("ua"));

    let s = load(&path, Overrides {
      num_posts: Some(3),
      skip_comments: true,
      ..Overrides::default()
    })
    .unwrap();
    assert_eq!(s.num_posts, 3);
    assert!(s.skip_comments);
    assert_eq!(s.sort, "top-week");
  }
}
