//! The credential cache.
//!
//! Credentials live in `credentials.toml` inside the platform data directory.
//! Each field is taken from the command line, else from the cache, else
//! asked for on stdin; the resolved set is written back when it differs from
//! what was cached.

use std::{
  fs,
  io::{self, BufRead, Write},
  path::{Path, PathBuf},
};

use anyhow::{Context as _, anyhow};
use directories::ProjectDirs;
use redarc_reddit::Credentials;
use serde::Deserialize;

pub const DEFAULT_USER_AGENT: &str = concat!(
  "redarc/",
  env!("CARGO_PKG_VERSION"),
  " (subreddit archiver; written in Rust)"
);

/// A possibly incomplete set of credentials, as cached or as passed on the
/// command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PartialCredentials {
  pub client_id:  Option<String>,
  pub api_key:    Option<String>,
  pub user_agent: Option<String>,
}

impl PartialCredentials {
  pub fn is_empty(&self) -> bool {
    self.client_id.is_none() && self.api_key.is_none() && self.user_agent.is_none()
  }

  /// Fields set in `self` win over those in `fallback`.
  fn or(self, fallback: Self) -> Self {
    Self {
      client_id:  self.client_id.or(fallback.client_id),
      api_key:    self.api_key.or(fallback.api_key),
      user_agent: self.user_agent.or(fallback.user_agent),
    }
  }

  fn matches(&self, creds: &Credentials) -> bool {
    self.client_id.as_deref() == Some(creds.client_id.as_str())
      && self.api_key.as_deref() == Some(creds.api_key.as_str())
      && self.user_agent.as_deref() == Some(creds.user_agent.as_str())
  }
}

pub struct CredentialCache {
  path: PathBuf,
}

impl CredentialCache {
  /// The cache in the platform data directory.
  pub fn locate() -> anyhow::Result<Self> {
    let dirs = ProjectDirs::from("", "redarc", "redarc")
      .ok_or_else(|| anyhow!("could not determine a data directory"))?;
    Ok(Self::at(dirs.data_dir().join("credentials.toml")))
  }

  pub fn at(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

  pub fn path(&self) -> &Path { &self.path }

  pub fn exists(&self) -> bool { self.path.exists() }

  pub fn load(&self) -> anyhow::Result<PartialCredentials> {
    if !self.exists() {
      return Ok(PartialCredentials::default());
    }
    let raw = fs::read_to_string(&self.path)
      .with_context(|| format!("reading {}", self.path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing {}", self.path.display()))
  }

  pub fn save(&self, creds: &Credentials) -> anyhow::Result<()> {
    if let Some(dir) = self.path.parent() {
      fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let raw = toml::to_string(creds).context("serialising credentials")?;
    fs::write(&self.path, raw).with_context(|| format!("writing {}", self.path.display()))
  }

  /// Delete the cache. Returns `false` if there was nothing to delete.
  pub fn clear(&self) -> anyhow::Result<bool> {
    if !self.exists() {
      return Ok(false);
    }
    fs::remove_file(&self.path).with_context(|| format!("removing {}", self.path.display()))?;
    Ok(true)
  }

  /// Merge `given` over the cache, prompt for anything still missing and
  /// store the result if it changed.
  ///
  /// `fallback_agent` (from settings) is used only when neither `given` nor
  /// the cache has a user agent.
  pub fn resolve(
    &self,
    given: PartialCredentials,
    fallback_agent: Option<String>,
    mut prompt: impl FnMut(&str) -> anyhow::Result<String>,
  ) -> anyhow::Result<Credentials> {
    let cached = self.load()?;
    let merged = given.or(cached.clone());

    let client_id = match merged.client_id {
      Some(id) => id,
      None => prompt("client_id")?,
    };
    let api_key = match merged.api_key {
      Some(key) => key,
      None => prompt("api_key")?,
    };
    let user_agent = merged
      .user_agent
      .or(fallback_agent)
      .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());

    let creds = Credentials { client_id, api_key, user_agent };
    if !cached.matches(&creds) {
      self.save(&creds)?;
    }
    Ok(creds)
  }
}

/// Read one credential field from stdin.
pub fn prompt_stdin(field: &str) -> anyhow::Result<String> {
  print!("{field} not provided in args and not found in cache. Enter {field}: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  let value = line.trim().to_owned();
  if value.is_empty() {
    return Err(anyhow!("no {field} given"));
  }
  Ok(value)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cache() -> (tempfile::TempDir, CredentialCache) {
    let dir = tempfile::tempdir().unwrap();
    let cache = CredentialCache::at(dir.path().join("nested").join("credentials.toml"));
    (dir, cache)
  }

  fn no_prompt(field: &str) -> anyhow::Result<String> {
    panic!("unexpected prompt for {field}")
  }

  #[test]
  fn given_fields_are_cached_for_next_time() {
    let (_dir, cache) = cache();
    let given = PartialCredentials {
      client_id: Some("id".into()),
      api_key:   Some("key".into()),
      ..Default::default()
    };

    let creds = cache.resolve(given, None, no_prompt).unwrap();
    assert_eq!(creds.user_agent, DEFAULT_USER_AGENT);
    assert!(cache.exists());

    let again = cache.resolve(PartialCredentials::default(), None, no_prompt).unwrap();
    assert_eq!(again, creds);
  }

  #[test]
  fn flags_override_cached_values() {
    let (_dir, cache) = cache();
    cache
      .save(&Credentials { client_id: "old".into(), api_key: "k".into(), user_agent: "ua".into() })
      .unwrap();

    let given = PartialCredentials { client_id: Some("new".into()), ..Default::default() };
    let creds = cache.resolve(given, None, no_prompt).unwrap();
    assert_eq!(creds.client_id, "new");
    assert_eq!(creds.api_key, "k");
    assert_eq!(creds.user_agent, "ua");
  }

  #[test]
  fn missing_fields_are_prompted_for() {
    let (_dir, cache) = cache();
    let mut asked = Vec::new();
    let creds = cache
      .resolve(PartialCredentials::default(), None, |field| {
        asked.push(field.to_owned());
        Ok(format!("typed-{field}"))
      })
      .unwrap();

    assert_eq!(asked, ["client_id", "api_key"]);
    assert_eq!(creds.client_id, "typed-client_id");
    assert_eq!(creds.api_key, "typed-api_key");
  }

  #[test]
  fn configured_agent_does_not_replace_the_cached_one() {
    let (_dir, cache) = cache();
    cache
      .save(&Credentials { client_id: "a".into(), api_key: "b".into(), user_agent: "ua".into() })
      .unwrap();
    let before = fs::read_to_string(cache.path()).unwrap();

    let creds = cache
      .resolve(PartialCredentials::default(), Some("from-config".into()), no_prompt)
      .unwrap();
    assert_eq!(creds.user_agent, "ua");
    assert_eq!(fs::read_to_string(cache.path()).unwrap(), before);
  }

  #[test]
  fn configured_agent_fills_a_cache_without_one() {
    let (_dir, cache) = cache();
    fs::create_dir_all(cache.path().parent().unwrap()).unwrap();
    fs::write(cache.path(), "client_id = \"a\"\napi_key = \"b\"\n").unwrap();

    let creds = cache
      .resolve(PartialCredentials::default(), Some("from-config".into()), no_prompt)
      .unwrap();
    assert_eq!(creds.user_agent, "from-config");
  }

  #[test]
  fn unchanged_credentials_are_not_rewritten() {
    let (_dir, cache) = cache();
    fs::create_dir_all(cache.path().parent().unwrap()).unwrap();
    let hand_written = "# mine\nclient_id = \"a\"\napi_key = \"b\"\nuser_agent = \"ua\"\n";
    fs::write(cache.path(), hand_written).unwrap();

    cache.resolve(PartialCredentials::default(), None, no_prompt).unwrap();
    assert_eq!(fs::read_to_string(cache.path()).unwrap(), hand_written);
  }

  #[test]
  fn clear_reports_whether_anything_was_removed() {
    let (_dir, cache) = cache();
    assert!(!cache.clear().unwrap());
    cache
      .save(&Credentials { client_id: "a".into(), api_key: "b".into(), user_agent: "c".into() })
      .unwrap();
    assert!(cache.clear().unwrap());
    assert!(!cache.exists());
  }
}
