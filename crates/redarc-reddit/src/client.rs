//! Authenticated HTTP access to the Reddit API.

use std::{
  sync::{Arc, Mutex},
  time::{Duration, Instant},
};

use redarc_core::{
  SourceError,
  sort::SortSpec,
  source::{CommentNode, ContentSource, MoreMarker, RawPost},
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{listing::RedditListing, thing};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";

/// `/api/morechildren` accepts at most this many ids per call.
const MORE_CHILDREN_CHUNK: usize = 100;

/// Tokens are refreshed this long before Reddit says they expire.
const TOKEN_SLACK: Duration = Duration::from_secs(60);

// ─── Credentials ─────────────────────────────────────────────────────────────

/// Application credentials for a Reddit "script" or "web" app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
  pub client_id:  String,
  pub api_key:    String,
  pub user_agent: String,
}

// ─── Source ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TokenResponse {
  access_token: String,
  #[serde(default = "default_expiry")]
  expires_in:   u64,
}

fn default_expiry() -> u64 { 3600 }

struct Token {
  value:      String,
  expires_at: Instant,
}

struct Inner {
  http:        Client,
  credentials: Credentials,
  token:       Mutex<Option<Token>>,
}

/// A [`ContentSource`] backed by the Reddit API.
///
/// Cheap to clone — the inner [`reqwest::Client`] and token are shared.
#[derive(Clone)]
pub struct RedditSource {
  inner: Arc<Inner>,
}

fn transport(e: reqwest::Error) -> SourceError { SourceError::Transport(Box::new(e)) }

fn check_status(status: StatusCode, what: &str) -> Result<(), SourceError> {
  match status {
    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SourceError::Forbidden),
    s if s.is_success() => Ok(()),
    s => Err(SourceError::Transport(format!("{what} → {s}").into())),
  }
}

impl RedditSource {
  /// Build a source and fetch the first access token, so bad credentials
  /// surface before any listing is requested.
  pub async fn connect(credentials: Credentials) -> Result<Self, SourceError> {
    let http = Client::builder()
      .user_agent(credentials.user_agent.clone())
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(transport)?;

    let source = Self {
      inner: Arc::new(Inner { http, credentials, token: Mutex::new(None) }),
    };
    source.bearer().await?;
    Ok(source)
  }

  async fn fetch_token(&self) -> Result<Token, SourceError> {
    let creds = &self.inner.credentials;
    let resp = self
      .inner
      .http
      .post(TOKEN_URL)
      .basic_auth(&creds.client_id, Some(&creds.api_key))
      .form(&[("grant_type", "client_credentials")])
      .send()
      .await
      .map_err(transport)?;

    check_status(resp.status(), "POST /api/v1/access_token")?;
    let token: TokenResponse = resp
      .json()
      .await
      .map_err(|e| SourceError::Auth(e.to_string()))?;

    debug!(expires_in = token.expires_in, "obtained access token");
    Ok(Token {
      value:      token.access_token,
      expires_at: Instant::now() + Duration::from_secs(token.expires_in),
    })
  }

  /// A valid bearer token, refreshed when close to expiry.
  async fn bearer(&self) -> Result<String, SourceError> {
    {
      let guard = self
        .inner
        .token
        .lock()
        .map_err(|e| SourceError::Auth(e.to_string()))?;
      if let Some(token) = guard.as_ref()
        && token.expires_at > Instant::now() + TOKEN_SLACK
      {
        return Ok(token.value.clone());
      }
    }

    let token = self.fetch_token().await?;
    let value = token.value.clone();
    *self
      .inner
      .token
      .lock()
      .map_err(|e| SourceError::Auth(e.to_string()))? = Some(token);
    Ok(value)
  }

  /// `GET {API_BASE}{path}` with `query`, decoded as JSON.
  pub(crate) async fn get_json(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<Value, SourceError> {
    let bearer = self.bearer().await?;
    let resp = self
      .inner
      .http
      .get(format!("{API_BASE}{path}"))
      .bearer_auth(bearer)
      .query(query)
      .send()
      .await
      .map_err(transport)?;

    check_status(resp.status(), &format!("GET {path}"))?;
    resp
      .json()
      .await
      .map_err(|e| SourceError::Decode(format!("GET {path}: {e}")))
  }

  /// The raw comment page of `post`, optionally rooted at one comment.
  async fn comment_page(&self, post: &RawPost, focus: Option<&str>) -> Result<Value, SourceError> {
    let mut query = vec![("raw_json", "1".to_owned())];
    if let Some(comment) = focus {
      query.push(("comment", comment.to_owned()));
    }

    self.get_json(&format!("/comments/{}", post.id), &query).await
  }

  /// Fetch hidden comments by id through `/api/morechildren`.
  async fn more_children(
    &self,
    post: &RawPost,
    marker: &MoreMarker,
  ) -> Result<Vec<CommentNode>, SourceError> {
    let mut things = Vec::with_capacity(marker.children.len());

    for chunk in marker.children.chunks(MORE_CHILDREN_CHUNK) {
      let query = [
        ("api_type", "json".to_owned()),
        ("raw_json", "1".to_owned()),
        ("limit_children", "false".to_owned()),
        ("link_id", post.name.clone()),
        ("children", chunk.join(",")),
      ];
      let body = self.get_json("/api/morechildren", &query).await?;
      let batch = body
        .pointer("/json/data/things")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::Decode("morechildren without things".into()))?;
      things.extend(batch.iter().cloned());
    }

    thing::nest_things(things, &marker.parent_id)
  }
}

// ─── ContentSource impl ──────────────────────────────────────────────────────

impl ContentSource for RedditSource {
  type Listing = RedditListing;

  fn listing(&self, subreddit: &str, sort: SortSpec) -> RedditListing {
    RedditListing::new(self.clone(), subreddit, sort)
  }

  async fn comments(&self, post: &RawPost) -> Result<Vec<CommentNode>, SourceError> {
    thing::decode_comment_page(&self.comment_page(post, None).await?)
  }

  async fn expand(
    &self,
    post: &RawPost,
    marker: &MoreMarker,
  ) -> Result<Vec<CommentNode>, SourceError> {
    if !marker.children.is_empty() {
      return self.more_children(post, marker).await;
    }

    // "Continue this thread": re-fetch the parent comment's subtree.
    let Some(parent) = thing::continuation_parent(marker) else {
      return Ok(Vec::new());
    };
    let page = self.comment_page(post, Some(parent)).await?;
    thing::continued_replies(&page, parent)
  }
}
