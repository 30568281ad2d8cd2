//! `redarc` — incrementally archive a subreddit into SQLite.
//!
//! # Usage
//!
//! ```text
//! redarc rust --sort top-week --num-posts 100
//! redarc --client-id ID --api-key KEY      # store credentials and exit
//! redarc --clear-credentials
//! ```
//!
//! Posts already in the database are skipped, so repeated runs only fetch
//! what is new. Ctrl-C stops the run; everything saved so far is kept.

mod credentials;
mod settings;

use std::{path::PathBuf, process::ExitCode};

use anyhow::Context as _;
use clap::Parser;
use redarc_core::{
  Error as CoreError, SourceError,
  archive::{self, RunSummary},
  sort::{PostLimit, SortSpec},
  traversal::TraversalOptions,
};
use redarc_reddit::RedditSource;
use redarc_store_sqlite::SqliteStore;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use credentials::{CredentialCache, PartialCredentials, prompt_stdin};
use settings::Overrides;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "redarc", author, version, about = "Archive a subreddit's posts and comments into SQLite")]
struct Cli {
  /// Subreddit to archive, without the `r/` prefix.
  #[arg(required_unless_present_any = ["clear_credentials", "client_id", "api_key", "user_agent"])]
  subreddit: Option<String>,

  /// Listing order: new, hot, top or controversial; the last two take a
  /// window, e.g. `top-week` (hour, day, week, month, year, all).
  #[arg(short, long)]
  sort: Option<String>,

  /// Maximum number of posts to archive; -1 runs until the listing ends.
  #[arg(short, long, allow_negative_numbers = true)]
  num_posts: Option<i64>,

  /// Archive posts only, without their comments.
  #[arg(long)]
  skip_comments: bool,

  /// Delete the cached credentials and exit.
  #[arg(long)]
  clear_credentials: bool,

  /// Reddit application client id; cached for later runs.
  #[arg(long)]
  client_id: Option<String>,

  /// Reddit application secret; cached for later runs.
  #[arg(long)]
  api_key: Option<String>,

  /// User agent sent to Reddit; cached for later runs.
  #[arg(long)]
  user_agent: Option<String>,

  /// SQLite database file.
  #[arg(long)]
  database: Option<PathBuf>,

  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "redarc.toml")]
  config: PathBuf,

  /// Increase log verbosity (-v info, -vv debug).
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse();

  let level = match cli.verbose {
    0 => LevelFilter::WARN,
    1 => LevelFilter::INFO,
    _ => LevelFilter::DEBUG,
  };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy(),
    )
    .init();

  match run(cli).await {
    Ok(code) => code,
    Err(e) => {
      eprintln!("error: {e:#}");
      ExitCode::FAILURE
    }
  }
}

fn forbidden() -> ExitCode {
  eprintln!(
    "error: Reddit refused access (403 Forbidden). Verify your client id, API key and \
     user agent, or reset them with --clear-credentials."
  );
  ExitCode::FAILURE
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
  info!("Program has started up.");
  let cache = CredentialCache::locate()?;

  if cli.clear_credentials {
    return Ok(if cache.clear()? {
      println!("Successfully cleared credentials cache.");
      ExitCode::SUCCESS
    } else {
      println!("Did not clear the credentials cache, as it did not exist.");
      ExitCode::FAILURE
    });
  }

  let settings = settings::load(&cli.config, Overrides {
    database:      cli.database,
    sort:          cli.sort,
    num_posts:     cli.num_posts,
    skip_comments: cli.skip_comments,
  })?;

  // Credentials given on the command line are stored, not used.
  let given = PartialCredentials {
    client_id:  cli.client_id,
    api_key:    cli.api_key,
    user_agent: cli.user_agent,
  };
  if !given.is_empty() {
    cache.resolve(given, None, prompt_stdin)?;
    println!("Successfully set new credentials.");
    return Ok(ExitCode::SUCCESS);
  }

  if cache.exists() {
    info!(path = %cache.path().display(), "using cached credentials");
  }
  let creds = cache.resolve(PartialCredentials::default(), settings.user_agent.clone(), prompt_stdin)?;
  info!("Got credentials.");

  let subreddit = cli.subreddit.context("a subreddit is required")?;
  let options = TraversalOptions {
    sort:                 settings.sort.parse::<SortSpec>()?,
    limit:                PostLimit::from_count(settings.num_posts)?,
    skip_comments:        settings.skip_comments,
    megathread_threshold: settings.megathread_comment_threshold,
  };

  let source = match RedditSource::connect(creds).await {
    Ok(source) => source,
    Err(SourceError::Forbidden) => return Ok(forbidden()),
    Err(e) => return Err(e).context("failed to authenticate with Reddit"),
  };

  let store = SqliteStore::open(&settings.database)
    .await
    .with_context(|| format!("failed to open database at {:?}", settings.database))?;
  info!(path = ?settings.database, "connected to database.");

  let mut summary = RunSummary::default();
  let outcome = tokio::select! {
    result = archive::run(&source, &store, &subreddit, options, &mut summary) => Some(result),
    _ = tokio::signal::ctrl_c() => None,
  };

  let code = match outcome {
    None => {
      info!("Keyboard interrupt.");
      println!("Exited.");
      ExitCode::SUCCESS
    }
    Some(Ok(())) => ExitCode::SUCCESS,
    Some(Err(CoreError::Forbidden)) => forbidden(),
    Some(Err(e)) => {
      eprintln!("error: {e}");
      ExitCode::FAILURE
    }
  };

  println!(
    "Finished writing to database: {} archived ({} comments), {} skipped, {} failed.",
    summary.archived, summary.comments, summary.skipped, summary.failed
  );
  Ok(code)
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory as _;

  use super::*;

  #[test]
  fn cli_is_well_formed() { Cli::command().debug_assert(); }

  #[test]
  fn unbounded_sentinel_parses() {
    let cli = Cli::try_parse_from(["redarc", "rust", "-n", "-1", "-s", "top-week"]).unwrap();
    assert_eq!(cli.subreddit.as_deref(), Some("rust"));
    assert_eq!(cli.num_posts, Some(-1));
    assert_eq!(cli.sort.as_deref(), Some("top-week"));
  }

  #[test]
  fn subreddit_required_for_a_run() {
    assert!(Cli::try_parse_from(["redarc"]).is_err());
    assert!(Cli::try_parse_from(["redarc", "--clear-credentials"]).is_ok());
    assert!(Cli::try_parse_from(["redarc", "--client-id", "abc"]).is_ok());
  }
}
