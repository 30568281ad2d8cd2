//! Listing sort specifications and the post-count limit.

use std::{fmt, str::FromStr};

use crate::Error;

// ─── Sort kind ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKind {
  New,
  Hot,
  Top,
  Controversial,
}

impl SortKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::New => "new",
      Self::Hot => "hot",
      Self::Top => "top",
      Self::Controversial => "controversial",
    }
  }

  /// Only `top` and `controversial` listings accept a time window.
  pub fn takes_window(self) -> bool { matches!(self, Self::Top | Self::Controversial) }
}

impl FromStr for SortKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Error> {
    match s {
      "new" => Ok(Self::New),
      "hot" => Ok(Self::Hot),
      "top" => Ok(Self::Top),
      "controversial" => Ok(Self::Controversial),
      other => Err(Error::InvalidSort(other.to_owned())),
    }
  }
}

// ─── Time window ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
  Hour,
  Day,
  Week,
  Month,
  Year,
  All,
}

impl TimeWindow {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Hour => "hour",
      Self::Day => "day",
      Self::Week => "week",
      Self::Month => "month",
      Self::Year => "year",
      Self::All => "all",
    }
  }
}

impl FromStr for TimeWindow {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Error> {
    match s {
      "hour" => Ok(Self::Hour),
      "day" => Ok(Self::Day),
      "week" => Ok(Self::Week),
      "month" => Ok(Self::Month),
      "year" => Ok(Self::Year),
      "all" => Ok(Self::All),
      other => Err(Error::InvalidSort(other.to_owned())),
    }
  }
}

// ─── Sort spec ───────────────────────────────────────────────────────────────

/// A listing order such as `hot`, `new` or `top-week`.
///
/// The textual form is split on its first and last hyphen: the part before
/// the first hyphen is the kind, the part after the last one the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
  pub kind:   SortKind,
  /// `None` leaves the window to the content source's default.
  pub window: Option<TimeWindow>,
}

impl SortSpec {
  pub const fn new(kind: SortKind) -> Self { Self { kind, window: None } }
}

impl Default for SortSpec {
  fn default() -> Self { Self::new(SortKind::Hot) }
}

impl FromStr for SortSpec {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Error> {
    let invalid = || Error::InvalidSort(s.to_owned());
    let s = s.trim();

    let (kind, window) = match (s.find('-'), s.rfind('-')) {
      (Some(first), Some(last)) => (&s[..first], Some(&s[last + 1..])),
      _ => (s, None),
    };

    let kind: SortKind = kind.to_ascii_lowercase().parse().map_err(|_| invalid())?;
    let window = window
      .map(|w| w.to_ascii_lowercase().parse::<TimeWindow>())
      .transpose()
      .map_err(|_| invalid())?;

    if window.is_some() && !kind.takes_window() {
      return Err(invalid());
    }

    Ok(Self { kind, window })
  }
}

impl fmt::Display for SortSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.window {
      Some(w) => write!(f, "{}-{}", self.kind.as_str(), w.as_str()),
      None => f.write_str(self.kind.as_str()),
    }
  }
}

// ─── Limit ───────────────────────────────────────────────────────────────────

/// Maximum number of accepted posts per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostLimit {
  Bounded(u64),
  /// Run until the listing is exhausted or the run is interrupted.
  #[default]
  Unbounded,
}

impl PostLimit {
  /// The command-line sentinel for [`PostLimit::Unbounded`].
  pub const UNBOUNDED_SENTINEL: i64 = -1;

  pub fn from_count(n: i64) -> Result<Self, Error> {
    match n {
      Self::UNBOUNDED_SENTINEL => Ok(Self::Unbounded),
      n if n < 0 => Err(Error::InvalidLimit(n)),
      n => Ok(Self::Bounded(n as u64)),
    }
  }

  /// Whether `accepted` posts already satisfy the limit.
  pub fn is_reached(self, accepted: u64) -> bool {
    match self {
      Self::Bounded(max) => accepted >= max,
      Self::Unbounded => false,
    }
  }
}
