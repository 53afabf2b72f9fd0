// src/release/id.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

const FORMAT: &str = "%Y%m%d%H%M%S";
const WIDTH: usize = 14;

/// Release identifier: a fixed-width UTC timestamp without separators,
/// e.g. `20261018113500`.
///
/// Lexicographic order equals creation order, so sorting names sorts
/// releases.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReleaseId(String);

impl ReleaseId {
    /// Identifier for `now`, bumped past `newest` when the clock has not
    /// moved beyond it (same second, or a clock that went backwards).
    pub fn generate(now: DateTime<Utc>, newest: Option<&ReleaseId>) -> ReleaseId {
        let candidate = Self::from_time(now);
        match newest {
            Some(latest) if candidate <= *latest => match latest.timestamp() {
                Some(ts) => Self::from_time(ts + Duration::seconds(1)),
                None => candidate,
            },
            _ => candidate,
        }
    }

    pub fn from_time(at: DateTime<Utc>) -> ReleaseId {
        ReleaseId(at.format(FORMAT).to_string())
    }

    /// Accepts exactly 14 ASCII digits forming a valid timestamp.
    pub fn parse(s: &str) -> Option<ReleaseId> {
        if s.len() != WIDTH || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        NaiveDateTime::parse_from_str(s, FORMAT).ok()?;
        Some(ReleaseId(s.to_string()))
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.0, FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ReleaseId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReleaseId::parse(s).ok_or_else(|| format!("not a release identifier: {s}"))
    }
}
