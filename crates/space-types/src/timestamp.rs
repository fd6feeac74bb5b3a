use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

const EPOCH: &str = "1970-01-01T00:00:00.000000Z";

/// ISO 8601 timestamp kept in its wire form.
///
/// The string is what gets signed, so it is never re-rendered after parsing.
/// Ordering goes through [`Timestamp::cmp_instant`] because two spellings of
/// the same instant (`.000Z` vs `.000000Z`) are different strings.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn epoch() -> Self {
        Self(EPOCH.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parse(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.0)
            .ok()
            .map(|at| at.with_timezone(&Utc))
    }

    /// Compare by instant, falling back to string order when either side does
    /// not parse.
    pub fn cmp_instant(&self, other: &Timestamp) -> Ordering {
        match (self.parse(), other.parse()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.0.cmp(&other.0),
        }
    }

    pub fn is_older_than(&self, other: &Timestamp) -> bool {
        self.cmp_instant(other) == Ordering::Less
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::epoch()
    }
}

impl From<&str> for Timestamp {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Timestamp").field(&self.0).finish()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
