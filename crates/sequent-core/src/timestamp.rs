//! UTC instants for ledger events and claim expiries
//!
//! Every timestamp that leaves the process is UTC and serialized as
//! RFC-3339. Internally this wraps [`time::OffsetDateTime`].

use serde::{Deserialize, Serialize};
use std::fmt;
use time::{Duration, OffsetDateTime};

/// A UTC instant, RFC-3339 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);

impl Timestamp {
    /// The current instant.
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Wrap an existing instant, normalizing to UTC.
    pub fn from_odt(odt: OffsetDateTime) -> Self {
        Self(odt.to_offset(time::UtcOffset::UTC))
    }

    /// This instant shifted forward by `duration` (saturating).
    pub fn plus(&self, duration: Duration) -> Self {
        Self(self.0.checked_add(duration).unwrap_or(OffsetDateTime::new_utc(
            time::Date::MAX,
            time::Time::MIDNIGHT,
        )))
    }

    /// True if this instant lies strictly before `other`.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// The wrapped instant.
    pub fn as_odt(&self) -> OffsetDateTime {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.format(&time::format_description::well_known::Rfc3339) {
            Ok(text) => write!(f, "{text}"),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}
