//! Loosely formatted upstream timestamps.
//!
//! The orders API reports dates as ISO-8601 text, but not always in the same
//! shape: some carry an offset, some are bare local date-times, and some are
//! plain dates. [`Timestamp`] accepts all three so that callers can ask for the
//! calendar day an order falls on in a given timezone.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};

/// A parsed ISO-8601 timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// A date-time with an explicit offset (e.g. `2024-03-01T10:00:00Z`).
    Zoned(DateTime<FixedOffset>),
    /// A date-time without offset, interpreted in the viewer's timezone.
    Naive(NaiveDateTime),
    /// A bare calendar date (e.g. `2024-03-01`).
    Date(NaiveDate),
}

impl Timestamp {
    /// Parse a timestamp, returning `None` for empty or unrecognized input.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(Self::Zoned(dt));
        }
        if let Ok(dt) = s.parse::<DateTime<FixedOffset>>() {
            return Some(Self::Zoned(dt));
        }
        if let Ok(dt) = s.parse::<NaiveDateTime>() {
            return Some(Self::Naive(dt));
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
            return Some(Self::Naive(dt));
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
            return Some(Self::Naive(dt));
        }
        s.parse::<NaiveDate>().ok().map(Self::Date)
    }

    /// Whether the input is a non-empty, parseable timestamp.
    #[must_use]
    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_some()
    }

    /// The calendar day this timestamp falls on, as seen from `tz`.
    ///
    /// Only zoned timestamps are shifted; naive date-times and bare dates are
    /// already expressed in the viewer's calendar.
    #[must_use]
    pub fn date_in<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        match self {
            Self::Zoned(dt) => dt.with_timezone(tz).date_naive(),
            Self::Naive(dt) => dt.date(),
            Self::Date(d) => *d,
        }
    }
}
