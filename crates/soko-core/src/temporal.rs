//! # Temporal Types
//!
//! UTC-only timestamp type for the dispute engine. All timestamps are
//! stored in UTC; serialized form is ISO 8601 with a `Z` suffix.
//!
//! ## Design Decision
//!
//! Buyers, sellers, and admins sit in different time zones. To keep
//! deadline arithmetic and the audit trail unambiguous, every timestamp in
//! the engine is UTC. Local time conversion is a presentation concern
//! handled by the surrounding application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A UTC timestamp.
///
/// Serializes to ISO 8601 with a `Z` suffix (e.g. `2026-08-01T12:00:00Z`);
/// the canonical string form truncates to second precision.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp representing the current UTC time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Access the underlying `chrono::DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// The elapsed duration from this timestamp to `now`.
    ///
    /// Negative when `now` precedes the timestamp; callers compare against
    /// policy windows and never assume a non-negative age.
    pub fn elapsed(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.0
    }

    /// Return the timestamp as an ISO 8601 string with Z suffix,
    /// truncated to seconds.
    pub fn to_canonical_string(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn fixed() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-08-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn canonical_string_truncates_to_seconds() {
        let dt = fixed() + Duration::milliseconds(750);
        let ts = Timestamp::from_datetime(dt);
        assert_eq!(ts.to_canonical_string(), "2026-08-01T12:00:00Z");
    }

    #[test]
    fn display_matches_canonical() {
        let ts = Timestamp::from_datetime(fixed());
        assert_eq!(ts.to_string(), ts.to_canonical_string());
    }

    #[test]
    fn elapsed_is_signed() {
        let ts = Timestamp::from_datetime(fixed());
        assert_eq!(ts.elapsed(fixed() + Duration::days(7)), Duration::days(7));
        assert_eq!(ts.elapsed(fixed() - Duration::hours(1)), Duration::hours(-1));
    }

    #[test]
    fn ordering_follows_time() {
        let a = Timestamp::from_datetime(fixed());
        let b = Timestamp::from_datetime(fixed() + Duration::seconds(1));
        assert!(a < b);
    }

    #[test]
    fn from_datetime_roundtrip() {
        let dt = fixed();
        let ts: Timestamp = dt.into();
        assert_eq!(*ts.as_datetime(), dt);
    }
}
