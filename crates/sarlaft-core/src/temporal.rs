//! # Temporal Types — UTC-Only Timestamps
//!
//! Defines [`Timestamp`], a UTC-only timestamp truncated to seconds
//! precision, rendered as ISO8601 with a `Z` suffix.
//!
//! ## Invariant
//!
//! Every timestamp that enters the audit ledger must produce the same
//! canonical byte sequence no matter which process serialized it. Local
//! offsets and sub-second precision would break that, so both are rejected
//! or truncated at construction — there is no silent conversion ambiguity
//! in the digest path.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RulesError;

/// A UTC-only timestamp, truncated to seconds precision.
///
/// # Construction
///
/// - [`Timestamp::now()`] — current UTC time, truncated.
/// - [`Timestamp::from_utc()`] — from a `DateTime<Utc>`, truncating sub-seconds.
/// - [`Timestamp::parse()`] — from an ISO8601 string; only `Z`-suffixed
///   strings are accepted.
/// - [`Timestamp::parse_lenient()`] — accepts any RFC 3339 offset and
///   converts to UTC; for ingesting query parameters, never for evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Wrap a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse an ISO8601 timestamp, rejecting anything that is not UTC with
    /// a `Z` suffix — including `+00:00`, which is semantically equivalent
    /// but byte-distinct.
    pub fn parse(s: &str) -> Result<Self, RulesError> {
        if !s.ends_with('Z') {
            return Err(RulesError::Validation(format!(
                "timestamp must be UTC with Z suffix, got: {s:?}"
            )));
        }
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| {
            RulesError::Validation(format!("invalid RFC 3339 timestamp {s:?}: {e}"))
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Parse an RFC 3339 timestamp with any offset, converting to UTC.
    pub fn parse_lenient(s: &str) -> Result<Self, RulesError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| {
            RulesError::Validation(format!("invalid RFC 3339 timestamp {s:?}: {e}"))
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Unix epoch seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Render as `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

/// Discard nanoseconds.
fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_has_no_subseconds() {
        assert_eq!(Timestamp::now().as_datetime().nanosecond(), 0);
    }

    #[test]
    fn test_from_utc_truncates_and_formats() {
        let dt = Utc
            .with_ymd_and_hms(2026, 3, 9, 14, 30, 45)
            .unwrap()
            .with_nanosecond(987_654_321)
            .unwrap();
        let ts = Timestamp::from_utc(dt);
        assert_eq!(ts.to_iso8601(), "2026-03-09T14:30:45Z");
        assert_eq!(ts.to_string(), ts.to_iso8601());
    }

    #[test]
    fn test_parse_requires_z_suffix() {
        assert!(Timestamp::parse("2026-03-09T14:30:45Z").is_ok());
        assert!(Timestamp::parse("2026-03-09T14:30:45+00:00").is_err());
        assert!(Timestamp::parse("2026-03-09T09:30:45-05:00").is_err());
        assert!(Timestamp::parse("2026-03-09").is_err());
        assert!(Timestamp::parse("").is_err());
    }

    #[test]
    fn test_parse_truncates_subseconds() {
        let ts = Timestamp::parse("2026-03-09T14:30:45.123Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2026-03-09T14:30:45Z");
    }

    #[test]
    fn test_parse_lenient_converts_offset() {
        let ts = Timestamp::parse_lenient("2026-03-09T09:30:45-05:00").unwrap();
        assert_eq!(ts.to_iso8601(), "2026-03-09T14:30:45Z");
    }

    #[test]
    fn test_ordering_and_max() {
        let earlier = Timestamp::parse("2026-03-09T14:30:45Z").unwrap();
        let later = Timestamp::parse("2026-03-09T14:30:46Z").unwrap();
        assert!(earlier < later);
        assert_eq!(earlier.max(later), later);
        assert_eq!(later.max(earlier), later);
    }

    #[test]
    fn test_serde_roundtrip() {
        let ts = Timestamp::parse("2026-03-09T14:30:45Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, back);
    }
}
