//! UTC timestamps for results and cache entries.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A UTC instant, serialized as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Second precision, `Z` suffix; the form shown in reports.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed() -> Timestamp {
        Timestamp::from_datetime(
            DateTime::parse_from_rfc3339("2024-01-15T10:30:00.250Z")
                .unwrap()
                .with_timezone(&Utc),
        )
    }

    #[test]
    fn report_form_drops_subseconds() {
        assert_eq!(fixed().to_rfc3339(), "2024-01-15T10:30:00Z");
        assert_eq!(fixed().to_string(), "2024-01-15T10:30:00Z");
    }

    #[test]
    fn serde_keeps_full_precision() {
        let json = serde_json::to_string(&fixed()).unwrap();
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fixed());
    }

    #[test]
    fn now_is_monotonic_enough() {
        let before = Utc::now();
        let ts = Timestamp::now();
        assert!(ts.as_datetime() >= &before);
    }
}
