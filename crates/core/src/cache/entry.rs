//! Cached fact rows.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of the fact cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheEntry {
    pub host: String,
    /// When the facts were last written.
    pub changed: DateTime<Utc>,
    /// Lifetime in seconds; 0 never expires.
    pub timeout: i64,
    pub facts: Value,
}

impl CacheEntry {
    /// Whether the entry is past its timeout at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|at| now > at)
    }

    /// When the entry expires, if ever.
    ///
    /// A timeout too large to represent never expires, the same as the sweep,
    /// where SQLite's `datetime()` yields NULL for it.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.timeout == 0 {
            return None;
        }
        Duration::try_seconds(self.timeout).and_then(|lifetime| self.changed.checked_add_signed(lifetime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn entry(timeout: i64) -> CacheEntry {
        CacheEntry {
            host: "web01".into(),
            changed: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            timeout,
            facts: json!({"os": "linux"}),
        }
    }

    #[test]
    fn test_zero_timeout_never_expires() {
        let e = entry(0);
        let far_future = e.changed + Duration::days(365 * 20);
        assert!(!e.is_expired(far_future));
        assert!(e.expires_at().is_none());
    }

    #[test]
    fn test_expiry_boundary() {
        let e = entry(60);
        assert!(!e.is_expired(e.changed + Duration::seconds(60)));
        assert!(e.is_expired(e.changed + Duration::seconds(61)));
        assert_eq!(e.expires_at(), Some(e.changed + Duration::seconds(60)));
    }

    #[test]
    fn test_out_of_range_timeout_never_expires() {
        for timeout in [i64::MAX, i64::MIN, 400_000_000_000_000] {
            let e = entry(timeout);
            assert!(e.expires_at().is_none(), "timeout {timeout}");
            assert!(!e.is_expired(e.changed + Duration::days(365 * 100)));
        }
    }
}
