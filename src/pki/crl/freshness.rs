use chrono::{DateTime, Utc};

use super::decoder::CrlInfo;

/// Freshness of a CRL at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessReport {
    /// `now` is strictly before `nextUpdate`
    pub is_valid: bool,
    /// Whole hours since `thisUpdate`, negative if issued in the future
    pub age_hours: i64,
    /// Whole hours until `nextUpdate`, negative once expired
    pub expires_in_hours: i64,
}

/// Evaluate `info` against `now`. Hour counts are truncated toward zero.
pub fn evaluate(info: &CrlInfo, now: DateTime<Utc>) -> FreshnessReport {
    FreshnessReport {
        is_valid: now < info.next_update(),
        age_hours: (now - info.this_update()).num_hours(),
        expires_in_hours: (info.next_update() - now).num_hours(),
    }
}
