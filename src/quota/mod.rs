use chrono::{DateTime, Utc};
use serde::Serialize;

/// Fallback cap applied when the configured limit is missing or invalid.
pub const DEFAULT_DAILY_LIMIT: i64 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub reason: String,
    pub used_today: i64,
    pub limit: i64,
}

/// Decides whether a redemption may proceed today. Non-positive limits fall
/// back to [`DEFAULT_DAILY_LIMIT`]; negative usage counts clamp to zero.
#[must_use]
pub fn evaluate(limit: i64, used_today: i64) -> QuotaDecision {
    let limit = if limit > 0 { limit } else { DEFAULT_DAILY_LIMIT };
    let used = used_today.max(0);

    if used >= limit {
        QuotaDecision {
            allowed: false,
            reason: format!("daily download quota exhausted ({used}/{limit})"),
            used_today: used,
            limit,
        }
    } else {
        QuotaDecision {
            allowed: true,
            reason: format!("daily download quota: {used}/{limit}"),
            used_today: used,
            limit,
        }
    }
}

/// UTC calendar-day key used to bucket usage counters.
#[must_use]
pub fn date_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}
