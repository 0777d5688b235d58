//! Timestamp helpers
//!
//! Observations carry milliseconds since the Unix epoch. Adapters and
//! documents speak RFC 3339; these convert at the edges.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

use crate::error::{CoreError, Result};

/// Parse an RFC 3339 timestamp into milliseconds since the epoch
pub fn parse_timestamp(value: &str) -> Result<i64> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.timestamp_millis())
        .map_err(|e| CoreError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Format milliseconds since the epoch as RFC 3339 UTC with millisecond
/// precision.
///
/// Values chrono cannot represent are rendered as the raw number.
pub fn format_timestamp(millis: i64) -> String {
    match Utc.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => millis.to_string(),
    }
}

/// Current wall-clock time in milliseconds since the epoch
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
