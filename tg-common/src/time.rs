//! Timestamp utilities

use chrono::{DateTime, Utc};
use std::time::Instant;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Whole milliseconds from `earlier` to `later`, saturating at zero when the
/// instants arrive out of order.
pub fn millis_between(earlier: Instant, later: Instant) -> u64 {
    let span = later.saturating_duration_since(earlier);
    u64::try_from(span.as_millis()).unwrap_or(u64::MAX)
}
