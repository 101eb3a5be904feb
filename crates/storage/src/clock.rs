#![forbid(unsafe_code)]

//! Wall-clock stamps. Records keep unix milliseconds; RFC 3339 is only produced at the edges.

use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

/// Milliseconds since the unix epoch, clamped to `0..=i64::MAX`.
pub fn unix_ms_now() -> i64 {
    let ms = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    i64::try_from(ms.max(0)).unwrap_or(i64::MAX)
}

/// Out-of-range stamps render as the epoch.
pub fn rfc3339_from_ms(ms: i64) -> String {
    OffsetDateTime::UNIX_EPOCH
        .checked_add(Duration::milliseconds(ms))
        .and_then(|at| at.format(&Rfc3339).ok())
        .unwrap_or_else(|| "1970-01-01T00:00:00Z".to_string())
}
