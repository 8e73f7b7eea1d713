// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time as RFC3339, used for `migratedAt` markers.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Format a millisecond epoch value as RFC3339.
///
/// Legacy documents carry `created`/`modified` as millisecond epochs; the
/// migrated copies get a derived human-readable field alongside. Returns
/// `None` for out-of-range values.
pub fn format_epoch_millis(millis: i64) -> Option<String> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(format_utc_rfc3339)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_epoch_millis() {
        assert_eq!(
            format_epoch_millis(1_700_000_000_000).as_deref(),
            Some("2023-11-14T22:13:20Z")
        );
    }

    #[test]
    fn test_format_epoch_millis_out_of_range() {
        assert_eq!(format_epoch_millis(i64::MAX), None);
    }
}
