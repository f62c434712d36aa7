//! Date-header normalization and age computation
//!
//! Raw `Date:` headers arrive in heterogeneous formats, sometimes with a
//! trailing parenthesized zone-name suffix that breaks strict parsers. This
//! module normalizes them to an ISO calendar date and computes age-in-days.
//! Parsing failures never propagate; they degrade to an empty string.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use tracing::warn;

/// Matches parenthesized timezone-name suffixes like ` (EDT)` or ` (CEST)`
static ZONE_NAME_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\([A-Z]{3,4}\)").expect("zone suffix regex is valid"));

/// Normalize a raw date header into an ISO `YYYY-MM-DD` string
///
/// Strips parenthesized zone-name suffixes, then parses with strict RFC 2822
/// rules first (preserving the sender's own offset for the calendar date) and
/// falls back to `mailparse`'s permissive parser rendered in UTC. Returns an
/// empty string on any failure; never errors.
pub fn normalize_date(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let cleaned = ZONE_NAME_SUFFIX.replace_all(raw, "");
    let cleaned = cleaned.trim();

    if let Ok(dt) = DateTime::parse_from_rfc2822(cleaned) {
        return dt.date_naive().format("%Y-%m-%d").to_string();
    }

    match mailparse::dateparse(cleaned) {
        Ok(epoch) => match DateTime::<Utc>::from_timestamp(epoch, 0) {
            Some(dt) => dt.date_naive().format("%Y-%m-%d").to_string(),
            None => String::new(),
        },
        Err(e) => {
            warn!(raw, error = %e, "failed to parse date header");
            String::new()
        }
    }
}

/// Parse a canonical `YYYY-MM-DD` string back into a calendar date
pub fn parse_canonical(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Age of an email in whole days relative to wall-clock today
///
/// The reference date is always "now" at the call site; callers cannot
/// supply their own. A future-dated message yields a negative value, which
/// is a boundary case rather than an error.
pub fn age_in_days(date: NaiveDate) -> i64 {
    age_between(date, Utc::now().date_naive())
}

/// Plain calendar subtraction in whole days
fn age_between(date: NaiveDate, today: NaiveDate) -> i64 {
    (today - date).num_days()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{age_between, normalize_date, parse_canonical};

    #[test]
    fn normalizes_standard_rfc2822_date() {
        assert_eq!(
            normalize_date("Wed, 1 May 2024 10:30:00 -0400"),
            "2024-05-01"
        );
    }

    #[test]
    fn zone_name_suffix_is_stripped_before_parsing() {
        let with_suffix = normalize_date("Wed, 1 May 2024 10:30:00 -0400 (EDT)");
        let without_suffix = normalize_date("Wed, 1 May 2024 10:30:00 -0400");
        assert_eq!(with_suffix, without_suffix);
        assert_eq!(with_suffix, "2024-05-01");
    }

    #[test]
    fn four_letter_zone_suffix_is_stripped() {
        assert_eq!(
            normalize_date("Sat, 3 Aug 2024 23:59:00 +0200 (CEST)"),
            "2024-08-03"
        );
    }

    #[test]
    fn calendar_date_follows_sender_offset() {
        // 23:30 at -0400 is already the next day in UTC; the sender's own
        // calendar date wins.
        assert_eq!(
            normalize_date("Wed, 1 May 2024 23:30:00 -0400"),
            "2024-05-01"
        );
    }

    #[test]
    fn unparseable_date_yields_empty_string() {
        assert_eq!(normalize_date("not a date"), "");
        assert_eq!(normalize_date(""), "");
        assert_eq!(normalize_date("   "), "");
    }

    #[test]
    fn age_is_plain_calendar_subtraction() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(age_between(date, today), 9);
    }

    #[test]
    fn future_date_yields_negative_age() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(age_between(date, today), -10);
    }

    #[test]
    fn canonical_roundtrip() {
        let parsed = parse_canonical("2024-05-01").unwrap();
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert!(parse_canonical("").is_none());
        assert!(parse_canonical("05/01/2024").is_none());
    }
}
