//! Review date resolution.
//!
//! The scraping backend emits dates as ISO timestamps, plain
//! `YYYY-MM-DD` strings, or relative phrases ("2 days ago", "a week
//! ago"). `resolve` normalizes all of them into comparable instants.
//! Both the recency filter and display ordering go through this one
//! function so what is stored never diverges from what is shown.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

use platewatch_common::RawReview;

/// Sentinel for dates that could not be resolved. Sorts last in
/// descending-recency order.
pub const UNRESOLVED: DateTime<Utc> = DateTime::<Utc>::MIN_UTC;

/// Resolve a raw date string against `now`. Pure: injecting `now`
/// keeps this testable without wall-clock dependence.
///
/// Month and year arithmetic is approximate (30/365 days); calendar
/// precision buys nothing for recency filtering.
pub fn resolve(date_text: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let trimmed = date_text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unknown date") {
        return UNRESOLVED;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    }

    let lower = trimmed.to_lowercase();
    if lower.contains("ago") {
        // "a week ago" has no integer token; treat the article as 1.
        let n = first_integer(&lower).unwrap_or(1);

        if lower.contains("minute") || lower.contains("hour") {
            // Sub-day granularity is indistinguishable from "now" here.
            return now;
        }
        let days = if lower.contains("day") {
            Some(n)
        } else if lower.contains("week") {
            n.checked_mul(7)
        } else if lower.contains("month") {
            n.checked_mul(30)
        } else if lower.contains("year") {
            n.checked_mul(365)
        } else {
            None
        };

        if let Some(days) = days {
            return Duration::try_days(days)
                .and_then(|d| now.checked_sub_signed(d))
                .unwrap_or(UNRESOLVED);
        }
    }

    UNRESOLVED
}

/// Whether a date string failed to resolve to a real instant.
pub fn is_unresolved(resolved: DateTime<Utc>) -> bool {
    resolved == UNRESOLVED
}

/// Sort reviews newest-first by resolved date. Unresolvable dates
/// sort last.
pub fn sort_newest_first(reviews: &mut [RawReview], now: DateTime<Utc>) {
    reviews.sort_by_key(|r| std::cmp::Reverse(resolve(&r.date_text, now)));
}

fn first_integer(text: &str) -> Option<i64> {
    text.split_whitespace().find_map(|token| token.parse().ok())
}
