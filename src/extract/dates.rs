use std::sync::LazyLock;

use chrono::{DateTime, Days, Local, NaiveDate};
use regex::Regex;

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)").unwrap());

/// Unit vocabularies and their length in days, checked in this order.
const UNITS: &[(&[&str], u64)] = &[
    (&["day", "ngày", "ngay"], 1),
    (&["week", "tuần", "tuan"], 7),
    (&["month", "tháng", "thang"], 30),
    (&["year", "năm", "nam"], 365),
];

/// Turn "3 tháng trước" / "a week ago" into a calendar date relative to `now`.
///
/// Approximate: months are 30 days and years 365. A phrase with no number counts
/// as one unit. Unrecognised phrases resolve to `None`.
pub fn resolve_relative_date(phrase: &str, now: DateTime<Local>) -> Option<NaiveDate> {
    let text = phrase.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }
    let amount: u64 = match LEADING_NUMBER.captures(&text) {
        Some(c) => c[1].parse().ok()?,
        None => 1,
    };
    let (_, unit_days) = UNITS
        .iter()
        .find(|(words, _)| words.iter().any(|w| text.contains(w)))?;
    now.date_naive().checked_sub_days(Days::new(amount.checked_mul(*unit_days)?))
}
