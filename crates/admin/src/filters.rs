//! Custom Askama template filters.
//!
//! Dates are shown in German notation (`dd.mm.yyyy`) in UTC.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use chrono::{DateTime, NaiveDateTime, Utc};

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a timestamp as `dd.mm.yyyy`.
///
/// Usage in templates: `{{ user.created_at|date_de }}` on a `DateTime<Utc>`.
#[askama::filter_fn]
pub fn date_de(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    Ok(parse_displayed(&raw).map_or(raw, |dt| format_date(&dt)))
}

/// Formats a timestamp as `dd.mm.yyyy HH:MM`.
#[askama::filter_fn]
pub fn datetime_de(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    Ok(parse_displayed(&raw).map_or(raw, |dt| format_datetime(&dt)))
}

/// Formats an integer with `.` as thousands separator.
#[askama::filter_fn]
pub fn number_de(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(group_thousands(&value.to_string()))
}

/// `dd.mm.yyyy`.
#[must_use]
pub fn format_date(value: &DateTime<Utc>) -> String {
    value.format("%d.%m.%Y").to_string()
}

/// `dd.mm.yyyy HH:MM`.
#[must_use]
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.format("%d.%m.%Y %H:%M").to_string()
}

/// Parse what `DateTime<Utc>` prints via `Display` (or RFC 3339).
fn parse_displayed(raw: &str) -> Option<DateTime<Utc>> {
    if let Some(naive) = raw.strip_suffix(" UTC") {
        return NaiveDateTime::parse_from_str(naive, "%Y-%m-%d %H:%M:%S%.f")
            .ok()
            .map(|n| n.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn group_thousands(digits: &str) -> String {
    let (sign, digits) = digits
        .strip_prefix('-')
        .map_or(("", digits), |rest| ("-", rest));
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return format!("{sign}{digits}");
    }
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("{sign}{grouped}")
}
