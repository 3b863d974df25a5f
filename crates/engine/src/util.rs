//! Internal helpers for validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use chrono::{DateTime, Datelike, NaiveTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Reject zero or negative database ids.
pub(crate) fn require_id(id: i64, label: &str) -> ResultEngine<i64> {
    if id < 1 {
        return Err(EngineError::InvalidId(format!("invalid {label} id {id}")));
    }
    Ok(id)
}

/// New public identifier: a v4 UUID without dashes.
pub(crate) fn new_public_token() -> String {
    Uuid::new_v4().simple().to_string()
}

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Lowercase ASCII letters and digits, single dashes in between.
pub(crate) fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for c in value.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

pub(crate) fn validate_slug(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || slugify(trimmed) != trimmed {
        return Err(EngineError::InvalidName(format!(
            "slug {trimmed:?} must be lowercase letters, digits and single dashes"
        )));
    }
    Ok(trimmed.to_string())
}

/// Midnight (UTC) of the first day of the month containing `at`.
pub(crate) fn start_of_month(at: DateTime<Utc>) -> DateTime<Utc> {
    let date = at.date_naive();
    let first = date.with_day(1).unwrap_or(date);
    first.and_time(NaiveTime::MIN).and_utc()
}

pub(crate) fn previous_month_start(month_start: DateTime<Utc>) -> DateTime<Utc> {
    start_of_month(month_start - TimeDelta::days(1))
}

pub(crate) fn next_month_start(month_start: DateTime<Utc>) -> DateTime<Utc> {
    start_of_month(start_of_month(month_start) + TimeDelta::days(32))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn month_boundaries() {
        let at = Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap();
        let start = start_of_month(at);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(
            previous_month_start(start),
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            next_month_start(start),
            Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()
        );
        let january = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            previous_month_start(january),
            Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("  Center for Tech!  "), "center-for-tech");
        assert!(validate_slug("cct").is_ok());
        assert!(validate_slug("Bad Slug").is_err());
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn ids_must_be_positive() {
        assert!(require_id(0, "budget").is_err());
        assert_eq!(require_id(4, "budget").unwrap(), 4);
    }
}
