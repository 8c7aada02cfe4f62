//! Age-from-date formulas
//!
//! Recognizes `new Date().getFullYear() - new Date(<field>).getFullYear()`
//! and computes completed years between the field's date and today.

use chrono::{DateTime, Datelike, Local, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

use crate::error::DerivationError;

static AGE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn age_pattern() -> &'static Regex {
    AGE_PATTERN.get_or_init(|| {
        Regex::new(
            r"^\s*new\s+Date\s*\(\s*\)\s*\.\s*getFullYear\s*\(\s*\)\s*-\s*new\s+Date\s*\(\s*([A-Za-z_$][A-Za-z0-9_$]*)\s*\)\s*\.\s*getFullYear\s*\(\s*\)\s*$",
        )
        .expect("age pattern is a valid regex")
    })
}

/// Return the referenced field id if `formula` is the age template
pub fn match_age_formula(formula: &str) -> Option<String> {
    age_pattern()
        .captures(formula)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Source of "today" for age computation
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Parse a date input value: `YYYY-MM-DD` or an RFC 3339 timestamp
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, DerivationError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|dt| dt.date_naive()))
        .map_err(|_| DerivationError::InvalidDate {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

/// Completed years from `birth` to `today`
pub fn completed_years(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_matches_template() {
        let formula = "new Date().getFullYear() - new Date(dateOfBirth).getFullYear()";
        assert_eq!(match_age_formula(formula), Some("dateOfBirth".to_string()));
        assert_eq!(
            match_age_formula("  new Date().getFullYear()-new Date( field_42 ).getFullYear() "),
            Some("field_42".to_string())
        );
    }

    #[test]
    fn test_rejects_other_formulas() {
        assert_eq!(match_age_formula("a + b"), None);
        assert_eq!(match_age_formula("new Date(dob).getFullYear()"), None);
        assert_eq!(
            match_age_formula("new Date().getFullYear() - new Date(dob).getFullYear() + 1"),
            None
        );
    }

    #[test]
    fn test_completed_years_around_birthday() {
        let today = date(2024, 6, 15);
        assert_eq!(completed_years(date(2000, 6, 16), today), 23);
        assert_eq!(completed_years(date(2000, 6, 15), today), 24);
        assert_eq!(completed_years(date(2000, 7, 1), today), 23);
        assert_eq!(completed_years(date(2000, 1, 1), today), 24);
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("dob", "2000-06-16").unwrap(), date(2000, 6, 16));
        assert_eq!(parse_date("dob", "2000-06-16T08:30:00Z").unwrap(), date(2000, 6, 16));
        assert!(matches!(
            parse_date("dob", "16/06/2000"),
            Err(DerivationError::InvalidDate { .. })
        ));
    }
}
