use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::errors::{AppError, FieldError};

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

// Indian mobile numbers: optional +91 or leading 0, then ten digits
// starting 6-9.
fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\+?91|0)?[6-9][0-9]{9}$").expect("valid phone regex"))
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([01]?[0-9]|2[0-3]):[0-5][0-9]$").expect("valid time regex"))
}

pub fn is_email(value: &str) -> bool {
    email_re().is_match(value.trim())
}

pub fn is_indian_mobile(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    phone_re().is_match(&compact)
}

pub fn is_iso_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").is_ok()
}

pub fn is_time_hhmm(value: &str) -> bool {
    time_re().is_match(value.trim())
}

pub fn min_len(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    min: usize,
    message: &'static str,
) {
    if value.trim().chars().count() < min {
        errors.push(FieldError { field, message });
    }
}

pub fn email(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    message: &'static str,
) {
    if !is_email(value) {
        errors.push(FieldError { field, message });
    }
}

pub fn mobile(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    message: &'static str,
) {
    if !is_indian_mobile(value) {
        errors.push(FieldError { field, message });
    }
}

pub fn not_empty(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    message: &'static str,
) {
    if value.trim().is_empty() {
        errors.push(FieldError { field, message });
    }
}

pub fn iso_date(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    message: &'static str,
) {
    if !is_iso_date(value) {
        errors.push(FieldError { field, message });
    }
}

pub fn time_hhmm(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    message: &'static str,
) {
    if !is_time_hhmm(value) {
        errors.push(FieldError { field, message });
    }
}

/// Accepts a JSON number or a numeric string, since booking forms send
/// either. Returns the amount in whole rupees when it parses.
pub fn numeric_amount(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: Option<&serde_json::Value>,
    message: &'static str,
) -> Option<i64> {
    let parsed = match value {
        Some(serde_json::Value::Number(n)) => {
            n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))
        }
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .ok()
            .or_else(|| s.trim().parse::<f64>().ok().map(|f| f as i64)),
        _ => None,
    };
    if parsed.is_none() {
        errors.push(FieldError { field, message });
    }
    parsed
}

pub fn finish(errors: Vec<FieldError>) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_indian_mobiles() {
        assert!(is_indian_mobile("9876543210"));
        assert!(is_indian_mobile("+919876543210"));
        assert!(is_indian_mobile("+91 98765 43210"));
        assert!(is_indian_mobile("09876543210"));
    }

    #[test]
    fn rejects_malformed_phones() {
        assert!(!is_indian_mobile("12345"));
        assert!(!is_indian_mobile("5876543210"));
        assert!(!is_indian_mobile("98765432101"));
        assert!(!is_indian_mobile("not-a-phone"));
    }

    #[test]
    fn validates_emails() {
        assert!(is_email("priya@example.com"));
        assert!(is_email("a.b+tag@sub.domain.in"));
        assert!(!is_email("missing-at.example.com"));
        assert!(!is_email("two@@example.com"));
        assert!(!is_email("nodot@example"));
    }

    #[test]
    fn validates_dates_and_times() {
        assert!(is_iso_date("2025-06-15"));
        assert!(!is_iso_date("15-06-2025"));
        assert!(!is_iso_date("2025-02-30"));
        assert!(is_time_hhmm("14:30"));
        assert!(is_time_hhmm("9:05"));
        assert!(is_time_hhmm("23:59"));
        assert!(!is_time_hhmm("24:00"));
        assert!(!is_time_hhmm("14:60"));
        assert!(!is_time_hhmm("2pm"));
    }

    #[test]
    fn numeric_amount_takes_numbers_and_numeric_strings() {
        let mut errors = vec![];
        assert_eq!(
            numeric_amount(&mut errors, "price", Some(&serde_json::json!(25000)), "bad"),
            Some(25000)
        );
        assert_eq!(
            numeric_amount(&mut errors, "price", Some(&serde_json::json!("45000")), "bad"),
            Some(45000)
        );
        assert!(errors.is_empty());

        assert_eq!(
            numeric_amount(&mut errors, "price", Some(&serde_json::json!("lots")), "bad"),
            None
        );
        assert_eq!(numeric_amount(&mut errors, "price", None, "bad"), None);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn min_len_counts_characters_after_trim() {
        let mut errors = vec![];
        min_len(&mut errors, "name", "  A  ", 2, "too short");
        assert_eq!(errors.len(), 1);
        min_len(&mut errors, "name", "Ajay", 2, "too short");
        assert_eq!(errors.len(), 1);
    }
}
