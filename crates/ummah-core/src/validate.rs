//! Form validation for signup, profile edits and password reset.
//!
//! Limits are passed in by the caller (see the client config) so the rules
//! stay pure and testable against a fixed `today`.

use chrono::{DateTime, Months, NaiveDate};

use crate::error::{Result, UmmahError};

/// Structural email check: one `@`, non-empty local part, dotted domain with
/// non-empty labels, no whitespace.
pub fn validate_email(email: &str) -> Result<()> {
    let bad = || UmmahError::validation("email", "please enter a valid email address");

    if email.chars().any(char::is_whitespace) {
        return Err(bad());
    }
    let (local, domain) = email.split_once('@').ok_or_else(bad)?;
    if local.is_empty() || domain.contains('@') {
        return Err(bad());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(bad());
    }
    Ok(())
}

pub fn validate_name(name: &str, min_len: usize) -> Result<()> {
    if name.trim().chars().count() < min_len {
        return Err(UmmahError::validation(
            "name",
            format!("must be at least {min_len} characters"),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str, min_len: usize) -> Result<()> {
    if password.chars().count() < min_len {
        return Err(UmmahError::validation(
            "password",
            format!("must be at least {min_len} characters"),
        ));
    }
    Ok(())
}

pub fn validate_country(country: &str) -> Result<()> {
    if country.trim().is_empty() {
        return Err(UmmahError::validation("country", "please select a country"));
    }
    Ok(())
}

/// Accepts a plain date (`1999-12-31`) or an RFC 3339 timestamp.
pub fn parse_dob(dob: &str) -> Result<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(dob, "%Y-%m-%d") {
        return Ok(d);
    }
    DateTime::parse_from_rfc3339(dob)
        .map(|dt| dt.date_naive())
        .map_err(|_| UmmahError::validation("dob", "date of birth is required"))
}

/// The user must be at least `min_age_years` old on `today`.
pub fn validate_dob(dob: &str, min_age_years: u32, today: NaiveDate) -> Result<()> {
    let born = parse_dob(dob)?;
    let cutoff = today
        .checked_sub_months(Months::new(min_age_years.saturating_mul(12)))
        .ok_or_else(|| UmmahError::validation("dob", "date of birth out of range"))?;
    if born > cutoff {
        return Err(UmmahError::validation(
            "dob",
            format!("you must be at least {min_age_years} years old"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn emails() {
        assert!(validate_email("ali@example.com").is_ok());
        assert!(validate_email("a.b+c@mail.example.org").is_ok());
        for bad in ["", "@.", "a@.", "@example.com", "a@b", "a @b.com", "a@b..com", "a@b@c.com"] {
            assert!(validate_email(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn dob_age_boundary() {
        let today = day(2024, 6, 15);
        assert!(validate_dob("2011-06-15", 13, today).is_ok());
        assert!(validate_dob("2011-06-16", 13, today).is_err());
        assert!(validate_dob("2000-01-01T00:00:00.000Z", 13, today).is_ok());
        assert!(validate_dob("not a date", 13, today).is_err());
    }

    #[test]
    fn name_counts_chars_after_trim() {
        assert!(validate_name("Al", 2).is_ok());
        assert!(validate_name(" A ", 2).is_err());
        assert!(validate_name("عل", 2).is_ok());
    }
}
