use chrono::NaiveDate;

use crate::error::{AppError, Result};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MIN_POST_CONTENT_LEN: usize = 4;

pub fn email(value: &str) -> Result<()> {
    let valid = value
        .split_once('@')
        .map(|(local, domain)| {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        })
        .unwrap_or(false);

    if valid {
        Ok(())
    } else {
        Err(AppError::Validation("Invalid email address".to_string()))
    }
}

pub fn password(value: &str) -> Result<()> {
    if value.trim().chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

/// `YYYY-MM-DD`, and a date that exists on the calendar.
pub fn calendar_date(value: &str) -> Result<NaiveDate> {
    let shaped = value.len() == 10
        && value
            .char_indices()
            .all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() });

    shaped
        .then(|| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
        .flatten()
        .ok_or_else(|| AppError::Validation("Date must be formatted as YYYY-MM-DD".to_string()))
}
