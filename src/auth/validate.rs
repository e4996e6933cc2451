//! Input validation for identity records.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid email format")]
    Email,

    #[error("invalid phone number")]
    Phone,

    #[error("invalid password: must contain at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,

    #[error("invalid password: must contain at least one letter and one digit")]
    PasswordTooSimple,
}

impl ValidationError {
    /// Password failures are reported as weak credentials rather than bad input.
    pub fn is_credential(self) -> bool {
        matches!(self, ValidationError::PasswordTooShort | ValidationError::PasswordTooSimple)
    }
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::Email)
    }
}

/// At least six characters with at least one letter and one digit.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(char::is_numeric);
    if !(has_letter && has_digit) {
        return Err(ValidationError::PasswordTooSimple);
    }
    Ok(())
}

struct Region {
    code: &'static str,
    country_code: &'static str,
    national_len: usize,
    trunk_prefix: &'static str,
}

const REGIONS: &[Region] = &[
    Region { code: "RU", country_code: "7", national_len: 10, trunk_prefix: "8" },
    Region { code: "KZ", country_code: "7", national_len: 10, trunk_prefix: "8" },
    Region { code: "BY", country_code: "375", national_len: 9, trunk_prefix: "80" },
    Region { code: "UA", country_code: "380", national_len: 9, trunk_prefix: "0" },
    Region { code: "GB", country_code: "44", national_len: 10, trunk_prefix: "0" },
    Region { code: "US", country_code: "1", national_len: 10, trunk_prefix: "1" },
];

/// Normalizes a phone number to E.164 (`+` followed by digits).
///
/// Spaces, dashes, dots and parentheses are ignored. Numbers with a leading
/// `+` are taken as international; anything else is read in `region`.
pub fn normalize_phone(raw: &str, region: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let (international, body) = match trimmed.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let mut digits = String::with_capacity(body.len());
    for ch in body.chars() {
        match ch {
            '0'..='9' => digits.push(ch),
            ' ' | '-' | '(' | ')' | '.' => {}
            _ => return Err(ValidationError::Phone),
        }
    }

    if international {
        return match digits.len() {
            8..=15 if !digits.starts_with('0') => Ok(format!("+{}", digits)),
            _ => Err(ValidationError::Phone),
        };
    }

    let region = REGIONS
        .iter()
        .find(|r| r.code.eq_ignore_ascii_case(region))
        .ok_or(ValidationError::Phone)?;

    let national = if digits.len() == region.national_len {
        digits.as_str()
    } else if digits.len() == region.trunk_prefix.len() + region.national_len
        && digits.starts_with(region.trunk_prefix)
    {
        &digits[region.trunk_prefix.len()..]
    } else if digits.len() == region.country_code.len() + region.national_len
        && digits.starts_with(region.country_code)
    {
        &digits[region.country_code.len()..]
    } else {
        return Err(ValidationError::Phone);
    };

    Ok(format!("+{}{}", region.country_code, national))
}
