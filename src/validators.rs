/// Input validators for the auth endpoints
///
/// Values are checked as submitted (no trimming), so what is validated is
/// exactly what gets stored or compared.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_USERNAME_LENGTH: usize = 4;
const MAX_USERNAME_LENGTH: usize = 45;
const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_PASSWORD_LENGTH: usize = 45;
const MAX_NAME_LENGTH: usize = 256;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Full name; must contain at least one space
pub fn is_valid_name(name: &str) -> Result<(), ValidationError> {
    if !name.contains(' ') {
        return Err(ValidationError::NameWithoutSpace);
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong("name", MAX_NAME_LENGTH));
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent("name"));
    }

    Ok(())
}

pub fn is_valid_username(username: &str) -> Result<(), ValidationError> {
    check_length("username", username, MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH)
}

pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    check_length("password", password, MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH)
}

pub fn is_valid_email(email: &str) -> Result<(), ValidationError> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    Ok(())
}

fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min {
        return Err(ValidationError::TooShort(field, min));
    }
    if len > max {
        return Err(ValidationError::TooLong(field, max));
    }
    Ok(())
}
