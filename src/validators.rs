/// Input validators
///
/// Field-shape rules for account and post payloads. Each validator returns
/// the normalised value or the violation for that one field; callers collect
/// violations so a single response can list every bad field.

use regex::Regex;
use lazy_static::lazy_static;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MAX_NAME_LENGTH: usize = 256;
const MIN_PASSWORD_LENGTH: usize = 5;
const MAX_PASSWORD_LENGTH: usize = 72; // bcrypt ignores anything past 72 bytes
const MAX_STATUS_LENGTH: usize = 256;
const MIN_POST_FIELD_LENGTH: usize = 5;
const MAX_TITLE_LENGTH: usize = 256;
const MAX_CONTENT_LENGTH: usize = 10_000;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates and normalises an email address (trimmed, lower-cased)
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    // Local part longer than 64 octets is not deliverable
    if let Some(at_pos) = trimmed.find('@') {
        if at_pos > 64 {
            return Err(ValidationError::SuspiciousContent("email"));
        }
    }

    Ok(trimmed.to_lowercase())
}

/// Validates a display name
pub fn is_valid_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("name"));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong("name", MAX_NAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent("name"));
    }

    Ok(trimmed.to_string())
}

/// Validates a sign-up password. Callers trim before hashing and before
/// comparing at login, so surrounding whitespace is never significant.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    let length = password.trim().chars().count();

    if length == 0 {
        return Err(ValidationError::EmptyField("password"));
    }

    if length < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

/// Validates the free-form account status
pub fn is_valid_status(status: &str) -> Result<String, ValidationError> {
    let trimmed = status.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("status"));
    }

    if trimmed.chars().count() > MAX_STATUS_LENGTH {
        return Err(ValidationError::TooLong("status", MAX_STATUS_LENGTH));
    }

    Ok(trimmed.to_string())
}

pub fn is_valid_title(title: &str) -> Result<String, ValidationError> {
    bounded_text("title", title, MAX_TITLE_LENGTH)
}

pub fn is_valid_content(content: &str) -> Result<String, ValidationError> {
    bounded_text("content", content, MAX_CONTENT_LENGTH)
}

pub fn is_valid_image_url(image_url: &str) -> Result<String, ValidationError> {
    let trimmed = image_url.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("imageUrl"));
    }

    // Windows-style separators from uploads are normalised
    Ok(trimmed.replace('\\', "/"))
}

fn bounded_text(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    let length = trimmed.chars().count();

    if length == 0 {
        return Err(ValidationError::EmptyField(field));
    }

    if length < MIN_POST_FIELD_LENGTH {
        return Err(ValidationError::TooShort(field, MIN_POST_FIELD_LENGTH));
    }

    if length > max {
        return Err(ValidationError::TooLong(field, max));
    }

    Ok(trimmed.to_string())
}

/// Runs a validator on an optional field, recording the violation if any.
///
/// Missing fields are validated as empty strings.
pub fn collect<T>(
    errors: &mut Vec<ValidationError>,
    value: Option<&str>,
    validator: impl FnOnce(&str) -> Result<T, ValidationError>,
) -> Option<T> {
    match validator(value.unwrap_or_default()) {
        Ok(v) => Some(v),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}
