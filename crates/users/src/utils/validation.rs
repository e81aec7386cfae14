//! Input validation utilities.

use regex::Regex;
use userdesk_database::UserError;

const USERNAME_PATTERN: &str = r"^[A-Za-z0-9_.\-]{3,32}$";
const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$";
const PHONE_PATTERN: &str = r"^\+?[0-9]{6,20}$";
const IDCARD_PATTERN: &str = r"^([0-9]{15}|[0-9]{17}[0-9Xx])$";

fn matches(pattern: &str, value: &str) -> Result<bool, UserError> {
    let regex = Regex::new(pattern)
        .map_err(|e| UserError::ValidationFailed(format!("invalid pattern: {e}")))?;
    Ok(regex.is_match(value))
}

/// Validate username
pub fn validate_username(username: &str) -> Result<(), UserError> {
    if !matches(USERNAME_PATTERN, username)? {
        return Err(UserError::ValidationFailed(
            "username must be 3-32 letters, digits, '_', '.' or '-'".to_string(),
        ));
    }

    Ok(())
}

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), UserError> {
    if email.len() > 255 {
        return Err(UserError::ValidationFailed("email too long".to_string()));
    }

    if !matches(EMAIL_PATTERN, email)? {
        return Err(UserError::ValidationFailed("invalid email format".to_string()));
    }

    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), UserError> {
    if !matches(PHONE_PATTERN, phone)? {
        return Err(UserError::ValidationFailed("invalid phone number".to_string()));
    }

    Ok(())
}

pub fn validate_idcard(idcard: &str) -> Result<(), UserError> {
    if !matches(IDCARD_PATTERN, idcard)? {
        return Err(UserError::ValidationFailed("invalid idcard number".to_string()));
    }

    Ok(())
}

/// Validate password length
pub fn validate_password(password: &str) -> Result<(), UserError> {
    let length = password.chars().count();

    if length < 6 {
        return Err(UserError::ValidationFailed(
            "password must be at least 6 characters long".to_string(),
        ));
    }

    if length > 128 {
        return Err(UserError::ValidationFailed(
            "password must be at most 128 characters long".to_string(),
        ));
    }

    Ok(())
}

/// Trim an optional field, mapping blanks to `None`.
pub fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalize an idcard so the trailing check letter is always upper case.
pub fn normalize_idcard(value: Option<String>) -> Option<String> {
    normalize(value).map(|v| v.to_ascii_uppercase())
}

/// Validate the optional contact fields of an account.
pub fn validate_contact(
    phone: Option<&str>,
    idcard: Option<&str>,
    email: Option<&str>,
) -> Result<(), UserError> {
    if let Some(phone) = phone {
        validate_phone(phone)?;
    }
    if let Some(idcard) = idcard {
        validate_idcard(idcard)?;
    }
    if let Some(email) = email {
        validate_email(email)?;
    }
    Ok(())
}
