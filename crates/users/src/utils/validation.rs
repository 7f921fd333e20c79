//! Input validation utilities.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::AuthError;

static USERNAME_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").ok());
static EMAIL_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok());

const PASSWORD_SPECIALS: &str = "!@#$%^&*";

fn matches(pattern: &Lazy<Option<Regex>>, value: &str) -> Result<bool, AuthError> {
    pattern
        .as_ref()
        .map(|regex| regex.is_match(value))
        .ok_or_else(|| AuthError::Internal("validation pattern failed to compile".to_string()))
}

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), AuthError> {
    if email.len() > 255 {
        return Err(AuthError::validation("Email too long"));
    }

    if !matches(&EMAIL_RE, email)? {
        return Err(AuthError::validation("Invalid email format"));
    }

    Ok(())
}

/// Validate password strength requirements
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    let length = password.chars().count();
    if length < 8 {
        return Err(AuthError::validation(
            "Password must be at least 8 characters long",
        ));
    }

    if length > 128 {
        return Err(AuthError::validation(
            "Password must be at most 128 characters long",
        ));
    }

    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    if !has_lowercase {
        return Err(AuthError::validation(
            "Password must contain at least one lowercase letter",
        ));
    }

    if !has_uppercase {
        return Err(AuthError::validation(
            "Password must contain at least one uppercase letter",
        ));
    }

    if !has_digit {
        return Err(AuthError::validation(
            "Password must contain at least one digit",
        ));
    }

    if !has_special {
        return Err(AuthError::validation(format!(
            "Password must contain at least one of {}",
            PASSWORD_SPECIALS
        )));
    }

    Ok(())
}

/// Validate username
pub fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.len() < 3 {
        return Err(AuthError::validation(
            "Username must be at least 3 characters long",
        ));
    }

    if username.len() > 50 {
        return Err(AuthError::validation(
            "Username must be at most 50 characters long",
        ));
    }

    if !matches(&USERNAME_RE, username)? {
        return Err(AuthError::validation(
            "Username can only contain letters, numbers and underscores",
        ));
    }

    Ok(())
}
