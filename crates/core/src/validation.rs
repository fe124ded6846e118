//! Shared input validation helpers.
//!
//! Every public service operation validates its inputs with these helpers at
//! entry; nothing deeper re-checks them.

use validator::ValidateEmail;

use crate::error::CoreError;
use crate::types::DbId;

/// Longest opaque user id accepted from the auth collaborator.
pub const MAX_USER_ID_LEN: usize = 128;

/// Default page size for list operations.
pub const DEFAULT_LIMIT: i64 = 50;
/// Largest page size a caller may request.
pub const MAX_LIMIT: i64 = 200;

/// Validate an opaque auth user id (non-empty, bounded length).
pub fn validate_user_id(user_id: &str) -> Result<(), CoreError> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("user id must not be empty".into()));
    }
    if trimmed.len() > MAX_USER_ID_LEN {
        return Err(CoreError::Validation(format!(
            "user id must be at most {MAX_USER_ID_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a server-owned identifier (must be positive).
pub fn validate_id(id: DbId, name: &str) -> Result<(), CoreError> {
    if id <= 0 {
        return Err(CoreError::Validation(format!(
            "{name} must be positive, got {id}"
        )));
    }
    Ok(())
}

/// Validate that an integer falls within `[min, max]`.
pub fn validate_int_range(value: i64, min: i64, max: i64, name: &str) -> Result<(), CoreError> {
    if !(min..=max).contains(&value) {
        return Err(CoreError::Validation(format!(
            "{name} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

/// Validate that a float falls within `[min, max]` and is finite.
pub fn validate_float_range(value: f64, min: f64, max: f64, name: &str) -> Result<(), CoreError> {
    if !value.is_finite() || value < min || value > max {
        return Err(CoreError::Validation(format!(
            "{name} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

/// Validate that a value falls within `[0.0, 1.0]`.
pub fn validate_unit_range(value: f64, name: &str) -> Result<(), CoreError> {
    validate_float_range(value, 0.0, 1.0, name)
}

/// Validate that a collection has at least one element.
pub fn validate_non_empty<T>(items: &[T], name: &str) -> Result<(), CoreError> {
    if items.is_empty() {
        return Err(CoreError::Validation(format!("{name} must not be empty")));
    }
    Ok(())
}

/// Validate a string's character count within `[min, max]`.
pub fn validate_text_length(text: &str, min: usize, max: usize, name: &str) -> Result<(), CoreError> {
    let len = text.chars().count();
    if len < min || len > max {
        return Err(CoreError::Validation(format!(
            "{name} must be between {min} and {max} characters, got {len}"
        )));
    }
    Ok(())
}

/// Validate a non-blank required string.
pub fn validate_required(text: &str, name: &str) -> Result<(), CoreError> {
    if text.trim().is_empty() {
        return Err(CoreError::Validation(format!("{name} must not be empty")));
    }
    Ok(())
}

/// Validate and normalise an email address (trimmed, lowercased).
pub fn normalize_email(email: &str) -> Result<String, CoreError> {
    let normalized = email.trim().to_lowercase();
    if !normalized.validate_email() {
        return Err(CoreError::Validation(format!(
            "invalid email address: '{}'",
            email.trim()
        )));
    }
    Ok(normalized)
}

/// Clamp an optional page size to `[1, MAX_LIMIT]`, defaulting to [`DEFAULT_LIMIT`].
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Clamp an optional offset to be non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}
