//! Input validation for free-text fields and credentials.
//!
//! Validators return the normalized value so callers never store the raw
//! input by accident.

use crate::error::{CoreError, Result};

/// Default bound on complaint descriptions, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 4000;

/// Default bound on comment bodies, in characters.
pub const MAX_COMMENT_LEN: usize = 2000;

/// Bound on usernames, in characters.
pub const MAX_USERNAME_LEN: usize = 254;

/// Trim `value` and require it to be non-empty and at most `max_len` chars.
pub fn validate_text(field: &str, value: &str, max_len: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput(format!("{field} must not be empty")));
    }
    let len = trimmed.chars().count();
    if len > max_len {
        return Err(CoreError::InvalidInput(format!(
            "{field} exceeds {max_len} characters ({len})"
        )));
    }
    Ok(trimmed.to_string())
}

/// Like [`validate_text`], but blank input collapses to `None`.
pub fn validate_optional_text(
    field: &str,
    value: Option<&str>,
    max_len: usize,
) -> Result<Option<String>> {
    match value {
        Some(v) if !v.trim().is_empty() => validate_text(field, v, max_len).map(Some),
        _ => Ok(None),
    }
}

/// Normalize a username: trimmed, non-empty, bounded.
pub fn validate_username(username: &str) -> Result<String> {
    validate_text("username", username, MAX_USERNAME_LEN)
}

/// Secrets keep caller whitespace but must not be empty.
pub fn validate_secret(secret: &str) -> Result<()> {
    if secret.is_empty() {
        return Err(CoreError::InvalidInput("password must not be empty".into()));
    }
    Ok(())
}
