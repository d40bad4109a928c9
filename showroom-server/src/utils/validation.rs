//! Input validation helpers
//!
//! Centralized text length constants and validation functions, applied
//! before anything is persisted.

use shared::error::{AppError, ErrorCode};

// ── Text length limits ──────────────────────────────────────────────

/// Visit notes
pub const MAX_NOTE_LEN: usize = 2000;

/// Workflow stage labels
pub const MAX_LABEL_LEN: usize = 100;

/// Vehicle stock codes
pub const MAX_STOCK_NUMBER_LEN: usize = 64;

/// Dealership identifiers
pub const MAX_DEALERSHIP_ID_LEN: usize = 64;

/// Auto-trigger rules per workflow config
pub const MAX_AUTO_TRIGGERS: usize = 20;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    let len = value.chars().count();
    if len > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({len} chars, max {max_len})"
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value {
        let len = v.chars().count();
        if len > max_len {
            return Err(AppError::validation(format!(
                "{field} is too long ({len} chars, max {max_len})"
            )));
        }
    }
    Ok(())
}

/// Dealership ids are 1-64 chars of `[A-Za-z0-9_-]`
pub fn validate_dealership_id(value: &str) -> Result<(), AppError> {
    let valid = !value.is_empty()
        && value.len() <= MAX_DEALERSHIP_ID_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if !valid {
        return Err(AppError::with_message(
            ErrorCode::InvalidTenant,
            "Dealership id must be 1-64 characters of letters, digits, '_' or '-'",
        ));
    }
    Ok(())
}
