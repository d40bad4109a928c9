//! Unified error codes for the showroom service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 3xxx: Tenant (dealership) errors
//! - 4xxx: Visit errors
//! - 5xxx: Timer errors
//! - 6xxx: Note errors
//! - 7xxx: Workflow configuration errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so dashboards can switch on
/// them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// Staff identity missing or unreadable
    NotAuthenticated = 1001,

    // ==================== 3xxx: Tenant ====================
    /// Dealership header missing
    TenantNotSelected = 3001,
    /// Dealership identifier is malformed
    InvalidTenant = 3002,

    // ==================== 4xxx: Visit ====================
    /// Visit not found (or belongs to another dealership)
    VisitNotFound = 4001,
    /// Visit has already been closed
    VisitAlreadyClosed = 4002,
    /// Unknown visit status
    InvalidStatus = 4003,
    /// Close requested with a non-terminal status
    VisitNotClosedStatus = 4004,
    /// Unknown visit source
    InvalidSource = 4005,

    // ==================== 5xxx: Timer ====================
    /// Timer not found on this visit
    TimerNotFound = 5001,
    /// Timer has already been stopped
    TimerAlreadyStopped = 5002,
    /// Unknown timer type
    InvalidTimerType = 5003,

    // ==================== 6xxx: Note ====================
    /// Note not found on this visit
    NoteNotFound = 6001,

    // ==================== 7xxx: Workflow ====================
    /// Workflow configuration rejected
    WorkflowConfigInvalid = 7001,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Operation timed out
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "Staff identity is missing or invalid",

            // Tenant
            ErrorCode::TenantNotSelected => "No dealership selected",
            ErrorCode::InvalidTenant => "Dealership identifier is invalid",

            // Visit
            ErrorCode::VisitNotFound => "Visit not found",
            ErrorCode::VisitAlreadyClosed => "Visit has already been closed",
            ErrorCode::InvalidStatus => "Invalid visit status",
            ErrorCode::VisitNotClosedStatus => "Visit can only be closed as won or lost",
            ErrorCode::InvalidSource => "Invalid visit source",

            // Timer
            ErrorCode::TimerNotFound => "Timer not found",
            ErrorCode::TimerAlreadyStopped => "Timer has already been stopped",
            ErrorCode::InvalidTimerType => "Invalid timer type",

            // Note
            ErrorCode::NoteNotFound => "Note not found",

            // Workflow
            ErrorCode::WorkflowConfigInvalid => "Workflow configuration is invalid",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),

            // Tenant
            3001 => Ok(ErrorCode::TenantNotSelected),
            3002 => Ok(ErrorCode::InvalidTenant),

            // Visit
            4001 => Ok(ErrorCode::VisitNotFound),
            4002 => Ok(ErrorCode::VisitAlreadyClosed),
            4003 => Ok(ErrorCode::InvalidStatus),
            4004 => Ok(ErrorCode::VisitNotClosedStatus),
            4005 => Ok(ErrorCode::InvalidSource),

            // Timer
            5001 => Ok(ErrorCode::TimerNotFound),
            5002 => Ok(ErrorCode::TimerAlreadyStopped),
            5003 => Ok(ErrorCode::InvalidTimerType),

            // Note
            6001 => Ok(ErrorCode::NoteNotFound),

            // Workflow
            7001 => Ok(ErrorCode::WorkflowConfigInvalid),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::VisitNotFound.code(), 4001);
        assert_eq!(ErrorCode::TimerAlreadyStopped.code(), 5002);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
    }

    #[test]
    fn test_try_from_roundtrips_known_codes() {
        for code in [
            ErrorCode::ValidationFailed,
            ErrorCode::InvalidTenant,
            ErrorCode::VisitAlreadyClosed,
            ErrorCode::InvalidTimerType,
            ErrorCode::NoteNotFound,
            ErrorCode::WorkflowConfigInvalid,
            ErrorCode::TimeoutError,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_unknown_code() {
        assert_eq!(ErrorCode::try_from(4999), Err(InvalidErrorCode(4999)));
        assert_eq!(
            InvalidErrorCode(4999).to_string(),
            "invalid error code: 4999"
        );
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::VisitNotFound).unwrap();
        assert_eq!(json, "4001");

        let code: ErrorCode = serde_json::from_str("5001").unwrap();
        assert_eq!(code, ErrorCode::TimerNotFound);

        assert!(serde_json::from_str::<ErrorCode>("12345").is_err());
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::VisitNotFound.is_success());
    }
}
