//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Authentication errors
/// - 3xxx: Tenant errors
/// - 4xxx: Visit errors
/// - 5xxx: Timer errors
/// - 6xxx: Note errors
/// - 7xxx: Workflow errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx, 2xxx)
    Auth,
    /// Tenant errors (3xxx)
    Tenant,
    /// Visit errors (4xxx)
    Visit,
    /// Timer errors (5xxx)
    Timer,
    /// Note errors (6xxx)
    Note,
    /// Workflow errors (7xxx, 8xxx)
    Workflow,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..3000 => Self::Auth,
            3000..4000 => Self::Tenant,
            4000..5000 => Self::Visit,
            5000..6000 => Self::Timer,
            6000..7000 => Self::Note,
            7000..9000 => Self::Workflow,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Tenant => "tenant",
            Self::Visit => "visit",
            Self::Timer => "timer",
            Self::Note => "note",
            Self::Workflow => "workflow",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
