//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            Self::NotFound | Self::VisitNotFound | Self::TimerNotFound | Self::NoteNotFound => {
                StatusCode::NOT_FOUND
            }

            Self::AlreadyExists | Self::VisitAlreadyClosed | Self::TimerAlreadyStopped => {
                StatusCode::CONFLICT
            }

            Self::NotAuthenticated | Self::TenantNotSelected => StatusCode::UNAUTHORIZED,

            Self::TimeoutError => StatusCode::SERVICE_UNAVAILABLE,

            Self::InternalError | Self::DatabaseError | Self::ConfigError | Self::Unknown => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (default for validation/business errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
