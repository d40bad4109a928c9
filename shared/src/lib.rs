//! Shared types for the showroom service
//!
//! Domain models, error codes, the live dashboard protocol and small
//! time/ID utilities used by the server and its clients.

pub mod error;
pub mod live;
pub mod models;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::PaginatedResponse;
