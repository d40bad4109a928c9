//! Staff identity middleware
//!
//! Reads `X-Dealership-Id` (required) and `X-Staff-Id` (optional) and
//! attaches a [`StaffContext`] to the request. Authentication proper happens
//! upstream of this service; the headers are trusted once well-formed.

use axum::{extract::Request, middleware::Next, response::Response};
use shared::error::{AppError, ErrorCode};

use crate::services::StaffContext;
use crate::utils::validation::validate_dealership_id;

pub const DEALERSHIP_HEADER: &str = "x-dealership-id";
pub const STAFF_HEADER: &str = "x-staff-id";

pub async fn identity_middleware(mut request: Request, next: Next) -> Result<Response, AppError> {
    let ctx = staff_context(request.headers())?;
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

fn staff_context(headers: &http::HeaderMap) -> Result<StaffContext, AppError> {
    let dealership_id = headers
        .get(DEALERSHIP_HEADER)
        .ok_or_else(|| AppError::new(ErrorCode::TenantNotSelected))?
        .to_str()
        .map_err(|_| AppError::new(ErrorCode::InvalidTenant))?
        .trim();
    validate_dealership_id(dealership_id)?;

    let staff_id = match headers.get(STAFF_HEADER) {
        None => None,
        Some(value) => {
            let id = value
                .to_str()
                .ok()
                .and_then(|v| v.trim().parse::<i64>().ok())
                .ok_or_else(|| AppError::validation("X-Staff-Id must be an integer"))?;
            Some(id)
        }
    };

    Ok(StaffContext::new(dealership_id, staff_id))
}
