//! HTTP and WebSocket routes
//!
//! # Structure
//!
//! - [`health`] - liveness and live connection count
//! - [`ws`] - dashboard live connection upgrade
//! - [`visits`] - visit lifecycle
//! - [`timers`] - activity timers of a visit
//! - [`notes`] - notes of a visit
//! - [`events`] - audit timeline of a visit
//! - [`workflow`] - per-dealership workflow configuration
//!
//! Everything under `/api` runs behind [`identity::identity_middleware`],
//! which attaches the caller's [`StaffContext`](crate::services::StaffContext).

pub mod events;
pub mod extract;
pub mod health;
pub mod identity;
pub mod notes;
pub mod timers;
pub mod visits;
pub mod workflow;
pub mod ws;

use axum::{Router, middleware};
use shared::error::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub type ApiResult<T> = Result<axum::Json<T>, AppError>;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(visits::router())
        .merge(timers::router())
        .merge(notes::router())
        .merge(events::router())
        .merge(workflow::router())
        .layer(middleware::from_fn(identity::identity_middleware));

    Router::new()
        .merge(health::router())
        .merge(ws::router())
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
