//! Visit API
//!
//! | Path | Method | Operation |
//! |------|--------|-----------|
//! | /api/visits | GET | filtered page, newest check-in first |
//! | /api/visits | POST | check a customer in |
//! | /api/visits/{id} | GET | visit with its active timer |
//! | /api/visits/{id} | PATCH | update assignable fields |
//! | /api/visits/{id}/status | POST | change status |
//! | /api/visits/{id}/vehicle | POST | attach vehicle |
//! | /api/visits/{id}/close | POST | close as won or lost |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/visits", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", get(handler::get_by_id).patch(handler::update))
        .route("/{id}/status", post(handler::change_status))
        .route("/{id}/vehicle", post(handler::attach_vehicle))
        .route("/{id}/close", post(handler::close))
}
