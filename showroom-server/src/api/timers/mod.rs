//! Timer API (nested under a visit)

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/visits/{id}/timers",
            get(handler::list).post(handler::start),
        )
        .route("/api/visits/{id}/timers/{timer_id}/stop", post(handler::stop))
}
