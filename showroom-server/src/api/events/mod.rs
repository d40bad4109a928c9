//! Visit timeline API

mod handler;

use axum::{Router, routing::get};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/visits/{id}/events", get(handler::list))
}
