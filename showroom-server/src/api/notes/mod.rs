//! Note API (nested under a visit)

mod handler;

use axum::{Router, routing::get};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/visits/{id}/notes",
            get(handler::list).post(handler::create),
        )
        .route(
            "/api/visits/{id}/notes/{note_id}",
            axum::routing::patch(handler::update).delete(handler::delete),
        )
}
