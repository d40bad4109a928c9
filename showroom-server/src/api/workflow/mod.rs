//! Workflow configuration API

mod handler;

use axum::{Router, routing::get};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/workflow-config",
        get(handler::get_config).put(handler::upsert_config),
    )
}
