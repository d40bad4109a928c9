//! Dashboard live connection
//!
//! The upgrade itself is unauthenticated; a connection receives nothing
//! until it sends a `SUBSCRIBE` command naming its dealership.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;
use axum::{Router, routing::get};

use crate::hub::session;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(handle_ws))
}

/// GET /ws - upgrade to WebSocket
pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let max = state.live.max_message_bytes;
    ws.max_message_size(max)
        .max_frame_size(max)
        .on_upgrade(move |socket| session::serve(socket, state.hub, state.live))
}
