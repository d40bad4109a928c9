//! Timer API Handlers

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::models::{Timer, TimerStart};

use crate::api::ApiResult;
use crate::api::extract::Payload;
use crate::services::StaffContext;
use crate::state::AppState;

/// GET /api/visits/{id}/timers - most recently started first
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
    Path(visit_id): Path<i64>,
) -> ApiResult<Vec<Timer>> {
    let timers = state.services.timers.list_for_visit(&ctx, visit_id).await?;
    Ok(Json(timers))
}

/// POST /api/visits/{id}/timers
pub async fn start(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
    Path(visit_id): Path<i64>,
    Payload(payload): Payload<TimerStart>,
) -> ApiResult<Timer> {
    let timer = state
        .services
        .timers
        .start(&ctx, visit_id, payload.timer_type)
        .await?;
    Ok(Json(timer))
}

/// POST /api/visits/{id}/timers/{timer_id}/stop
pub async fn stop(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
    Path((visit_id, timer_id)): Path<(i64, i64)>,
) -> ApiResult<Timer> {
    let timer = state.services.timers.stop(&ctx, visit_id, timer_id).await?;
    Ok(Json(timer))
}
