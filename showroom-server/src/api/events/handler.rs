use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::models::VisitEvent;

use crate::api::ApiResult;
use crate::services::StaffContext;
use crate::state::AppState;

/// GET /api/visits/{id}/events - newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
    Path(visit_id): Path<i64>,
) -> ApiResult<Vec<VisitEvent>> {
    let events = state.services.events.list_for_visit(&ctx, visit_id).await?;
    Ok(Json(events))
}
