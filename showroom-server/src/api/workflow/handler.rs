//! Workflow Config API Handlers

use axum::{Extension, Json, extract::State};
use shared::models::{WorkflowConfig, WorkflowConfigUpdate};

use crate::api::ApiResult;
use crate::api::extract::Payload;
use crate::services::StaffContext;
use crate::state::AppState;

/// GET /api/workflow-config - effective config (own, global default, or built-in)
pub async fn get_config(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
) -> ApiResult<WorkflowConfig> {
    let config = state.services.workflow.get(&ctx.dealership_id).await?;
    Ok(Json(config))
}

/// PUT /api/workflow-config
pub async fn upsert_config(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
    Payload(payload): Payload<WorkflowConfigUpdate>,
) -> ApiResult<WorkflowConfig> {
    let config = state.services.workflow.upsert(&ctx, payload).await?;
    Ok(Json(config))
}
