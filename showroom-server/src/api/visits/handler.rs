//! Visit API Handlers

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::models::{
    PaginatedResponse, StatusChange, VehicleAttach, VisitClose, VisitCreate, VisitDetail,
    VisitFilter, VisitUpdate,
};

use crate::api::ApiResult;
use crate::api::extract::{Params, Payload};
use crate::services::StaffContext;
use crate::state::AppState;

/// GET /api/visits
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
    Params(filter): Params<VisitFilter>,
) -> ApiResult<PaginatedResponse<VisitDetail>> {
    let page = state.services.visits.list(&ctx, filter).await?;
    Ok(Json(page))
}

/// POST /api/visits
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
    Payload(payload): Payload<VisitCreate>,
) -> ApiResult<VisitDetail> {
    let detail = state.services.visits.create(&ctx, payload).await?;
    Ok(Json(detail))
}

/// GET /api/visits/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
    Path(id): Path<i64>,
) -> ApiResult<VisitDetail> {
    let detail = state.services.visits.get(&ctx, id).await?;
    Ok(Json(detail))
}

/// PATCH /api/visits/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
    Path(id): Path<i64>,
    Payload(payload): Payload<VisitUpdate>,
) -> ApiResult<VisitDetail> {
    let detail = state.services.visits.update(&ctx, id, payload).await?;
    Ok(Json(detail))
}

/// POST /api/visits/{id}/status
pub async fn change_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
    Path(id): Path<i64>,
    Payload(payload): Payload<StatusChange>,
) -> ApiResult<VisitDetail> {
    let detail = state
        .services
        .visits
        .change_status(&ctx, id, payload.status)
        .await?;
    Ok(Json(detail))
}

/// POST /api/visits/{id}/vehicle
pub async fn attach_vehicle(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
    Path(id): Path<i64>,
    Payload(payload): Payload<VehicleAttach>,
) -> ApiResult<VisitDetail> {
    let detail = state
        .services
        .visits
        .attach_vehicle(&ctx, id, payload.vehicle_id, payload.stock_number)
        .await?;
    Ok(Json(detail))
}

/// POST /api/visits/{id}/close
pub async fn close(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
    Path(id): Path<i64>,
    Payload(payload): Payload<VisitClose>,
) -> ApiResult<VisitDetail> {
    let detail = state.services.visits.close(&ctx, id, payload.status).await?;
    Ok(Json(detail))
}
