//! Note API Handlers

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::models::{Note, NoteCreate, NoteUpdate};

use crate::api::ApiResult;
use crate::api::extract::Payload;
use crate::services::StaffContext;
use crate::state::AppState;

/// GET /api/visits/{id}/notes - pinned first, then newest
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
    Path(visit_id): Path<i64>,
) -> ApiResult<Vec<Note>> {
    let notes = state.services.notes.list(&ctx, visit_id).await?;
    Ok(Json(notes))
}

/// POST /api/visits/{id}/notes
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
    Path(visit_id): Path<i64>,
    Payload(payload): Payload<NoteCreate>,
) -> ApiResult<Note> {
    let note = state.services.notes.create(&ctx, visit_id, payload).await?;
    Ok(Json(note))
}

/// PATCH /api/visits/{id}/notes/{note_id}
pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
    Path((visit_id, note_id)): Path<(i64, i64)>,
    Payload(payload): Payload<NoteUpdate>,
) -> ApiResult<Note> {
    let note = state
        .services
        .notes
        .update(&ctx, visit_id, note_id, payload)
        .await?;
    Ok(Json(note))
}

/// DELETE /api/visits/{id}/notes/{note_id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
    Path((visit_id, note_id)): Path<(i64, i64)>,
) -> ApiResult<Note> {
    let note = state.services.notes.delete(&ctx, visit_id, note_id).await?;
    Ok(Json(note))
}
