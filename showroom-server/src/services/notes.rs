//! Visit notes

use std::sync::Arc;

use shared::error::AppError;
use shared::live::LiveEventType;
use shared::models::{
    EventType, NewEvent, Note, NoteCreate, NoteDeletedPayload, NotePayload, NoteUpdate,
};
use shared::util::{now_millis, snowflake_id};

use super::{EventLog, StaffContext, require_visit};
use crate::db::Store;
use crate::error::ServiceResult;
use crate::hub::Hub;
use crate::utils::validation::{MAX_NOTE_LEN, validate_required_text};

#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn Store>,
    hub: Hub,
    events: EventLog,
}

impl NoteService {
    pub fn new(store: Arc<dyn Store>, hub: Hub, events: EventLog) -> Self {
        Self { store, hub, events }
    }

    pub async fn create(
        &self,
        ctx: &StaffContext,
        visit_id: i64,
        data: NoteCreate,
    ) -> ServiceResult<Note> {
        validate_required_text(&data.content, "content", MAX_NOTE_LEN)?;
        require_visit(self.store.as_ref(), ctx, visit_id).await?;

        let note = self
            .insert_untracked(visit_id, ctx.staff_id, &data.content, data.is_pinned)
            .await?;

        self.events
            .record(
                NewEvent::new(visit_id, EventType::NoteAdded, ctx.staff_id)
                    .new_value(note.content.clone())
                    .metadata(serde_json::json!({
                        "note_id": note.id,
                        "is_pinned": note.is_pinned,
                    })),
            )
            .await?;

        self.hub.broadcast(
            &ctx.dealership_id,
            LiveEventType::NoteAdded,
            &NotePayload {
                visit_id,
                note: note.clone(),
            },
        );
        Ok(note)
    }

    pub async fn update(
        &self,
        ctx: &StaffContext,
        visit_id: i64,
        note_id: i64,
        mut patch: NoteUpdate,
    ) -> ServiceResult<Note> {
        if patch.is_empty() {
            return Err(AppError::validation("No fields to update").into());
        }
        if let Some(content) = &patch.content {
            validate_required_text(content, "content", MAX_NOTE_LEN)?;
            patch.content = Some(content.trim().to_string());
        }
        require_visit(self.store.as_ref(), ctx, visit_id).await?;

        let previous = self
            .store
            .get_note(visit_id, note_id)
            .await?
            .ok_or_else(|| AppError::note_not_found(note_id))?;
        let note = self
            .store
            .update_note(visit_id, note_id, &patch, now_millis())
            .await?
            .ok_or_else(|| AppError::note_not_found(note_id))?;

        let mut event = NewEvent::new(visit_id, EventType::NoteUpdated, ctx.staff_id).metadata(
            serde_json::json!({
                "note_id": note.id,
                "is_pinned": note.is_pinned,
            }),
        );
        if patch.content.is_some() {
            event = event.values(previous.content, note.content.clone());
        }
        self.events.record(event).await?;

        self.hub.broadcast(
            &ctx.dealership_id,
            LiveEventType::NoteUpdated,
            &NotePayload {
                visit_id,
                note: note.clone(),
            },
        );
        Ok(note)
    }

    pub async fn delete(
        &self,
        ctx: &StaffContext,
        visit_id: i64,
        note_id: i64,
    ) -> ServiceResult<Note> {
        require_visit(self.store.as_ref(), ctx, visit_id).await?;

        let note = self
            .store
            .delete_note(visit_id, note_id)
            .await?
            .ok_or_else(|| AppError::note_not_found(note_id))?;

        self.events
            .record(
                NewEvent::new(visit_id, EventType::NoteDeleted, ctx.staff_id)
                    .previous(note.content.clone())
                    .metadata(serde_json::json!({ "note_id": note.id })),
            )
            .await?;

        self.hub.broadcast(
            &ctx.dealership_id,
            LiveEventType::NoteDeleted,
            &NoteDeletedPayload { visit_id, note_id },
        );
        Ok(note)
    }

    /// Pinned first, then newest first
    pub async fn list(&self, ctx: &StaffContext, visit_id: i64) -> ServiceResult<Vec<Note>> {
        require_visit(self.store.as_ref(), ctx, visit_id).await?;
        Ok(self.store.list_notes(visit_id).await?)
    }

    /// Persist a note without an event or broadcast (check-in note)
    pub(crate) async fn insert_untracked(
        &self,
        visit_id: i64,
        author_id: Option<i64>,
        content: &str,
        is_pinned: bool,
    ) -> ServiceResult<Note> {
        let now = now_millis();
        let note = Note {
            id: snowflake_id(),
            visit_id,
            author_id,
            content: content.trim().to_string(),
            is_pinned,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_note(&note).await?;
        Ok(note)
    }
}
