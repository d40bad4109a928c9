//! Note Model

use serde::{Deserialize, Serialize};

/// Free-text annotation on a visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Note {
    pub id: i64,
    pub visit_id: i64,
    /// Staff author
    pub author_id: Option<i64>,
    pub content: String,
    pub is_pinned: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create note payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteCreate {
    pub content: String,
    #[serde(default)]
    pub is_pinned: bool,
}

/// Update note payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteUpdate {
    pub content: Option<String>,
    pub is_pinned: Option<bool>,
}

impl NoteUpdate {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.is_pinned.is_none()
    }
}

/// `NOTE_ADDED` / `NOTE_UPDATED` broadcast payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotePayload {
    pub visit_id: i64,
    pub note: Note,
}

/// `NOTE_DELETED` broadcast payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteDeletedPayload {
    pub visit_id: i64,
    pub note_id: i64,
}

/// Pinned first, then newest first
pub fn sort_notes(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then(b.created_at.cmp(&a.created_at))
            .then(b.id.cmp(&a.id))
    });
}
