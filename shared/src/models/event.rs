//! Visit Event Model (append-only audit record)
//!
//! Every successful mutation of a visit writes exactly one event. The ordered
//! set of events for a visit is its canonical timeline.

use serde::{Deserialize, Serialize};

/// Audit event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum EventType {
    VisitCreated,
    VisitUpdated,
    StatusChanged,
    VehicleAttached,
    VisitClosed,
    TimerStarted,
    TimerStopped,
    NoteAdded,
    NoteUpdated,
    NoteDeleted,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VisitCreated => "VISIT_CREATED",
            Self::VisitUpdated => "VISIT_UPDATED",
            Self::StatusChanged => "STATUS_CHANGED",
            Self::VehicleAttached => "VEHICLE_ATTACHED",
            Self::VisitClosed => "VISIT_CLOSED",
            Self::TimerStarted => "TIMER_STARTED",
            Self::TimerStopped => "TIMER_STOPPED",
            Self::NoteAdded => "NOTE_ADDED",
            Self::NoteUpdated => "NOTE_UPDATED",
            Self::NoteDeleted => "NOTE_DELETED",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct VisitEvent {
    pub id: i64,
    pub visit_id: i64,
    pub event_type: EventType,
    pub staff_id: Option<i64>,
    pub previous_value: Option<String>,
    pub new_value: Option<String>,
    pub metadata: Option<serde_json::Value>,
    /// Unix millis
    pub created_at: i64,
}

/// Event fields supplied by the writer; id and timestamp are assigned on append
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub visit_id: i64,
    pub event_type: EventType,
    pub staff_id: Option<i64>,
    pub previous_value: Option<String>,
    pub new_value: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl NewEvent {
    pub fn new(visit_id: i64, event_type: EventType, staff_id: Option<i64>) -> Self {
        Self {
            visit_id,
            event_type,
            staff_id,
            previous_value: None,
            new_value: None,
            metadata: None,
        }
    }

    pub fn values(mut self, previous: impl Into<String>, new: impl Into<String>) -> Self {
        self.previous_value = Some(previous.into());
        self.new_value = Some(new.into());
        self
    }

    pub fn previous(mut self, previous: impl Into<String>) -> Self {
        self.previous_value = Some(previous.into());
        self
    }

    pub fn new_value(mut self, new: impl Into<String>) -> Self {
        self.new_value = Some(new.into());
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Materialize into a stored record
    pub fn into_event(self, id: i64, created_at: i64) -> VisitEvent {
        VisitEvent {
            id,
            visit_id: self.visit_id,
            event_type: self.event_type,
            staff_id: self.staff_id,
            previous_value: self.previous_value,
            new_value: self.new_value,
            metadata: self.metadata,
            created_at,
        }
    }
}
