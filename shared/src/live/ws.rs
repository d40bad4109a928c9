//! Dashboard WebSocket protocol
//!
//! Server → Dashboard: `LiveMessage` (`{"type": <EVENT>, "data": <payload>}`)
//! Dashboard → Server: `LiveCommand` (room subscription)

use serde::{Deserialize, Serialize};

/// Dashboard → Server command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LiveCommand {
    /// Join the dealership room, leaving any previous one
    Subscribe { dealership_id: String },
}

/// Pushed event kind (wire name of the `type` field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LiveEventType {
    Subscribed,
    VisitCreated,
    VisitUpdated,
    StatusChanged,
    VisitClosed,
    TimerStarted,
    TimerStopped,
    NoteAdded,
    NoteUpdated,
    NoteDeleted,
}

impl LiveEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subscribed => "SUBSCRIBED",
            Self::VisitCreated => "VISIT_CREATED",
            Self::VisitUpdated => "VISIT_UPDATED",
            Self::StatusChanged => "STATUS_CHANGED",
            Self::VisitClosed => "VISIT_CLOSED",
            Self::TimerStarted => "TIMER_STARTED",
            Self::TimerStopped => "TIMER_STOPPED",
            Self::NoteAdded => "NOTE_ADDED",
            Self::NoteUpdated => "NOTE_UPDATED",
            Self::NoteDeleted => "NOTE_DELETED",
        }
    }
}

impl std::fmt::Display for LiveEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server → Dashboard envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveMessage<T> {
    #[serde(rename = "type")]
    pub event_type: LiveEventType,
    pub data: T,
}

impl<T> LiveMessage<T> {
    pub fn new(event_type: LiveEventType, data: T) -> Self {
        Self { event_type, data }
    }
}

/// `SUBSCRIBED` acknowledgement payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscribedPayload {
    pub dealership_id: String,
}
