//! Timer Model (timed sub-activity inside a visit)

use serde::{Deserialize, Serialize};

/// Timed activity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum TimerType {
    /// Started automatically at check-in
    WaitTime,
    TestDrive,
    Negotiation,
    Paperwork,
    ManagerWait,
}

impl TimerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaitTime => "WAIT_TIME",
            Self::TestDrive => "TEST_DRIVE",
            Self::Negotiation => "NEGOTIATION",
            Self::Paperwork => "PAPERWORK",
            Self::ManagerWait => "MANAGER_WAIT",
        }
    }
}

impl std::fmt::Display for TimerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timer record
///
/// `duration_seconds` is present iff `end_time` is, and equals
/// `(end_time - start_time) / 1000`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Timer {
    pub id: i64,
    pub visit_id: i64,
    pub timer_type: TimerType,
    /// Unix millis
    pub start_time: i64,
    /// Unix millis
    pub end_time: Option<i64>,
    pub duration_seconds: Option<i64>,
    /// Staff member who started the activity
    pub staff_id: Option<i64>,
}

impl Timer {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// Start timer payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerStart {
    pub timer_type: TimerType,
}

/// `TIMER_STARTED` / `TIMER_STOPPED` broadcast payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerPayload {
    pub visit_id: i64,
    pub timer: Timer,
}

/// First open timer in most-recently-started order
pub fn active_timer(timers: &[Timer]) -> Option<&Timer> {
    let mut open: Vec<&Timer> = timers.iter().filter(|t| t.is_open()).collect();
    open.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.cmp(&a.id)));
    open.into_iter().next()
}
