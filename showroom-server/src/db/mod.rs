//! Persistence layer
//!
//! `Store` is the seam between the services and storage. Visit-scoped
//! lookups take the dealership id alongside the visit id and return
//! `Ok(None)` when the pair does not match, so a visit owned by another
//! dealership is indistinguishable from a missing one. Child records
//! (timers, notes, events) are addressed through their visit, which the
//! services resolve under the dealership first.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use shared::models::{
    Note, NoteUpdate, Timer, Visit, VisitEvent, VisitStatus, VisitUpdate, WorkflowConfig,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type StoreResult<T> = Result<T, BoxError>;

/// Resolved list filter (paging already clamped)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitQuery {
    pub status: Option<VisitStatus>,
    pub active_only: bool,
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub limit: u32,
    pub offset: u64,
}

impl VisitQuery {
    pub fn matches(&self, visit: &Visit) -> bool {
        self.status.is_none_or(|s| visit.status == s)
            && (!self.active_only || visit.check_out_time.is_none())
            && self.from.is_none_or(|from| visit.check_in_time >= from)
            && self.to.is_none_or(|to| visit.check_in_time < to)
    }
}

/// Visit after a status write, with the status it replaced
#[derive(Debug, Clone)]
pub struct StatusTransition {
    pub visit: Visit,
    pub previous_status: VisitStatus,
}

/// Outcome of the atomic close
#[derive(Debug, Clone)]
pub enum CloseOutcome {
    Closed {
        visit: Visit,
        previous_status: VisitStatus,
        /// Timers that were open and got stopped by the close
        stopped: Vec<Timer>,
    },
    /// Visit was already in a terminal status; nothing changed
    AlreadyClosed(Visit),
}

#[async_trait]
pub trait Store: Send + Sync {
    // ── Visits ──

    async fn insert_visit(&self, visit: &Visit) -> StoreResult<()>;

    async fn get_visit(&self, dealership_id: &str, visit_id: i64) -> StoreResult<Option<Visit>>;

    /// Newest check-in first; returns the page and the total match count
    async fn list_visits(
        &self,
        dealership_id: &str,
        query: &VisitQuery,
    ) -> StoreResult<(Vec<Visit>, u64)>;

    /// Apply the present fields of `patch`
    async fn update_visit(
        &self,
        dealership_id: &str,
        visit_id: i64,
        patch: &VisitUpdate,
        now: i64,
    ) -> StoreResult<Option<Visit>>;

    /// Set status and stage
    ///
    /// A non-terminal status clears the check-out time; a terminal one keeps
    /// an existing check-out time or stamps `now`. Open timers are untouched,
    /// so closing an open visit goes through `close_visit`.
    async fn set_status(
        &self,
        dealership_id: &str,
        visit_id: i64,
        status: VisitStatus,
        workflow_stage: i32,
        now: i64,
    ) -> StoreResult<Option<StatusTransition>>;

    async fn attach_vehicle(
        &self,
        dealership_id: &str,
        visit_id: i64,
        vehicle_id: i64,
        stock_number: Option<&str>,
        now: i64,
    ) -> StoreResult<Option<Visit>>;

    /// Set the terminal status and check-out time and stop every open timer,
    /// all in one unit
    async fn close_visit(
        &self,
        dealership_id: &str,
        visit_id: i64,
        status: VisitStatus,
        workflow_stage: i32,
        now: i64,
    ) -> StoreResult<Option<CloseOutcome>>;

    // ── Timers ──

    async fn insert_timer(&self, timer: &Timer) -> StoreResult<()>;

    async fn get_timer(&self, visit_id: i64, timer_id: i64) -> StoreResult<Option<Timer>>;

    /// Most recently started first
    async fn list_timers(&self, visit_id: i64) -> StoreResult<Vec<Timer>>;

    /// Open timers of several visits (any order)
    async fn list_open_timers(&self, visit_ids: &[i64]) -> StoreResult<Vec<Timer>>;

    /// Stop an open timer; `None` if absent or already stopped
    async fn stop_timer(
        &self,
        visit_id: i64,
        timer_id: i64,
        end_time: i64,
    ) -> StoreResult<Option<Timer>>;

    // ── Notes ──

    async fn insert_note(&self, note: &Note) -> StoreResult<()>;

    async fn get_note(&self, visit_id: i64, note_id: i64) -> StoreResult<Option<Note>>;

    async fn update_note(
        &self,
        visit_id: i64,
        note_id: i64,
        patch: &NoteUpdate,
        now: i64,
    ) -> StoreResult<Option<Note>>;

    /// Hard delete; returns the removed row
    async fn delete_note(&self, visit_id: i64, note_id: i64) -> StoreResult<Option<Note>>;

    /// Pinned first, then newest first
    async fn list_notes(&self, visit_id: i64) -> StoreResult<Vec<Note>>;

    // ── Events (append-only) ──

    async fn append_event(&self, event: &VisitEvent) -> StoreResult<()>;

    /// Newest first
    async fn list_events(&self, visit_id: i64) -> StoreResult<Vec<VisitEvent>>;

    // ── Workflow config ──

    /// Dealership row, else the global default row
    async fn get_workflow_config(&self, dealership_id: &str)
    -> StoreResult<Option<WorkflowConfig>>;

    async fn upsert_workflow_config(&self, config: &WorkflowConfig) -> StoreResult<()>;
}
