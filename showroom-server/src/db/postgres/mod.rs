//! PostgreSQL store (sqlx)
//!
//! Each table gets a module of free functions over `&PgPool`; `PgStore`
//! wires them to the `Store` trait.

mod events;
mod notes;
mod timers;
mod visits;
mod workflow;

use async_trait::async_trait;
use shared::models::{
    Note, NoteUpdate, Timer, Visit, VisitEvent, VisitStatus, VisitUpdate, WorkflowConfig,
};
use sqlx::PgPool;

use super::{BoxError, CloseOutcome, StatusTransition, Store, StoreResult, VisitQuery};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and apply embedded migrations
    pub async fn connect(database_url: &str) -> Result<Self, BoxError> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_visit(&self, visit: &Visit) -> StoreResult<()> {
        visits::insert(&self.pool, visit).await
    }

    async fn get_visit(&self, dealership_id: &str, visit_id: i64) -> StoreResult<Option<Visit>> {
        visits::find(&self.pool, dealership_id, visit_id).await
    }

    async fn list_visits(
        &self,
        dealership_id: &str,
        query: &VisitQuery,
    ) -> StoreResult<(Vec<Visit>, u64)> {
        visits::list(&self.pool, dealership_id, query).await
    }

    async fn update_visit(
        &self,
        dealership_id: &str,
        visit_id: i64,
        patch: &VisitUpdate,
        now: i64,
    ) -> StoreResult<Option<Visit>> {
        visits::update(&self.pool, dealership_id, visit_id, patch, now).await
    }

    async fn set_status(
        &self,
        dealership_id: &str,
        visit_id: i64,
        status: VisitStatus,
        workflow_stage: i32,
        now: i64,
    ) -> StoreResult<Option<StatusTransition>> {
        visits::set_status(&self.pool, dealership_id, visit_id, status, workflow_stage, now).await
    }

    async fn attach_vehicle(
        &self,
        dealership_id: &str,
        visit_id: i64,
        vehicle_id: i64,
        stock_number: Option<&str>,
        now: i64,
    ) -> StoreResult<Option<Visit>> {
        visits::attach_vehicle(&self.pool, dealership_id, visit_id, vehicle_id, stock_number, now)
            .await
    }

    async fn close_visit(
        &self,
        dealership_id: &str,
        visit_id: i64,
        status: VisitStatus,
        workflow_stage: i32,
        now: i64,
    ) -> StoreResult<Option<CloseOutcome>> {
        visits::close(&self.pool, dealership_id, visit_id, status, workflow_stage, now).await
    }

    async fn insert_timer(&self, timer: &Timer) -> StoreResult<()> {
        timers::insert(&self.pool, timer).await
    }

    async fn get_timer(&self, visit_id: i64, timer_id: i64) -> StoreResult<Option<Timer>> {
        timers::find(&self.pool, visit_id, timer_id).await
    }

    async fn list_timers(&self, visit_id: i64) -> StoreResult<Vec<Timer>> {
        timers::list_for_visit(&self.pool, visit_id).await
    }

    async fn list_open_timers(&self, visit_ids: &[i64]) -> StoreResult<Vec<Timer>> {
        timers::list_open(&self.pool, visit_ids).await
    }

    async fn stop_timer(
        &self,
        visit_id: i64,
        timer_id: i64,
        end_time: i64,
    ) -> StoreResult<Option<Timer>> {
        timers::stop(&self.pool, visit_id, timer_id, end_time).await
    }

    async fn insert_note(&self, note: &Note) -> StoreResult<()> {
        notes::insert(&self.pool, note).await
    }

    async fn get_note(&self, visit_id: i64, note_id: i64) -> StoreResult<Option<Note>> {
        notes::find(&self.pool, visit_id, note_id).await
    }

    async fn update_note(
        &self,
        visit_id: i64,
        note_id: i64,
        patch: &NoteUpdate,
        now: i64,
    ) -> StoreResult<Option<Note>> {
        notes::update(&self.pool, visit_id, note_id, patch, now).await
    }

    async fn delete_note(&self, visit_id: i64, note_id: i64) -> StoreResult<Option<Note>> {
        notes::delete(&self.pool, visit_id, note_id).await
    }

    async fn list_notes(&self, visit_id: i64) -> StoreResult<Vec<Note>> {
        notes::list_for_visit(&self.pool, visit_id).await
    }

    async fn append_event(&self, event: &VisitEvent) -> StoreResult<()> {
        events::append(&self.pool, event).await
    }

    async fn list_events(&self, visit_id: i64) -> StoreResult<Vec<VisitEvent>> {
        events::list_for_visit(&self.pool, visit_id).await
    }

    async fn get_workflow_config(
        &self,
        dealership_id: &str,
    ) -> StoreResult<Option<WorkflowConfig>> {
        workflow::find(&self.pool, dealership_id).await
    }

    async fn upsert_workflow_config(&self, config: &WorkflowConfig) -> StoreResult<()> {
        workflow::upsert(&self.pool, config).await
    }
}
