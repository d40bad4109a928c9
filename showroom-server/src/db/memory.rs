//! In-memory store
//!
//! Backs tests and development runs without `DATABASE_URL`. All state
//! sits behind one `RwLock`, so every method is atomic in the same way a
//! single SQL statement (or the close transaction) is.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::models::{
    Note, NoteUpdate, Timer, Visit, VisitEvent, VisitStatus, VisitUpdate, WorkflowConfig,
    sort_notes,
};
use shared::util::elapsed_seconds;

use super::{CloseOutcome, StatusTransition, Store, StoreResult, VisitQuery};

/// Injected failures
#[derive(Debug, thiserror::Error)]
pub enum MemoryStoreError {
    #[error("memory store: writes disabled")]
    WritesDisabled,
    #[error("memory store: event log unavailable")]
    EventLogUnavailable,
    #[error("memory store: duplicate {table} id {id}")]
    DuplicateId { table: &'static str, id: i64 },
}

#[derive(Default)]
struct MemoryData {
    visits: HashMap<i64, Visit>,
    timers: HashMap<i64, Timer>,
    notes: HashMap<i64, Note>,
    events: Vec<VisitEvent>,
    /// `None` key holds the global default
    workflow: HashMap<Option<String>, WorkflowConfig>,
}

impl MemoryData {
    fn visit_mut(&mut self, dealership_id: &str, visit_id: i64) -> Option<&mut Visit> {
        self.visits
            .get_mut(&visit_id)
            .filter(|v| v.dealership_id == dealership_id)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
    fail_writes: AtomicBool,
    fail_events: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write except event appends fail (fault injection)
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make event appends fail (fault injection)
    pub fn fail_events(&self, fail: bool) {
        self.fail_events.store(fail, Ordering::SeqCst);
    }

    /// Total events across all visits
    pub fn event_count(&self) -> usize {
        self.data.read().events.len()
    }

    fn check_write(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(MemoryStoreError::WritesDisabled.into());
        }
        Ok(())
    }
}

/// Insert keyed by id, refusing to replace an existing row
fn insert_new<T: Clone>(
    rows: &mut HashMap<i64, T>,
    id: i64,
    row: &T,
    table: &'static str,
) -> StoreResult<()> {
    match rows.entry(id) {
        Entry::Occupied(_) => Err(MemoryStoreError::DuplicateId { table, id }.into()),
        Entry::Vacant(slot) => {
            slot.insert(row.clone());
            Ok(())
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_visit(&self, visit: &Visit) -> StoreResult<()> {
        self.check_write()?;
        insert_new(&mut self.data.write().visits, visit.id, visit, "visits")
    }

    async fn get_visit(&self, dealership_id: &str, visit_id: i64) -> StoreResult<Option<Visit>> {
        Ok(self
            .data
            .read()
            .visits
            .get(&visit_id)
            .filter(|v| v.dealership_id == dealership_id)
            .cloned())
    }

    async fn list_visits(
        &self,
        dealership_id: &str,
        query: &VisitQuery,
    ) -> StoreResult<(Vec<Visit>, u64)> {
        let data = self.data.read();
        let mut rows: Vec<&Visit> = data
            .visits
            .values()
            .filter(|v| v.dealership_id == dealership_id && query.matches(v))
            .collect();
        rows.sort_by(|a, b| {
            b.check_in_time
                .cmp(&a.check_in_time)
                .then(b.id.cmp(&a.id))
        });
        let total = rows.len() as u64;
        let page = rows
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn update_visit(
        &self,
        dealership_id: &str,
        visit_id: i64,
        patch: &VisitUpdate,
        now: i64,
    ) -> StoreResult<Option<Visit>> {
        self.check_write()?;
        let mut data = self.data.write();
        let Some(visit) = data.visit_mut(dealership_id, visit_id) else {
            return Ok(None);
        };
        if let Some(v) = patch.salesperson_id {
            visit.salesperson_id = Some(v);
        }
        if let Some(v) = patch.vehicle_id {
            visit.vehicle_id = Some(v);
        }
        if let Some(v) = &patch.stock_number {
            visit.stock_number = Some(v.clone());
        }
        if let Some(v) = patch.source {
            visit.source = Some(v);
        }
        if let Some(v) = patch.appointment_id {
            visit.appointment_id = Some(v);
        }
        visit.updated_at = now;
        Ok(Some(visit.clone()))
    }

    async fn set_status(
        &self,
        dealership_id: &str,
        visit_id: i64,
        status: VisitStatus,
        workflow_stage: i32,
        now: i64,
    ) -> StoreResult<Option<StatusTransition>> {
        self.check_write()?;
        let mut data = self.data.write();
        let Some(visit) = data.visit_mut(dealership_id, visit_id) else {
            return Ok(None);
        };
        let previous_status = visit.status;
        visit.status = status;
        visit.workflow_stage = workflow_stage;
        visit.check_out_time = if status.is_terminal() {
            visit.check_out_time.or(Some(now))
        } else {
            None
        };
        visit.updated_at = now;
        Ok(Some(StatusTransition {
            visit: visit.clone(),
            previous_status,
        }))
    }

    async fn attach_vehicle(
        &self,
        dealership_id: &str,
        visit_id: i64,
        vehicle_id: i64,
        stock_number: Option<&str>,
        now: i64,
    ) -> StoreResult<Option<Visit>> {
        self.check_write()?;
        let mut data = self.data.write();
        let Some(visit) = data.visit_mut(dealership_id, visit_id) else {
            return Ok(None);
        };
        visit.vehicle_id = Some(vehicle_id);
        visit.stock_number = stock_number.map(str::to_string);
        visit.updated_at = now;
        Ok(Some(visit.clone()))
    }

    async fn close_visit(
        &self,
        dealership_id: &str,
        visit_id: i64,
        status: VisitStatus,
        workflow_stage: i32,
        now: i64,
    ) -> StoreResult<Option<CloseOutcome>> {
        self.check_write()?;
        let mut data = self.data.write();
        let Some(visit) = data.visit_mut(dealership_id, visit_id) else {
            return Ok(None);
        };
        if visit.is_closed() {
            return Ok(Some(CloseOutcome::AlreadyClosed(visit.clone())));
        }

        let previous_status = visit.status;
        visit.status = status;
        visit.workflow_stage = workflow_stage;
        visit.check_out_time = Some(now);
        visit.updated_at = now;
        let visit = visit.clone();

        let mut stopped = Vec::new();
        for timer in data.timers.values_mut() {
            if timer.visit_id == visit_id && timer.is_open() {
                timer.end_time = Some(now);
                timer.duration_seconds = Some(elapsed_seconds(timer.start_time, now));
                stopped.push(timer.clone());
            }
        }
        stopped.sort_by_key(|t| t.id);

        Ok(Some(CloseOutcome::Closed {
            visit,
            previous_status,
            stopped,
        }))
    }

    async fn insert_timer(&self, timer: &Timer) -> StoreResult<()> {
        self.check_write()?;
        insert_new(&mut self.data.write().timers, timer.id, timer, "visit_timers")
    }

    async fn get_timer(&self, visit_id: i64, timer_id: i64) -> StoreResult<Option<Timer>> {
        Ok(self
            .data
            .read()
            .timers
            .get(&timer_id)
            .filter(|t| t.visit_id == visit_id)
            .cloned())
    }

    async fn list_timers(&self, visit_id: i64) -> StoreResult<Vec<Timer>> {
        let mut timers: Vec<Timer> = self
            .data
            .read()
            .timers
            .values()
            .filter(|t| t.visit_id == visit_id)
            .cloned()
            .collect();
        timers.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.cmp(&a.id)));
        Ok(timers)
    }

    async fn list_open_timers(&self, visit_ids: &[i64]) -> StoreResult<Vec<Timer>> {
        Ok(self
            .data
            .read()
            .timers
            .values()
            .filter(|t| t.is_open() && visit_ids.contains(&t.visit_id))
            .cloned()
            .collect())
    }

    async fn stop_timer(
        &self,
        visit_id: i64,
        timer_id: i64,
        end_time: i64,
    ) -> StoreResult<Option<Timer>> {
        self.check_write()?;
        let mut data = self.data.write();
        let Some(timer) = data
            .timers
            .get_mut(&timer_id)
            .filter(|t| t.visit_id == visit_id && t.is_open())
        else {
            return Ok(None);
        };
        timer.end_time = Some(end_time);
        timer.duration_seconds = Some(elapsed_seconds(timer.start_time, end_time));
        Ok(Some(timer.clone()))
    }

    async fn insert_note(&self, note: &Note) -> StoreResult<()> {
        self.check_write()?;
        insert_new(&mut self.data.write().notes, note.id, note, "visit_notes")
    }

    async fn get_note(&self, visit_id: i64, note_id: i64) -> StoreResult<Option<Note>> {
        Ok(self
            .data
            .read()
            .notes
            .get(&note_id)
            .filter(|n| n.visit_id == visit_id)
            .cloned())
    }

    async fn update_note(
        &self,
        visit_id: i64,
        note_id: i64,
        patch: &NoteUpdate,
        now: i64,
    ) -> StoreResult<Option<Note>> {
        self.check_write()?;
        let mut data = self.data.write();
        let Some(note) = data
            .notes
            .get_mut(&note_id)
            .filter(|n| n.visit_id == visit_id)
        else {
            return Ok(None);
        };
        if let Some(content) = &patch.content {
            note.content = content.clone();
        }
        if let Some(pinned) = patch.is_pinned {
            note.is_pinned = pinned;
        }
        note.updated_at = now;
        Ok(Some(note.clone()))
    }

    async fn delete_note(&self, visit_id: i64, note_id: i64) -> StoreResult<Option<Note>> {
        self.check_write()?;
        let mut data = self.data.write();
        if data.notes.get(&note_id).is_none_or(|n| n.visit_id != visit_id) {
            return Ok(None);
        }
        Ok(data.notes.remove(&note_id))
    }

    async fn list_notes(&self, visit_id: i64) -> StoreResult<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .data
            .read()
            .notes
            .values()
            .filter(|n| n.visit_id == visit_id)
            .cloned()
            .collect();
        sort_notes(&mut notes);
        Ok(notes)
    }

    async fn append_event(&self, event: &VisitEvent) -> StoreResult<()> {
        if self.fail_events.load(Ordering::SeqCst) {
            return Err(MemoryStoreError::EventLogUnavailable.into());
        }
        self.data.write().events.push(event.clone());
        Ok(())
    }

    async fn list_events(&self, visit_id: i64) -> StoreResult<Vec<VisitEvent>> {
        let data = self.data.read();
        // append order is chronological
        Ok(data
            .events
            .iter()
            .rev()
            .filter(|e| e.visit_id == visit_id)
            .cloned()
            .collect())
    }

    async fn get_workflow_config(
        &self,
        dealership_id: &str,
    ) -> StoreResult<Option<WorkflowConfig>> {
        let data = self.data.read();
        Ok(data
            .workflow
            .get(&Some(dealership_id.to_string()))
            .or_else(|| data.workflow.get(&None))
            .cloned())
    }

    async fn upsert_workflow_config(&self, config: &WorkflowConfig) -> StoreResult<()> {
        self.check_write()?;
        self.data
            .write()
            .workflow
            .insert(config.dealership_id.clone(), config.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::TimerType;

    fn visit(id: i64, dealership_id: &str, check_in_time: i64) -> Visit {
        Visit {
            id,
            dealership_id: dealership_id.into(),
            customer_id: 100,
            salesperson_id: None,
            vehicle_id: None,
            stock_number: None,
            check_in_time,
            check_out_time: None,
            status: VisitStatus::CheckedIn,
            workflow_stage: 0,
            source: None,
            appointment_id: None,
            created_at: check_in_time,
            updated_at: check_in_time,
        }
    }

    fn timer(id: i64, visit_id: i64, start_time: i64) -> Timer {
        Timer {
            id,
            visit_id,
            timer_type: TimerType::WaitTime,
            start_time,
            end_time: None,
            duration_seconds: None,
            staff_id: None,
        }
    }

    #[tokio::test]
    async fn visits_are_scoped_by_dealership() {
        let store = MemoryStore::new();
        store.insert_visit(&visit(1, "d1", 1_000)).await.unwrap();

        assert!(store.get_visit("d1", 1).await.unwrap().is_some());
        assert!(store.get_visit("d2", 1).await.unwrap().is_none());
        assert!(
            store
                .set_status("d2", 1, VisitStatus::Browsing, 1, 2_000)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn duplicate_ids_never_replace_rows() {
        let store = MemoryStore::new();
        store.insert_visit(&visit(7, "t1", 1_000)).await.unwrap();

        let err = store.insert_visit(&visit(7, "t2", 1_000)).await.unwrap_err();
        assert!(err.to_string().contains("duplicate visits id 7"));
        assert!(store.get_visit("t1", 7).await.unwrap().is_some());
        assert!(store.get_visit("t2", 7).await.unwrap().is_none());

        store.insert_timer(&timer(20, 7, 1_000)).await.unwrap();
        assert!(store.insert_timer(&timer(20, 8, 2_000)).await.is_err());
        assert_eq!(store.get_timer(7, 20).await.unwrap().unwrap().start_time, 1_000);

        let note = Note {
            id: 30,
            visit_id: 7,
            author_id: None,
            content: "first".into(),
            is_pinned: false,
            created_at: 1_000,
            updated_at: 1_000,
        };
        store.insert_note(&note).await.unwrap();
        let clash = Note {
            content: "second".into(),
            ..note.clone()
        };
        assert!(store.insert_note(&clash).await.is_err());
        assert_eq!(store.get_note(7, 30).await.unwrap().unwrap().content, "first");
    }

    #[tokio::test]
    async fn set_status_keeps_or_clears_check_out() {
        let store = MemoryStore::new();
        store.insert_visit(&visit(1, "d1", 0)).await.unwrap();
        store
            .close_visit("d1", 1, VisitStatus::ClosedWon, 5, 4_000)
            .await
            .unwrap();

        let moved = store
            .set_status("d1", 1, VisitStatus::ClosedLost, 6, 9_000)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.previous_status, VisitStatus::ClosedWon);
        assert_eq!(moved.visit.check_out_time, Some(4_000));

        let reopened = store
            .set_status("d1", 1, VisitStatus::Browsing, 1, 10_000)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reopened.visit.check_out_time, None);
    }

    #[tokio::test]
    async fn list_pages_newest_first() {
        let store = MemoryStore::new();
        for i in 1..=5 {
            store.insert_visit(&visit(i, "d1", i * 1_000)).await.unwrap();
        }
        store.insert_visit(&visit(9, "d2", 9_000)).await.unwrap();

        let query = VisitQuery {
            limit: 2,
            offset: 2,
            ..Default::default()
        };
        let (page, total) = store.list_visits("d1", &query).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(page.iter().map(|v| v.id).collect::<Vec<_>>(), vec![3, 2]);
    }

    #[tokio::test]
    async fn close_stops_open_timers_once() {
        let store = MemoryStore::new();
        store.insert_visit(&visit(1, "d1", 0)).await.unwrap();
        store.insert_timer(&timer(10, 1, 0)).await.unwrap();
        store.insert_timer(&timer(11, 1, 1_000)).await.unwrap();
        store.stop_timer(1, 11, 2_000).await.unwrap();

        let outcome = store
            .close_visit("d1", 1, VisitStatus::ClosedWon, 5, 7_500)
            .await
            .unwrap()
            .unwrap();
        match outcome {
            CloseOutcome::Closed {
                visit,
                previous_status,
                stopped,
            } => {
                assert_eq!(previous_status, VisitStatus::CheckedIn);
                assert_eq!(visit.check_out_time, Some(7_500));
                assert_eq!(stopped.len(), 1);
                assert_eq!(stopped[0].id, 10);
                assert_eq!(stopped[0].duration_seconds, Some(7));
            }
            other => panic!("expected Closed, got {other:?}"),
        }

        let again = store
            .close_visit("d1", 1, VisitStatus::ClosedLost, 6, 9_000)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(again, CloseOutcome::AlreadyClosed(_)));
    }

    #[tokio::test]
    async fn stop_timer_only_once() {
        let store = MemoryStore::new();
        store.insert_timer(&timer(10, 1, 1_000)).await.unwrap();

        assert!(store.stop_timer(2, 10, 5_000).await.unwrap().is_none());
        let stopped = store.stop_timer(1, 10, 5_000).await.unwrap().unwrap();
        assert_eq!(stopped.duration_seconds, Some(4));
        assert!(store.stop_timer(1, 10, 6_000).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn workflow_falls_back_to_global_row() {
        let store = MemoryStore::new();
        assert!(store.get_workflow_config("d1").await.unwrap().is_none());

        let global = WorkflowConfig::builtin();
        store.upsert_workflow_config(&global).await.unwrap();
        let found = store.get_workflow_config("d1").await.unwrap().unwrap();
        assert_eq!(found.dealership_id, None);

        let own = WorkflowConfig {
            dealership_id: Some("d1".into()),
            ..WorkflowConfig::builtin()
        };
        store.upsert_workflow_config(&own).await.unwrap();
        let found = store.get_workflow_config("d1").await.unwrap().unwrap();
        assert_eq!(found.dealership_id.as_deref(), Some("d1"));
    }

    #[tokio::test]
    async fn fault_injection() {
        let store = MemoryStore::new();
        store.fail_writes(true);
        assert!(store.insert_visit(&visit(1, "d1", 0)).await.is_err());
        store.fail_writes(false);
        store.insert_visit(&visit(1, "d1", 0)).await.unwrap();

        store.fail_events(true);
        let event = shared::models::NewEvent::new(
            1,
            shared::models::EventType::VisitCreated,
            None,
        )
        .into_event(1, 0);
        assert!(store.append_event(&event).await.is_err());
        assert_eq!(store.event_count(), 0);
    }
}
