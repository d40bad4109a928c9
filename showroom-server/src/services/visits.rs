//! Visit lifecycle
//!
//! ```text
//! CHECKED_IN → BROWSING → TEST_DRIVE → NEGOTIATING → PAPERWORK → CLOSED_WON
//!                                                              ↘ CLOSED_LOST
//! ```
//!
//! Transitions are permissive: any status may follow any other. Entering a
//! closed status from an open one sets the check-out time and stops every
//! open timer in one store call; leaving a closed status re-opens the visit
//! and clears the check-out time.

use std::collections::HashMap;
use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::live::LiveEventType;
use shared::models::{
    EventType, NewEvent, PaginatedResponse, StatusChangedPayload, Timer, TimerType,
    TriggerAction, Visit, VisitCreate, VisitDetail, VisitFilter, VisitStatus, VisitUpdate,
    active_timer, normalize_paging,
};
use shared::util::{now_millis, snowflake_id};

use super::{EventLog, NoteService, StaffContext, TimerService, WorkflowService, require_visit};
use crate::db::{CloseOutcome, StatusTransition, Store, VisitQuery};
use crate::error::ServiceResult;
use crate::hub::Hub;
use crate::utils::validation::{
    MAX_NOTE_LEN, MAX_STOCK_NUMBER_LEN, validate_optional_text, validate_required_text,
};

#[derive(Clone)]
pub struct VisitService {
    store: Arc<dyn Store>,
    hub: Hub,
    events: EventLog,
    timers: TimerService,
    notes: NoteService,
    workflow: WorkflowService,
}

impl VisitService {
    pub fn new(
        store: Arc<dyn Store>,
        hub: Hub,
        events: EventLog,
        timers: TimerService,
        notes: NoteService,
        workflow: WorkflowService,
    ) -> Self {
        Self {
            store,
            hub,
            events,
            timers,
            notes,
            workflow,
        }
    }

    /// Check a customer in
    pub async fn create(&self, ctx: &StaffContext, data: VisitCreate) -> ServiceResult<VisitDetail> {
        validate_optional_text(&data.stock_number, "stock_number", MAX_STOCK_NUMBER_LEN)?;
        let initial_note = data
            .initial_note
            .as_deref()
            .filter(|n| !n.trim().is_empty());
        if let Some(note) = initial_note {
            validate_required_text(note, "initial_note", MAX_NOTE_LEN)?;
        }

        let config = self.workflow.get(&ctx.dealership_id).await?;
        let now = now_millis();
        let visit = Visit {
            id: snowflake_id(),
            dealership_id: ctx.dealership_id.clone(),
            customer_id: data.customer_id,
            salesperson_id: data.salesperson_id,
            vehicle_id: data.vehicle_id,
            stock_number: data.stock_number.clone(),
            check_in_time: now,
            check_out_time: None,
            status: VisitStatus::CheckedIn,
            workflow_stage: config.stage_for(VisitStatus::CheckedIn),
            source: data.source,
            appointment_id: data.appointment_id,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_visit(&visit).await?;

        self.events
            .record(
                NewEvent::new(visit.id, EventType::VisitCreated, ctx.staff_id)
                    .new_value(visit.status.as_str())
                    .metadata(serde_json::json!({
                        "customer_id": visit.customer_id,
                        "source": visit.source,
                    })),
            )
            .await?;

        // best-effort side effects
        let wait_timer = match self
            .timers
            .start_untracked(visit.id, TimerType::WaitTime, ctx.staff_id)
            .await
        {
            Ok(timer) => Some(timer),
            Err(e) => {
                tracing::warn!(visit_id = visit.id, error = %e, "Failed to start check-in wait timer");
                None
            }
        };
        if let Some(content) = initial_note
            && let Err(e) = self
                .notes
                .insert_untracked(visit.id, ctx.staff_id, content, false)
                .await
        {
            tracing::warn!(visit_id = visit.id, error = %e, "Failed to create initial note");
        }

        let detail = VisitDetail {
            visit,
            active_timer: wait_timer,
        };
        self.hub
            .broadcast(&ctx.dealership_id, LiveEventType::VisitCreated, &detail);

        tracing::info!(
            dealership_id = %ctx.dealership_id,
            visit_id = detail.visit.id,
            customer_id = detail.visit.customer_id,
            "Customer checked in"
        );
        Ok(detail)
    }

    /// Patch assignable fields; status is never touched here
    pub async fn update(
        &self,
        ctx: &StaffContext,
        visit_id: i64,
        patch: VisitUpdate,
    ) -> ServiceResult<VisitDetail> {
        if patch.is_empty() {
            return Err(AppError::validation("No fields to update").into());
        }
        validate_optional_text(&patch.stock_number, "stock_number", MAX_STOCK_NUMBER_LEN)?;

        let visit = self
            .store
            .update_visit(&ctx.dealership_id, visit_id, &patch, now_millis())
            .await?
            .ok_or_else(|| AppError::visit_not_found(visit_id))?;

        self.events
            .record(
                NewEvent::new(visit_id, EventType::VisitUpdated, ctx.staff_id)
                    .metadata(serde_json::json!({ "changed_fields": patch.changed_fields() })),
            )
            .await?;

        let detail = self.detail(visit).await?;
        self.hub
            .broadcast(&ctx.dealership_id, LiveEventType::VisitUpdated, &detail);
        Ok(detail)
    }

    /// Move to any status from any status
    ///
    /// An open visit entering a closed status is checked out and has every
    /// open timer stopped, atomically. A closed visit moving to the other
    /// closed status keeps its check-out time; moving to an open status
    /// re-opens it.
    pub async fn change_status(
        &self,
        ctx: &StaffContext,
        visit_id: i64,
        status: VisitStatus,
    ) -> ServiceResult<VisitDetail> {
        let config = self.workflow.get(&ctx.dealership_id).await?;
        let stage = config.stage_for(status);
        let now = now_millis();

        let mut stopped = Vec::new();
        let transition = if status.is_terminal() {
            let outcome = self
                .store
                .close_visit(&ctx.dealership_id, visit_id, status, stage, now)
                .await?
                .ok_or_else(|| AppError::visit_not_found(visit_id))?;
            match outcome {
                CloseOutcome::Closed {
                    visit,
                    previous_status,
                    stopped: timers,
                } => {
                    stopped.extend(timers.iter().map(|t| t.id));
                    StatusTransition {
                        visit,
                        previous_status,
                    }
                }
                CloseOutcome::AlreadyClosed(_) => self
                    .store
                    .set_status(&ctx.dealership_id, visit_id, status, stage, now)
                    .await?
                    .ok_or_else(|| AppError::visit_not_found(visit_id))?,
            }
        } else {
            self.store
                .set_status(&ctx.dealership_id, visit_id, status, stage, now)
                .await?
                .ok_or_else(|| AppError::visit_not_found(visit_id))?
        };
        let previous_status = transition.previous_status;

        // closed visits hold no open timers; triggers apply to open statuses only
        let mut started = Vec::new();
        let triggers = config
            .triggers_for(status)
            .filter(|_| !status.is_terminal());
        for action in triggers {
            match action {
                TriggerAction::StartTimer { timer_type } => {
                    match self
                        .timers
                        .start_untracked(visit_id, *timer_type, ctx.staff_id)
                        .await
                    {
                        Ok(timer) => started.push(timer.id),
                        Err(e) => tracing::warn!(
                            visit_id,
                            timer_type = %timer_type,
                            error = %e,
                            "Auto-trigger failed to start timer"
                        ),
                    }
                }
                TriggerAction::StopTimer { timer_type } => {
                    match self.timers.stop_type_untracked(visit_id, *timer_type).await {
                        Ok(timers) => stopped.extend(timers.iter().map(|t| t.id)),
                        Err(e) => tracing::warn!(
                            visit_id,
                            timer_type = %timer_type,
                            error = %e,
                            "Auto-trigger failed to stop timers"
                        ),
                    }
                }
            }
        }

        let mut metadata = serde_json::json!({ "workflow_stage": stage });
        if !started.is_empty() || !stopped.is_empty() {
            metadata["started_timer_ids"] = serde_json::json!(started);
            metadata["stopped_timer_ids"] = serde_json::json!(stopped);
        }
        if previous_status.is_terminal() && !status.is_terminal() {
            metadata["reopened"] = serde_json::Value::Bool(true);
        }
        self.events
            .record(
                NewEvent::new(visit_id, EventType::StatusChanged, ctx.staff_id)
                    .values(previous_status.as_str(), status.as_str())
                    .metadata(metadata),
            )
            .await?;

        let detail = self.detail(transition.visit).await?;
        self.hub.broadcast(
            &ctx.dealership_id,
            LiveEventType::StatusChanged,
            &StatusChangedPayload {
                visit: detail.clone(),
                previous_status,
                new_status: status,
            },
        );

        tracing::info!(
            dealership_id = %ctx.dealership_id,
            visit_id,
            from = %previous_status,
            to = %status,
            stopped_timers = stopped.len(),
            "Visit status changed"
        );
        Ok(detail)
    }

    /// Record the vehicle the customer is looking at
    pub async fn attach_vehicle(
        &self,
        ctx: &StaffContext,
        visit_id: i64,
        vehicle_id: i64,
        stock_number: Option<String>,
    ) -> ServiceResult<VisitDetail> {
        validate_optional_text(&stock_number, "stock_number", MAX_STOCK_NUMBER_LEN)?;
        let before = require_visit(self.store.as_ref(), ctx, visit_id).await?;

        let visit = self
            .store
            .attach_vehicle(
                &ctx.dealership_id,
                visit_id,
                vehicle_id,
                stock_number.as_deref(),
                now_millis(),
            )
            .await?
            .ok_or_else(|| AppError::visit_not_found(visit_id))?;

        let mut event = NewEvent::new(visit_id, EventType::VehicleAttached, ctx.staff_id)
            .new_value(vehicle_id.to_string())
            .metadata(serde_json::json!({ "stock_number": visit.stock_number }));
        if let Some(previous) = before.vehicle_id {
            event = event.previous(previous.to_string());
        }
        self.events.record(event).await?;

        let detail = self.detail(visit).await?;
        self.hub
            .broadcast(&ctx.dealership_id, LiveEventType::VisitUpdated, &detail);
        Ok(detail)
    }

    /// Close the visit and stop every open timer in one store call
    pub async fn close(
        &self,
        ctx: &StaffContext,
        visit_id: i64,
        status: VisitStatus,
    ) -> ServiceResult<VisitDetail> {
        if !status.is_terminal() {
            return Err(AppError::with_message(
                ErrorCode::VisitNotClosedStatus,
                format!("{status} is not a closing status"),
            )
            .into());
        }

        let config = self.workflow.get(&ctx.dealership_id).await?;
        let outcome = self
            .store
            .close_visit(
                &ctx.dealership_id,
                visit_id,
                status,
                config.stage_for(status),
                now_millis(),
            )
            .await?
            .ok_or_else(|| AppError::visit_not_found(visit_id))?;

        let (visit, previous_status, stopped) = match outcome {
            CloseOutcome::Closed {
                visit,
                previous_status,
                stopped,
            } => (visit, previous_status, stopped),
            CloseOutcome::AlreadyClosed(visit) => {
                return Err(AppError::new(ErrorCode::VisitAlreadyClosed)
                    .with_detail("visit_id", visit_id)
                    .with_detail("status", visit.status.as_str())
                    .into());
            }
        };

        let stopped_ids: Vec<i64> = stopped.iter().map(|t| t.id).collect();
        self.events
            .record(
                NewEvent::new(visit_id, EventType::VisitClosed, ctx.staff_id)
                    .values(previous_status.as_str(), status.as_str())
                    .metadata(serde_json::json!({ "stopped_timer_ids": stopped_ids })),
            )
            .await?;

        let detail = self.detail(visit).await?;
        self.hub
            .broadcast(&ctx.dealership_id, LiveEventType::VisitClosed, &detail);

        tracing::info!(
            dealership_id = %ctx.dealership_id,
            visit_id,
            status = %status,
            stopped_timers = stopped_ids.len(),
            "Visit closed"
        );
        Ok(detail)
    }

    pub async fn get(&self, ctx: &StaffContext, visit_id: i64) -> ServiceResult<VisitDetail> {
        let visit = require_visit(self.store.as_ref(), ctx, visit_id).await?;
        self.detail(visit).await
    }

    /// Filtered page, newest check-in first
    pub async fn list(
        &self,
        ctx: &StaffContext,
        filter: VisitFilter,
    ) -> ServiceResult<PaginatedResponse<VisitDetail>> {
        let (page, per_page, offset) = normalize_paging(filter.page, filter.per_page);
        let query = VisitQuery {
            status: filter.status,
            active_only: filter.active_only,
            from: filter.from,
            to: filter.to,
            limit: per_page,
            offset,
        };
        let (visits, total) = self.store.list_visits(&ctx.dealership_id, &query).await?;

        let ids: Vec<i64> = visits.iter().map(|v| v.id).collect();
        let mut open: HashMap<i64, Vec<Timer>> = HashMap::new();
        for timer in self.store.list_open_timers(&ids).await? {
            open.entry(timer.visit_id).or_default().push(timer);
        }

        let details = visits
            .into_iter()
            .map(|visit| {
                let timer = open
                    .get(&visit.id)
                    .and_then(|timers| active_timer(timers))
                    .cloned();
                VisitDetail {
                    visit,
                    active_timer: timer,
                }
            })
            .collect();

        Ok(PaginatedResponse::new(details, total, page, per_page))
    }

    async fn detail(&self, visit: Visit) -> ServiceResult<VisitDetail> {
        let timers = self.store.list_timers(visit.id).await?;
        let active_timer = active_timer(&timers).cloned();
        Ok(VisitDetail {
            visit,
            active_timer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{check_in, ctx, drain, fixture};
    use shared::models::{AutoTrigger, EventType, WorkflowConfigUpdate, WorkflowStage};

    #[tokio::test]
    async fn check_in_starts_wait_timer_and_broadcasts() {
        let fx = fixture();
        let mut dash = fx.dashboard("d1");
        let ctx = ctx("d1");

        let mut data = check_in(42);
        data.initial_note = Some("Wants a hybrid".into());
        let detail = fx.services.visits.create(&ctx, data).await.unwrap();

        assert_eq!(detail.visit.status, VisitStatus::CheckedIn);
        assert_eq!(detail.visit.workflow_stage, 0);
        assert!(detail.visit.check_out_time.is_none());
        let timer = detail.active_timer.as_ref().unwrap();
        assert_eq!(timer.timer_type, TimerType::WaitTime);

        let notes = fx.services.notes.list(&ctx, detail.visit.id).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].content, "Wants a hybrid");

        // one event for the whole check-in
        let events = fx.services.events.list_for_visit(&ctx, detail.visit.id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::VisitCreated);

        let pushed = drain(&mut dash);
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0]["type"], "VISIT_CREATED");
        assert_eq!(pushed[0]["data"]["id"], detail.visit.id);
        assert_eq!(pushed[0]["data"]["active_timer"]["timer_type"], "WAIT_TIME");
    }

    #[tokio::test]
    async fn status_change_records_previous_and_new() {
        let fx = fixture();
        let ctx = ctx("d1");
        let visit = fx.services.visits.create(&ctx, check_in(1)).await.unwrap().visit;
        let mut dash = fx.dashboard("d1");

        let detail = fx
            .services
            .visits
            .change_status(&ctx, visit.id, VisitStatus::TestDrive)
            .await
            .unwrap();
        assert_eq!(detail.visit.status, VisitStatus::TestDrive);
        assert_eq!(detail.visit.workflow_stage, 2);

        let events = fx.services.events.list_for_visit(&ctx, visit.id).await.unwrap();
        assert_eq!(events[0].event_type, EventType::StatusChanged);
        assert_eq!(events[0].previous_value.as_deref(), Some("CHECKED_IN"));
        assert_eq!(events[0].new_value.as_deref(), Some("TEST_DRIVE"));

        let pushed = drain(&mut dash);
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0]["type"], "STATUS_CHANGED");
        assert_eq!(pushed[0]["data"]["previous_status"], "CHECKED_IN");
        assert_eq!(pushed[0]["data"]["new_status"], "TEST_DRIVE");
    }

    #[tokio::test]
    async fn closing_status_checks_out_and_stops_timers() {
        let fx = fixture();
        let ctx = ctx("d1");
        let detail = fx.services.visits.create(&ctx, check_in(1)).await.unwrap();
        let wait = detail.active_timer.unwrap();
        let mut dash = fx.dashboard("d1");

        let closed = fx
            .services
            .visits
            .change_status(&ctx, detail.visit.id, VisitStatus::ClosedLost)
            .await
            .unwrap();
        assert_eq!(closed.visit.status, VisitStatus::ClosedLost);
        assert_eq!(closed.visit.workflow_stage, 6);
        assert!(closed.visit.check_out_time.is_some());
        assert!(closed.active_timer.is_none());

        let timers = fx
            .services
            .timers
            .list_for_visit(&ctx, detail.visit.id)
            .await
            .unwrap();
        assert!(timers.iter().all(|t| !t.is_open()));

        let events = fx
            .services
            .events
            .list_for_visit(&ctx, detail.visit.id)
            .await
            .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, EventType::StatusChanged);
        assert_eq!(events[0].previous_value.as_deref(), Some("CHECKED_IN"));
        assert_eq!(events[0].new_value.as_deref(), Some("CLOSED_LOST"));
        assert_eq!(
            events[0].metadata.as_ref().unwrap()["stopped_timer_ids"],
            serde_json::json!([wait.id])
        );

        let pushed = drain(&mut dash);
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0]["type"], "STATUS_CHANGED");
        assert_eq!(pushed[0]["data"]["previous_status"], "CHECKED_IN");
        assert_eq!(pushed[0]["data"]["new_status"], "CLOSED_LOST");
        assert!(pushed[0]["data"]["visit"]["check_out_time"].is_i64());
    }

    #[tokio::test]
    async fn closed_visit_moves_between_closed_statuses() {
        let fx = fixture();
        let ctx = ctx("d1");
        let visit = fx.services.visits.create(&ctx, check_in(1)).await.unwrap().visit;

        let won = fx
            .services
            .visits
            .change_status(&ctx, visit.id, VisitStatus::ClosedWon)
            .await
            .unwrap();
        let checked_out = won.visit.check_out_time.unwrap();
        let mut dash = fx.dashboard("d1");

        let lost = fx
            .services
            .visits
            .change_status(&ctx, visit.id, VisitStatus::ClosedLost)
            .await
            .unwrap();
        assert_eq!(lost.visit.status, VisitStatus::ClosedLost);
        assert_eq!(lost.visit.workflow_stage, 6);
        assert_eq!(lost.visit.check_out_time, Some(checked_out));

        let events = fx.services.events.list_for_visit(&ctx, visit.id).await.unwrap();
        let kinds: Vec<EventType> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            kinds,
            vec![
                EventType::StatusChanged,
                EventType::StatusChanged,
                EventType::VisitCreated
            ]
        );
        assert_eq!(events[0].previous_value.as_deref(), Some("CLOSED_WON"));
        assert_eq!(events[0].new_value.as_deref(), Some("CLOSED_LOST"));

        let pushed = drain(&mut dash);
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0]["type"], "STATUS_CHANGED");
        assert_eq!(pushed[0]["data"]["previous_status"], "CLOSED_WON");
    }

    #[tokio::test]
    async fn reopening_clears_check_out() {
        let fx = fixture();
        let ctx = ctx("d1");
        let visit = fx.services.visits.create(&ctx, check_in(1)).await.unwrap().visit;
        fx.services
            .visits
            .close(&ctx, visit.id, VisitStatus::ClosedLost)
            .await
            .unwrap();

        let reopened = fx
            .services
            .visits
            .change_status(&ctx, visit.id, VisitStatus::Negotiating)
            .await
            .unwrap();
        assert!(reopened.visit.check_out_time.is_none());
        assert_eq!(reopened.visit.workflow_stage, 3);

        let events = fx.services.events.list_for_visit(&ctx, visit.id).await.unwrap();
        assert_eq!(events[0].event_type, EventType::StatusChanged);
        assert_eq!(events[0].metadata.as_ref().unwrap()["reopened"], true);
        assert_eq!(events[1].event_type, EventType::VisitClosed);
    }

    #[tokio::test]
    async fn close_stops_all_timers_and_rejects_second_close() {
        let fx = fixture();
        let ctx = ctx("d1");
        let visit = fx.services.visits.create(&ctx, check_in(1)).await.unwrap().visit;
        fx.services
            .timers
            .start(&ctx, visit.id, TimerType::TestDrive)
            .await
            .unwrap();
        fx.services
            .timers
            .start(&ctx, visit.id, TimerType::TestDrive)
            .await
            .unwrap();

        let detail = fx
            .services
            .visits
            .close(&ctx, visit.id, VisitStatus::ClosedWon)
            .await
            .unwrap();
        assert_eq!(detail.visit.workflow_stage, 5);
        assert!(detail.visit.check_out_time.is_some());

        let timers = fx.services.timers.list_for_visit(&ctx, visit.id).await.unwrap();
        assert_eq!(timers.len(), 3);
        for t in &timers {
            let end = t.end_time.unwrap();
            assert_eq!(t.duration_seconds, Some((end - t.start_time) / 1000));
        }

        let events = fx.services.events.list_for_visit(&ctx, visit.id).await.unwrap();
        let stopped = events[0].metadata.as_ref().unwrap()["stopped_timer_ids"]
            .as_array()
            .unwrap()
            .len();
        assert_eq!(stopped, 3);

        let err = fx
            .services
            .visits
            .close(&ctx, visit.id, VisitStatus::ClosedLost)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::VisitAlreadyClosed);
    }

    #[tokio::test]
    async fn close_requires_terminal_status() {
        let fx = fixture();
        let ctx = ctx("d1");
        let visit = fx.services.visits.create(&ctx, check_in(1)).await.unwrap().visit;
        let before = fx.store.event_count();

        let err = fx
            .services
            .visits
            .close(&ctx, visit.id, VisitStatus::Paperwork)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::VisitNotClosedStatus);
        assert_eq!(fx.store.event_count(), before);
    }

    #[tokio::test]
    async fn other_dealership_sees_not_found() {
        let fx = fixture();
        let visit = fx
            .services
            .visits
            .create(&ctx("t2"), check_in(1))
            .await
            .unwrap()
            .visit;
        let mut t1_dash = fx.dashboard("t1");

        let t1 = ctx("t1");
        let err = fx.services.visits.get(&t1, visit.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::VisitNotFound);
        let err = fx
            .services
            .visits
            .change_status(&t1, visit.id, VisitStatus::Browsing)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::VisitNotFound);
        let err = fx
            .services
            .visits
            .close(&t1, visit.id, VisitStatus::ClosedWon)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::VisitNotFound);

        assert!(drain(&mut t1_dash).is_empty());
        let events = fx
            .services
            .events
            .list_for_visit(&ctx("t2"), visit.id)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn update_and_attach_vehicle() {
        let fx = fixture();
        let ctx = ctx("d1");
        let visit = fx.services.visits.create(&ctx, check_in(1)).await.unwrap().visit;
        let mut dash = fx.dashboard("d1");

        let err = fx
            .services
            .visits
            .update(&ctx, visit.id, VisitUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);

        let detail = fx
            .services
            .visits
            .update(
                &ctx,
                visit.id,
                VisitUpdate {
                    salesperson_id: Some(9),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(detail.visit.salesperson_id, Some(9));
        assert_eq!(detail.visit.status, VisitStatus::CheckedIn);

        let detail = fx
            .services
            .visits
            .attach_vehicle(&ctx, visit.id, 555, Some("STK-1".into()))
            .await
            .unwrap();
        assert_eq!(detail.visit.vehicle_id, Some(555));
        assert_eq!(detail.visit.stock_number.as_deref(), Some("STK-1"));

        let events = fx.services.events.list_for_visit(&ctx, visit.id).await.unwrap();
        assert_eq!(events[0].event_type, EventType::VehicleAttached);
        assert_eq!(events[0].new_value.as_deref(), Some("555"));
        assert_eq!(events[1].event_type, EventType::VisitUpdated);
        assert_eq!(
            events[1].metadata.as_ref().unwrap()["changed_fields"],
            serde_json::json!(["salesperson_id"])
        );

        let pushed = drain(&mut dash);
        let types: Vec<_> = pushed.iter().map(|m| m["type"].clone()).collect();
        assert_eq!(types, vec!["VISIT_UPDATED", "VISIT_UPDATED"]);
    }

    #[tokio::test]
    async fn failed_persistence_emits_nothing() {
        let fx = fixture();
        let ctx = ctx("d1");
        let visit = fx.services.visits.create(&ctx, check_in(1)).await.unwrap().visit;
        let mut dash = fx.dashboard("d1");
        let before = fx.store.event_count();

        fx.store.fail_writes(true);
        let err = fx
            .services
            .visits
            .change_status(&ctx, visit.id, VisitStatus::Browsing)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::DatabaseError);
        fx.store.fail_writes(false);

        fx.store.fail_events(true);
        let err = fx
            .services
            .visits
            .change_status(&ctx, visit.id, VisitStatus::Browsing)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::DatabaseError);
        fx.store.fail_events(false);

        assert_eq!(fx.store.event_count(), before);
        assert!(drain(&mut dash).is_empty());
    }

    #[tokio::test]
    async fn auto_triggers_follow_workflow_config() {
        let fx = fixture();
        let ctx = ctx("d1");
        fx.services
            .workflow
            .upsert(
                &ctx,
                WorkflowConfigUpdate {
                    stages: VisitStatus::PIPELINE
                        .iter()
                        .map(|s| WorkflowStage {
                            status: *s,
                            label: s.as_str().into(),
                        })
                        .collect(),
                    auto_triggers: vec![
                        AutoTrigger {
                            on_status: VisitStatus::TestDrive,
                            action: TriggerAction::StopTimer {
                                timer_type: TimerType::WaitTime,
                            },
                        },
                        AutoTrigger {
                            on_status: VisitStatus::TestDrive,
                            action: TriggerAction::StartTimer {
                                timer_type: TimerType::TestDrive,
                            },
                        },
                    ],
                },
            )
            .await
            .unwrap();

        let visit = fx.services.visits.create(&ctx, check_in(1)).await.unwrap().visit;
        let before = fx.store.event_count();
        let detail = fx
            .services
            .visits
            .change_status(&ctx, visit.id, VisitStatus::TestDrive)
            .await
            .unwrap();

        // exactly one event for the transition and its triggers
        assert_eq!(fx.store.event_count(), before + 1);
        let active = detail.active_timer.unwrap();
        assert_eq!(active.timer_type, TimerType::TestDrive);

        let timers = fx.services.timers.list_for_visit(&ctx, visit.id).await.unwrap();
        let wait = timers
            .iter()
            .find(|t| t.timer_type == TimerType::WaitTime)
            .unwrap();
        assert!(!wait.is_open());

        let events = fx.services.events.list_for_visit(&ctx, visit.id).await.unwrap();
        let meta = events[0].metadata.as_ref().unwrap();
        assert_eq!(meta["started_timer_ids"], serde_json::json!([active.id]));
        assert_eq!(meta["stopped_timer_ids"], serde_json::json!([wait.id]));
    }

    #[tokio::test]
    async fn list_filters_and_pages() {
        let fx = fixture();
        let ctx = ctx("d1");
        let mut ids = Vec::new();
        for customer in 0..3 {
            ids.push(
                fx.services
                    .visits
                    .create(&ctx, check_in(customer))
                    .await
                    .unwrap()
                    .visit
                    .id,
            );
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        fx.services
            .visits
            .close(&ctx, ids[0], VisitStatus::ClosedLost)
            .await
            .unwrap();
        fx.services
            .visits
            .create(&StaffContext::new("d2", None), check_in(9))
            .await
            .unwrap();

        let all = fx
            .services
            .visits
            .list(&ctx, VisitFilter::default())
            .await
            .unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.data[0].visit.id, ids[2]);
        assert!(all.data[0].active_timer.is_some());

        let active = fx
            .services
            .visits
            .list(
                &ctx,
                VisitFilter {
                    active_only: true,
                    per_page: Some(1),
                    page: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(active.total, 2);
        assert_eq!(active.total_pages, 2);
        assert_eq!(active.data.len(), 1);
        assert_eq!(active.data[0].visit.id, ids[1]);
    }
}
