//! Activity timer tracker
//!
//! Timers are timed sub-activities of a visit. Any number may be open at
//! once, including several of the same type; the visit's active timer is
//! simply the most recently started open one.

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::live::LiveEventType;
use shared::models::{EventType, NewEvent, Timer, TimerPayload, TimerType};
use shared::util::{now_millis, snowflake_id};

use super::{EventLog, StaffContext, require_visit};
use crate::db::Store;
use crate::error::ServiceResult;
use crate::hub::Hub;

#[derive(Clone)]
pub struct TimerService {
    store: Arc<dyn Store>,
    hub: Hub,
    events: EventLog,
}

impl TimerService {
    pub fn new(store: Arc<dyn Store>, hub: Hub, events: EventLog) -> Self {
        Self { store, hub, events }
    }

    /// Start a timed activity on an open visit
    pub async fn start(
        &self,
        ctx: &StaffContext,
        visit_id: i64,
        timer_type: TimerType,
    ) -> ServiceResult<Timer> {
        let visit = require_visit(self.store.as_ref(), ctx, visit_id).await?;
        if visit.is_closed() {
            return Err(AppError::with_message(
                ErrorCode::VisitAlreadyClosed,
                "Cannot start a timer on a closed visit",
            )
            .with_detail("visit_id", visit_id)
            .into());
        }

        let timer = self.start_untracked(visit_id, timer_type, ctx.staff_id).await?;

        self.events
            .record(
                NewEvent::new(visit_id, EventType::TimerStarted, ctx.staff_id)
                    .new_value(timer_type.as_str())
                    .metadata(serde_json::json!({ "timer_id": timer.id })),
            )
            .await?;

        self.hub.broadcast(
            &ctx.dealership_id,
            LiveEventType::TimerStarted,
            &TimerPayload {
                visit_id,
                timer: timer.clone(),
            },
        );

        tracing::info!(
            dealership_id = %ctx.dealership_id,
            visit_id,
            timer_id = timer.id,
            timer_type = %timer_type,
            "Timer started"
        );
        Ok(timer)
    }

    /// Stop an open timer; the duration is measured against now
    pub async fn stop(
        &self,
        ctx: &StaffContext,
        visit_id: i64,
        timer_id: i64,
    ) -> ServiceResult<Timer> {
        require_visit(self.store.as_ref(), ctx, visit_id).await?;

        let existing = self
            .store
            .get_timer(visit_id, timer_id)
            .await?
            .ok_or_else(|| AppError::timer_not_found(timer_id))?;
        if !existing.is_open() {
            return Err(already_stopped(timer_id).into());
        }

        // a concurrent stop wins the row; report the same conflict
        let timer = self
            .store
            .stop_timer(visit_id, timer_id, now_millis())
            .await?
            .ok_or_else(|| already_stopped(timer_id))?;

        self.events
            .record(
                NewEvent::new(visit_id, EventType::TimerStopped, ctx.staff_id)
                    .new_value(timer.timer_type.as_str())
                    .metadata(serde_json::json!({
                        "timer_id": timer.id,
                        "timer_type": timer.timer_type,
                        "duration_seconds": timer.duration_seconds,
                    })),
            )
            .await?;

        self.hub.broadcast(
            &ctx.dealership_id,
            LiveEventType::TimerStopped,
            &TimerPayload {
                visit_id,
                timer: timer.clone(),
            },
        );

        tracing::info!(
            dealership_id = %ctx.dealership_id,
            visit_id,
            timer_id,
            duration_seconds = ?timer.duration_seconds,
            "Timer stopped"
        );
        Ok(timer)
    }

    /// All timers of a visit, most recently started first
    pub async fn list_for_visit(
        &self,
        ctx: &StaffContext,
        visit_id: i64,
    ) -> ServiceResult<Vec<Timer>> {
        require_visit(self.store.as_ref(), ctx, visit_id).await?;
        Ok(self.store.list_timers(visit_id).await?)
    }

    /// Persist a new open timer without an event or broadcast
    ///
    /// Used for the check-in wait timer and workflow auto-triggers, which
    /// are reported through the event of the operation that caused them.
    pub(crate) async fn start_untracked(
        &self,
        visit_id: i64,
        timer_type: TimerType,
        staff_id: Option<i64>,
    ) -> ServiceResult<Timer> {
        let timer = Timer {
            id: snowflake_id(),
            visit_id,
            timer_type,
            start_time: now_millis(),
            end_time: None,
            duration_seconds: None,
            staff_id,
        };
        self.store.insert_timer(&timer).await?;
        Ok(timer)
    }

    /// Stop every open timer of one type, without an event or broadcast
    pub(crate) async fn stop_type_untracked(
        &self,
        visit_id: i64,
        timer_type: TimerType,
    ) -> ServiceResult<Vec<Timer>> {
        let now = now_millis();
        let mut stopped = Vec::new();
        for timer in self.store.list_timers(visit_id).await? {
            if timer.is_open()
                && timer.timer_type == timer_type
                && let Some(t) = self.store.stop_timer(visit_id, timer.id, now).await?
            {
                stopped.push(t);
            }
        }
        Ok(stopped)
    }
}

fn already_stopped(timer_id: i64) -> AppError {
    AppError::new(ErrorCode::TimerAlreadyStopped).with_detail("timer_id", timer_id)
}
