//! Audit event log
//!
//! Append-only. The log is written before every broadcast, so a client that
//! reconnects can rebuild anything it missed from here.

use std::sync::Arc;

use shared::models::{NewEvent, VisitEvent};
use shared::util::{now_millis, snowflake_id};

use super::{StaffContext, require_visit};
use crate::db::Store;
use crate::error::ServiceResult;

#[derive(Clone)]
pub struct EventLog {
    store: Arc<dyn Store>,
}

impl EventLog {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Append one event; id and timestamp are assigned here
    pub async fn record(&self, event: NewEvent) -> ServiceResult<VisitEvent> {
        let event = event.into_event(snowflake_id(), now_millis());
        if let Err(e) = self.store.append_event(&event).await {
            tracing::error!(
                visit_id = event.visit_id,
                event_type = %event.event_type,
                error = %e,
                "Failed to append visit event"
            );
            return Err(e.into());
        }
        tracing::debug!(
            visit_id = event.visit_id,
            event_type = %event.event_type,
            "Visit event recorded"
        );
        Ok(event)
    }

    /// Timeline of a visit, newest first
    pub async fn list_for_visit(
        &self,
        ctx: &StaffContext,
        visit_id: i64,
    ) -> ServiceResult<Vec<VisitEvent>> {
        require_visit(self.store.as_ref(), ctx, visit_id).await?;
        Ok(self.store.list_events(visit_id).await?)
    }
}
