//! Domain services
//!
//! Every mutating operation follows the same order: validate, persist,
//! append one audit event, broadcast to the dealership room. A persistence
//! failure stops before the event; an event failure stops before the
//! broadcast.

pub mod events;
pub mod notes;
pub mod timers;
pub mod visits;
pub mod workflow;

use std::sync::Arc;

use shared::error::AppError;
use shared::models::Visit;

pub use events::EventLog;
pub use notes::NoteService;
pub use timers::TimerService;
pub use visits::VisitService;
pub use workflow::WorkflowService;

use crate::db::Store;
use crate::error::ServiceResult;
use crate::hub::Hub;

/// Caller identity, validated upstream and attached to every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffContext {
    pub dealership_id: String,
    pub staff_id: Option<i64>,
}

impl StaffContext {
    pub fn new(dealership_id: impl Into<String>, staff_id: Option<i64>) -> Self {
        Self {
            dealership_id: dealership_id.into(),
            staff_id,
        }
    }
}

/// All services wired to one store and one hub
#[derive(Clone)]
pub struct Services {
    pub visits: VisitService,
    pub timers: TimerService,
    pub notes: NoteService,
    pub events: EventLog,
    pub workflow: WorkflowService,
}

impl Services {
    pub fn new(store: Arc<dyn Store>, hub: Hub) -> Self {
        let events = EventLog::new(store.clone());
        let workflow = WorkflowService::new(store.clone());
        let timers = TimerService::new(store.clone(), hub.clone(), events.clone());
        let notes = NoteService::new(store.clone(), hub.clone(), events.clone());
        let visits = VisitService::new(
            store,
            hub,
            events.clone(),
            timers.clone(),
            notes.clone(),
            workflow.clone(),
        );
        Self {
            visits,
            timers,
            notes,
            events,
            workflow,
        }
    }
}

/// Resolve a visit under the caller's dealership (mismatch is not-found)
pub(crate) async fn require_visit(
    store: &dyn Store,
    ctx: &StaffContext,
    visit_id: i64,
) -> ServiceResult<Visit> {
    store
        .get_visit(&ctx.dealership_id, visit_id)
        .await?
        .ok_or_else(|| AppError::visit_not_found(visit_id).into())
}
