//! Workflow Config Model (per-dealership stage list + auto-trigger rules)

use serde::{Deserialize, Serialize};

use super::timer::TimerType;
use super::visit::VisitStatus;

/// One entry of the ordered stage list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStage {
    pub status: VisitStatus,
    /// Display label for dashboards
    pub label: String,
}

/// Timer side effect applied when a visit enters `on_status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerAction {
    StartTimer { timer_type: TimerType },
    StopTimer { timer_type: TimerType },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoTrigger {
    pub on_status: VisitStatus,
    #[serde(flatten)]
    pub action: TriggerAction,
}

/// Workflow configuration
///
/// `dealership_id = None` is the global default row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct WorkflowConfig {
    pub dealership_id: Option<String>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub stages: Vec<WorkflowStage>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub auto_triggers: Vec<AutoTrigger>,
    pub updated_at: i64,
}

impl WorkflowConfig {
    /// Built-in configuration used when neither the dealership nor the
    /// global default row exists
    pub fn builtin() -> Self {
        let stages = VisitStatus::PIPELINE
            .iter()
            .map(|status| WorkflowStage {
                status: *status,
                label: default_label(*status).to_string(),
            })
            .collect();
        Self {
            dealership_id: None,
            stages,
            auto_triggers: Vec::new(),
            updated_at: 0,
        }
    }

    /// Stage ordinal for a status
    ///
    /// Non-terminal statuses take their position in the stage list, falling
    /// back to the canonical ordinal when the list omits them. Closed
    /// statuses are always 5 (won) and 6 (lost).
    pub fn stage_for(&self, status: VisitStatus) -> i32 {
        if status.is_terminal() {
            return status.default_stage();
        }
        self.stages
            .iter()
            .position(|stage| stage.status == status)
            .map(|idx| idx as i32)
            .unwrap_or_else(|| status.default_stage())
    }

    /// Trigger actions that fire when a visit enters `status`, in list order
    pub fn triggers_for(&self, status: VisitStatus) -> impl Iterator<Item = &TriggerAction> {
        self.auto_triggers
            .iter()
            .filter(move |t| t.on_status == status)
            .map(|t| &t.action)
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Upsert payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfigUpdate {
    pub stages: Vec<WorkflowStage>,
    #[serde(default)]
    pub auto_triggers: Vec<AutoTrigger>,
}

fn default_label(status: VisitStatus) -> &'static str {
    match status {
        VisitStatus::CheckedIn => "Checked In",
        VisitStatus::Browsing => "Browsing",
        VisitStatus::TestDrive => "Test Drive",
        VisitStatus::Negotiating => "Negotiating",
        VisitStatus::Paperwork => "Paperwork",
        VisitStatus::ClosedWon => "Sold",
        VisitStatus::ClosedLost => "Lost",
    }
}
