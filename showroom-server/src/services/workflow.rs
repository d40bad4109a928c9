//! Workflow configuration: stage ordering and auto-trigger rules

use std::collections::HashSet;
use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{WorkflowConfig, WorkflowConfigUpdate};
use shared::util::now_millis;

use super::StaffContext;
use crate::db::Store;
use crate::error::ServiceResult;
use crate::utils::validation::{MAX_AUTO_TRIGGERS, MAX_LABEL_LEN, validate_required_text};

#[derive(Clone)]
pub struct WorkflowService {
    store: Arc<dyn Store>,
}

impl WorkflowService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Dealership config, else the global default row, else the built-in stages
    pub async fn get(&self, dealership_id: &str) -> ServiceResult<WorkflowConfig> {
        Ok(self
            .store
            .get_workflow_config(dealership_id)
            .await?
            .unwrap_or_else(WorkflowConfig::builtin))
    }

    pub async fn upsert(
        &self,
        ctx: &StaffContext,
        update: WorkflowConfigUpdate,
    ) -> ServiceResult<WorkflowConfig> {
        validate(&update)?;

        let config = WorkflowConfig {
            dealership_id: Some(ctx.dealership_id.clone()),
            stages: update.stages,
            auto_triggers: update.auto_triggers,
            updated_at: now_millis(),
        };
        self.store.upsert_workflow_config(&config).await?;

        tracing::info!(
            dealership_id = %ctx.dealership_id,
            staff_id = ?ctx.staff_id,
            stages = config.stages.len(),
            triggers = config.auto_triggers.len(),
            "Workflow config updated"
        );
        Ok(config)
    }
}

fn invalid(msg: impl Into<String>) -> AppError {
    AppError::with_message(ErrorCode::WorkflowConfigInvalid, msg)
}

fn validate(update: &WorkflowConfigUpdate) -> Result<(), AppError> {
    if update.stages.is_empty() {
        return Err(invalid("At least one stage is required"));
    }

    let mut seen = HashSet::new();
    for stage in &update.stages {
        if stage.status.is_terminal() {
            return Err(invalid(format!(
                "{} is terminal and cannot be a workflow stage",
                stage.status
            )));
        }
        if !seen.insert(stage.status) {
            return Err(invalid(format!("Duplicate stage {}", stage.status)));
        }
        validate_required_text(&stage.label, "label", MAX_LABEL_LEN)
            .map_err(|e| invalid(e.message))?;
    }

    if update.auto_triggers.len() > MAX_AUTO_TRIGGERS {
        return Err(invalid(format!(
            "Too many auto triggers ({}, max {MAX_AUTO_TRIGGERS})",
            update.auto_triggers.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use shared::models::{AutoTrigger, TimerType, TriggerAction, VisitStatus, WorkflowStage};

    fn stage(status: VisitStatus, label: &str) -> WorkflowStage {
        WorkflowStage {
            status,
            label: label.into(),
        }
    }

    #[test]
    fn rejects_bad_stage_lists() {
        let empty = WorkflowConfigUpdate {
            stages: vec![],
            auto_triggers: vec![],
        };
        assert_eq!(
            validate(&empty).unwrap_err().code,
            ErrorCode::WorkflowConfigInvalid
        );

        let terminal = WorkflowConfigUpdate {
            stages: vec![stage(VisitStatus::ClosedWon, "Sold")],
            auto_triggers: vec![],
        };
        assert!(validate(&terminal).is_err());

        let dup = WorkflowConfigUpdate {
            stages: vec![
                stage(VisitStatus::Browsing, "A"),
                stage(VisitStatus::Browsing, "B"),
            ],
            auto_triggers: vec![],
        };
        assert!(validate(&dup).is_err());

        let blank = WorkflowConfigUpdate {
            stages: vec![stage(VisitStatus::Browsing, "  ")],
            auto_triggers: vec![],
        };
        assert!(validate(&blank).is_err());
    }

    #[test]
    fn rejects_too_many_triggers() {
        let trigger = AutoTrigger {
            on_status: VisitStatus::TestDrive,
            action: TriggerAction::StartTimer {
                timer_type: TimerType::TestDrive,
            },
        };
        let update = WorkflowConfigUpdate {
            stages: vec![stage(VisitStatus::CheckedIn, "In")],
            auto_triggers: vec![trigger; MAX_AUTO_TRIGGERS + 1],
        };
        assert!(validate(&update).is_err());
    }

    #[tokio::test]
    async fn get_falls_back_to_builtin_then_uses_own_row() {
        let service = WorkflowService::new(Arc::new(MemoryStore::new()));
        let config = service.get("d1").await.unwrap();
        assert_eq!(config, WorkflowConfig::builtin());

        let ctx = StaffContext::new("d1", Some(3));
        service
            .upsert(
                &ctx,
                WorkflowConfigUpdate {
                    stages: vec![
                        stage(VisitStatus::CheckedIn, "Greeted"),
                        stage(VisitStatus::Negotiating, "Desk"),
                    ],
                    auto_triggers: vec![],
                },
            )
            .await
            .unwrap();

        let config = service.get("d1").await.unwrap();
        assert_eq!(config.dealership_id.as_deref(), Some("d1"));
        assert_eq!(config.stage_for(VisitStatus::Negotiating), 1);
        // other dealerships unaffected
        assert_eq!(service.get("d2").await.unwrap(), WorkflowConfig::builtin());
    }
}
