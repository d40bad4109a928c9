//! Workflow config database operations
//!
//! Rows are keyed by `scope`: the dealership id, or `''` for the global default.

use shared::models::WorkflowConfig;
use sqlx::PgPool;
use sqlx::types::Json;

use crate::db::BoxError;

pub async fn find(pool: &PgPool, dealership_id: &str) -> Result<Option<WorkflowConfig>, BoxError> {
    let row: Option<WorkflowConfig> = sqlx::query_as(
        r#"
        SELECT NULLIF(scope, '') AS dealership_id, stages, auto_triggers, updated_at
        FROM workflow_configs
        WHERE scope = $1 OR scope = ''
        ORDER BY (scope = '')
        LIMIT 1
        "#,
    )
    .bind(dealership_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn upsert(pool: &PgPool, config: &WorkflowConfig) -> Result<(), BoxError> {
    sqlx::query(
        r#"
        INSERT INTO workflow_configs (scope, stages, auto_triggers, updated_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (scope)
        DO UPDATE SET stages = EXCLUDED.stages, auto_triggers = EXCLUDED.auto_triggers,
                      updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(config.dealership_id.as_deref().unwrap_or(""))
    .bind(Json(&config.stages))
    .bind(Json(&config.auto_triggers))
    .bind(config.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}
