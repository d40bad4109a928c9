//! Visit event log (append-only: no update or delete here)

use shared::models::VisitEvent;
use sqlx::PgPool;

use crate::db::BoxError;

pub async fn append(pool: &PgPool, event: &VisitEvent) -> Result<(), BoxError> {
    sqlx::query(
        r#"
        INSERT INTO visit_events (id, visit_id, event_type, staff_id, previous_value, new_value, metadata, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(event.id)
    .bind(event.visit_id)
    .bind(event.event_type.as_str())
    .bind(event.staff_id)
    .bind(&event.previous_value)
    .bind(&event.new_value)
    .bind(&event.metadata)
    .bind(event.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_for_visit(pool: &PgPool, visit_id: i64) -> Result<Vec<VisitEvent>, BoxError> {
    let rows: Vec<VisitEvent> = sqlx::query_as(
        r#"
        SELECT id, visit_id, event_type, staff_id, previous_value, new_value, metadata, created_at
        FROM visit_events
        WHERE visit_id = $1
        ORDER BY created_at DESC, seq DESC
        "#,
    )
    .bind(visit_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
