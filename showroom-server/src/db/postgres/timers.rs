//! Timer database operations

use shared::models::Timer;
use sqlx::PgPool;

use crate::db::BoxError;

pub(super) const TIMER_COLUMNS: &str =
    "id, visit_id, timer_type, start_time, end_time, duration_seconds, staff_id";

pub async fn insert(pool: &PgPool, timer: &Timer) -> Result<(), BoxError> {
    sqlx::query(
        r#"
        INSERT INTO visit_timers (id, visit_id, timer_type, start_time, end_time, duration_seconds, staff_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(timer.id)
    .bind(timer.visit_id)
    .bind(timer.timer_type.as_str())
    .bind(timer.start_time)
    .bind(timer.end_time)
    .bind(timer.duration_seconds)
    .bind(timer.staff_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find(pool: &PgPool, visit_id: i64, timer_id: i64) -> Result<Option<Timer>, BoxError> {
    let sql = format!("SELECT {TIMER_COLUMNS} FROM visit_timers WHERE id = $1 AND visit_id = $2");
    let row: Option<Timer> = sqlx::query_as(&sql)
        .bind(timer_id)
        .bind(visit_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn list_for_visit(pool: &PgPool, visit_id: i64) -> Result<Vec<Timer>, BoxError> {
    let sql = format!(
        "SELECT {TIMER_COLUMNS} FROM visit_timers WHERE visit_id = $1 \
         ORDER BY start_time DESC, id DESC"
    );
    let rows: Vec<Timer> = sqlx::query_as(&sql).bind(visit_id).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn list_open(pool: &PgPool, visit_ids: &[i64]) -> Result<Vec<Timer>, BoxError> {
    if visit_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {TIMER_COLUMNS} FROM visit_timers \
         WHERE visit_id = ANY($1) AND end_time IS NULL"
    );
    let rows: Vec<Timer> = sqlx::query_as(&sql).bind(visit_ids).fetch_all(pool).await?;
    Ok(rows)
}

/// Stop an open timer; no row when absent or already stopped
pub async fn stop(
    pool: &PgPool,
    visit_id: i64,
    timer_id: i64,
    end_time: i64,
) -> Result<Option<Timer>, BoxError> {
    let sql = format!(
        "UPDATE visit_timers SET end_time = $3, \
         duration_seconds = GREATEST($3 - start_time, 0) / 1000 \
         WHERE id = $1 AND visit_id = $2 AND end_time IS NULL RETURNING {TIMER_COLUMNS}"
    );
    let row: Option<Timer> = sqlx::query_as(&sql)
        .bind(timer_id)
        .bind(visit_id)
        .bind(end_time)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}
