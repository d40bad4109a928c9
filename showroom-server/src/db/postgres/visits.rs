//! Visit database operations

use shared::models::{Timer, Visit, VisitStatus, VisitUpdate};
use sqlx::PgPool;

use super::timers::TIMER_COLUMNS;
use crate::db::{BoxError, CloseOutcome, StatusTransition, VisitQuery};

const VISIT_COLUMNS: &str = "id, dealership_id, customer_id, salesperson_id, vehicle_id, \
     stock_number, check_in_time, check_out_time, status, workflow_stage, source, \
     appointment_id, created_at, updated_at";

/// Shared WHERE clause for list + count ($1 dealership, $2..$5 filters)
const LIST_FILTER: &str = "dealership_id = $1
    AND ($2::text IS NULL OR status = $2)
    AND (NOT $3 OR check_out_time IS NULL)
    AND ($4::bigint IS NULL OR check_in_time >= $4)
    AND ($5::bigint IS NULL OR check_in_time < $5)";

#[derive(sqlx::FromRow)]
struct TransitionRow {
    #[sqlx(flatten)]
    visit: Visit,
    previous_status: VisitStatus,
}

pub async fn insert(pool: &PgPool, visit: &Visit) -> Result<(), BoxError> {
    sqlx::query(
        r#"
        INSERT INTO visits (
            id, dealership_id, customer_id, salesperson_id, vehicle_id, stock_number,
            check_in_time, check_out_time, status, workflow_stage, source,
            appointment_id, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(visit.id)
    .bind(&visit.dealership_id)
    .bind(visit.customer_id)
    .bind(visit.salesperson_id)
    .bind(visit.vehicle_id)
    .bind(&visit.stock_number)
    .bind(visit.check_in_time)
    .bind(visit.check_out_time)
    .bind(visit.status.as_str())
    .bind(visit.workflow_stage)
    .bind(visit.source)
    .bind(visit.appointment_id)
    .bind(visit.created_at)
    .bind(visit.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find(
    pool: &PgPool,
    dealership_id: &str,
    visit_id: i64,
) -> Result<Option<Visit>, BoxError> {
    let sql = format!("SELECT {VISIT_COLUMNS} FROM visits WHERE id = $1 AND dealership_id = $2");
    let row: Option<Visit> = sqlx::query_as(&sql)
        .bind(visit_id)
        .bind(dealership_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn list(
    pool: &PgPool,
    dealership_id: &str,
    query: &VisitQuery,
) -> Result<(Vec<Visit>, u64), BoxError> {
    let status = query.status.map(|s| s.as_str());

    let count_sql = format!("SELECT COUNT(*) FROM visits WHERE {LIST_FILTER}");
    let (total,): (i64,) = sqlx::query_as(&count_sql)
        .bind(dealership_id)
        .bind(status)
        .bind(query.active_only)
        .bind(query.from)
        .bind(query.to)
        .fetch_one(pool)
        .await?;

    let list_sql = format!(
        "SELECT {VISIT_COLUMNS} FROM visits WHERE {LIST_FILTER} \
         ORDER BY check_in_time DESC, id DESC LIMIT $6 OFFSET $7"
    );
    let rows: Vec<Visit> = sqlx::query_as(&list_sql)
        .bind(dealership_id)
        .bind(status)
        .bind(query.active_only)
        .bind(query.from)
        .bind(query.to)
        .bind(query.limit as i64)
        .bind(query.offset as i64)
        .fetch_all(pool)
        .await?;

    Ok((rows, total.max(0) as u64))
}

pub async fn update(
    pool: &PgPool,
    dealership_id: &str,
    visit_id: i64,
    patch: &VisitUpdate,
    now: i64,
) -> Result<Option<Visit>, BoxError> {
    let sql = format!(
        "UPDATE visits SET salesperson_id = COALESCE($1, salesperson_id), \
         vehicle_id = COALESCE($2, vehicle_id), stock_number = COALESCE($3, stock_number), \
         source = COALESCE($4, source), appointment_id = COALESCE($5, appointment_id), \
         updated_at = $6 WHERE id = $7 AND dealership_id = $8 RETURNING {VISIT_COLUMNS}"
    );
    let row: Option<Visit> = sqlx::query_as(&sql)
        .bind(patch.salesperson_id)
        .bind(patch.vehicle_id)
        .bind(&patch.stock_number)
        .bind(patch.source)
        .bind(patch.appointment_id)
        .bind(now)
        .bind(visit_id)
        .bind(dealership_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn set_status(
    pool: &PgPool,
    dealership_id: &str,
    visit_id: i64,
    status: VisitStatus,
    workflow_stage: i32,
    now: i64,
) -> Result<Option<StatusTransition>, BoxError> {
    let row: Option<TransitionRow> = sqlx::query_as(
        r#"
        WITH prev AS (
            SELECT id, status FROM visits
            WHERE id = $1 AND dealership_id = $2
            FOR UPDATE
        )
        UPDATE visits v
        SET status = $3, workflow_stage = $4, updated_at = $5,
            check_out_time = CASE WHEN $6 THEN COALESCE(v.check_out_time, $5) ELSE NULL END
        FROM prev
        WHERE v.id = prev.id
        RETURNING v.id, v.dealership_id, v.customer_id, v.salesperson_id, v.vehicle_id,
                  v.stock_number, v.check_in_time, v.check_out_time, v.status,
                  v.workflow_stage, v.source, v.appointment_id, v.created_at, v.updated_at,
                  prev.status AS previous_status
        "#,
    )
    .bind(visit_id)
    .bind(dealership_id)
    .bind(status.as_str())
    .bind(workflow_stage)
    .bind(now)
    .bind(status.is_terminal())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| StatusTransition {
        visit: r.visit,
        previous_status: r.previous_status,
    }))
}

pub async fn attach_vehicle(
    pool: &PgPool,
    dealership_id: &str,
    visit_id: i64,
    vehicle_id: i64,
    stock_number: Option<&str>,
    now: i64,
) -> Result<Option<Visit>, BoxError> {
    let sql = format!(
        "UPDATE visits SET vehicle_id = $1, stock_number = $2, updated_at = $3 \
         WHERE id = $4 AND dealership_id = $5 RETURNING {VISIT_COLUMNS}"
    );
    let row: Option<Visit> = sqlx::query_as(&sql)
        .bind(vehicle_id)
        .bind(stock_number)
        .bind(now)
        .bind(visit_id)
        .bind(dealership_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Close + stop-all in one transaction
pub async fn close(
    pool: &PgPool,
    dealership_id: &str,
    visit_id: i64,
    status: VisitStatus,
    workflow_stage: i32,
    now: i64,
) -> Result<Option<CloseOutcome>, BoxError> {
    let mut tx = pool.begin().await?;

    let lock_sql = format!(
        "SELECT {VISIT_COLUMNS} FROM visits WHERE id = $1 AND dealership_id = $2 FOR UPDATE"
    );
    let current: Option<Visit> = sqlx::query_as(&lock_sql)
        .bind(visit_id)
        .bind(dealership_id)
        .fetch_optional(&mut *tx)
        .await?;

    let Some(current) = current else {
        return Ok(None);
    };
    if current.is_closed() {
        tx.rollback().await?;
        return Ok(Some(CloseOutcome::AlreadyClosed(current)));
    }

    let update_sql = format!(
        "UPDATE visits SET status = $1, workflow_stage = $2, check_out_time = $3, \
         updated_at = $3 WHERE id = $4 RETURNING {VISIT_COLUMNS}"
    );
    let visit: Visit = sqlx::query_as(&update_sql)
        .bind(status.as_str())
        .bind(workflow_stage)
        .bind(now)
        .bind(visit_id)
        .fetch_one(&mut *tx)
        .await?;

    let stop_sql = format!(
        "UPDATE visit_timers SET end_time = $2, \
         duration_seconds = GREATEST($2 - start_time, 0) / 1000 \
         WHERE visit_id = $1 AND end_time IS NULL RETURNING {TIMER_COLUMNS}"
    );
    let mut stopped: Vec<Timer> = sqlx::query_as(&stop_sql)
        .bind(visit_id)
        .bind(now)
        .fetch_all(&mut *tx)
        .await?;
    stopped.sort_by_key(|t| t.id);

    tx.commit().await?;

    Ok(Some(CloseOutcome::Closed {
        visit,
        previous_status: current.status,
        stopped,
    }))
}
