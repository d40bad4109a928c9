//! Note database operations

use shared::models::{Note, NoteUpdate};
use sqlx::PgPool;

use crate::db::BoxError;

const NOTE_COLUMNS: &str = "id, visit_id, author_id, content, is_pinned, created_at, updated_at";

pub async fn insert(pool: &PgPool, note: &Note) -> Result<(), BoxError> {
    sqlx::query(
        r#"
        INSERT INTO visit_notes (id, visit_id, author_id, content, is_pinned, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(note.id)
    .bind(note.visit_id)
    .bind(note.author_id)
    .bind(&note.content)
    .bind(note.is_pinned)
    .bind(note.created_at)
    .bind(note.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find(pool: &PgPool, visit_id: i64, note_id: i64) -> Result<Option<Note>, BoxError> {
    let sql = format!("SELECT {NOTE_COLUMNS} FROM visit_notes WHERE id = $1 AND visit_id = $2");
    let row: Option<Note> = sqlx::query_as(&sql)
        .bind(note_id)
        .bind(visit_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn update(
    pool: &PgPool,
    visit_id: i64,
    note_id: i64,
    patch: &NoteUpdate,
    now: i64,
) -> Result<Option<Note>, BoxError> {
    let sql = format!(
        "UPDATE visit_notes SET content = COALESCE($1, content), \
         is_pinned = COALESCE($2, is_pinned), updated_at = $3 \
         WHERE id = $4 AND visit_id = $5 RETURNING {NOTE_COLUMNS}"
    );
    let row: Option<Note> = sqlx::query_as(&sql)
        .bind(&patch.content)
        .bind(patch.is_pinned)
        .bind(now)
        .bind(note_id)
        .bind(visit_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn delete(pool: &PgPool, visit_id: i64, note_id: i64) -> Result<Option<Note>, BoxError> {
    let sql = format!(
        "DELETE FROM visit_notes WHERE id = $1 AND visit_id = $2 RETURNING {NOTE_COLUMNS}"
    );
    let row: Option<Note> = sqlx::query_as(&sql)
        .bind(note_id)
        .bind(visit_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn list_for_visit(pool: &PgPool, visit_id: i64) -> Result<Vec<Note>, BoxError> {
    let sql = format!(
        "SELECT {NOTE_COLUMNS} FROM visit_notes WHERE visit_id = $1 \
         ORDER BY is_pinned DESC, created_at DESC, id DESC"
    );
    let rows: Vec<Note> = sqlx::query_as(&sql).bind(visit_id).fetch_all(pool).await?;
    Ok(rows)
}
