//! Caller rows.

use chrono::Utc;
use sqlx::{Row, SqliteConnection};

use crate::errors::AppError;
use crate::models::{Caller, CallerStatus, TaskStatus};

const CALLER_COLUMNS: &str = "id, caller_id, name, phone_number, status, current_load, max_load, \
     task_status, assigned_customers, created_at, updated_at, version";

/// Get a caller by internal id or by `CALLER###` business id.
pub async fn fetch_caller(
    conn: &mut SqliteConnection,
    key: &str,
) -> Result<Option<Caller>, AppError> {
    let sql = format!(
        "SELECT {} FROM callers WHERE id = ?1 OR caller_id = ?1",
        CALLER_COLUMNS
    );
    let row = sqlx::query(&sql).bind(key).fetch_optional(&mut *conn).await?;

    row.as_ref().map(caller_from_row).transpose()
}

/// List callers, optionally filtered by presence status.
pub async fn list_callers(
    conn: &mut SqliteConnection,
    status: Option<CallerStatus>,
) -> Result<Vec<Caller>, AppError> {
    let sql = format!(
        "SELECT {} FROM callers WHERE (?1 IS NULL OR status = ?1) ORDER BY caller_id",
        CALLER_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(caller_from_row).collect()
}

/// Reserve the next caller number from the monotonic sequence.
pub async fn next_caller_number(conn: &mut SqliteConnection) -> Result<i64, AppError> {
    sqlx::query("UPDATE meta SET caller_seq = caller_seq + 1 WHERE id = 1")
        .execute(&mut *conn)
        .await?;
    let seq: i64 = sqlx::query_scalar("SELECT caller_seq FROM meta WHERE id = 1")
        .fetch_one(&mut *conn)
        .await?;
    Ok(seq)
}

/// Format a sequence number as a caller business id.
pub fn format_caller_id(seq: i64) -> String {
    format!("CALLER{:03}", seq)
}

pub async fn insert_caller(conn: &mut SqliteConnection, caller: &Caller) -> Result<(), AppError> {
    let assigned_json = serde_json::to_string(&caller.assigned_customers)?;

    sqlx::query(
        r#"INSERT INTO callers (id, caller_id, name, phone_number, status, current_load, max_load,
                                task_status, assigned_customers, created_at, updated_at, version)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&caller.id)
    .bind(&caller.caller_id)
    .bind(&caller.name)
    .bind(&caller.phone_number)
    .bind(caller.status.as_str())
    .bind(caller.current_load)
    .bind(caller.max_load)
    .bind(caller.task_status.as_str())
    .bind(&assigned_json)
    .bind(&caller.created_at)
    .bind(&caller.updated_at)
    .bind(caller.version)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Write back a caller, guarded by its version. Returns the stored caller.
pub async fn update_caller(
    conn: &mut SqliteConnection,
    caller: &Caller,
) -> Result<Caller, AppError> {
    let now = Utc::now().to_rfc3339();
    let new_version = caller.version + 1;
    let assigned_json = serde_json::to_string(&caller.assigned_customers)?;

    let result = sqlx::query(
        r#"UPDATE callers SET
            name = ?, phone_number = ?, status = ?, current_load = ?, max_load = ?,
            task_status = ?, assigned_customers = ?, updated_at = ?, version = ?
        WHERE id = ? AND version = ?"#,
    )
    .bind(&caller.name)
    .bind(&caller.phone_number)
    .bind(caller.status.as_str())
    .bind(caller.current_load)
    .bind(caller.max_load)
    .bind(caller.task_status.as_str())
    .bind(&assigned_json)
    .bind(&now)
    .bind(new_version)
    .bind(&caller.id)
    .bind(caller.version)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let current: Option<i64> = sqlx::query_scalar("SELECT version FROM callers WHERE id = ?")
            .bind(&caller.id)
            .fetch_optional(&mut *conn)
            .await?;
        return Err(match current {
            Some(current_version) => AppError::VersionMismatch {
                message: format!(
                    "Concurrent modification detected for caller {}",
                    caller.caller_id
                ),
                current_version,
            },
            None => AppError::NotFound(format!("Caller {} not found", caller.caller_id)),
        });
    }

    let mut stored = caller.clone();
    stored.updated_at = now;
    stored.version = new_version;
    Ok(stored)
}

pub async fn delete_caller(conn: &mut SqliteConnection, id: &str) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM callers WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Caller {} not found", id)));
    }
    Ok(())
}

fn caller_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Caller, AppError> {
    let status_str: String = row.get("status");
    let status = status_str
        .parse::<CallerStatus>()
        .map_err(|_| AppError::Database(format!("Invalid caller status: {}", status_str)))?;
    let task_str: String = row.get("task_status");
    let task_status = task_str
        .parse::<TaskStatus>()
        .map_err(|_| AppError::Database(format!("Invalid task status: {}", task_str)))?;
    let assigned_str: String = row.get("assigned_customers");
    let assigned_customers = parse_assigned_customers(&assigned_str)?;

    Ok(Caller {
        id: row.get("id"),
        caller_id: row.get("caller_id"),
        name: row.get("name"),
        phone_number: row.get("phone_number"),
        status,
        current_load: row.get("current_load"),
        max_load: row.get("max_load"),
        task_status,
        assigned_customers,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    })
}

fn parse_assigned_customers(s: &str) -> Result<Vec<String>, AppError> {
    serde_json::from_str(s)
        .map_err(|e| AppError::Database(format!("Invalid assigned customers on caller: {}", e)))
}
