//! Assignment request rows. Customer snapshots are stored as a JSON column.

use sqlx::{Row, SqliteConnection};

use crate::errors::AppError;
use crate::models::{AssignmentRequest, CustomerSnapshot, RequestStatus};

const REQUEST_COLUMNS: &str = "id, request_id, caller, caller_id, status, customers_sent, sent_date, \
     responded_date, decline_reason, sent_by, customers, created_at, version";

/// Get a request by internal id or by `REQ#####` business id.
pub async fn fetch_request(
    conn: &mut SqliteConnection,
    key: &str,
) -> Result<Option<AssignmentRequest>, AppError> {
    let sql = format!(
        "SELECT {} FROM requests WHERE id = ?1 OR request_id = ?1",
        REQUEST_COLUMNS
    );
    let row = sqlx::query(&sql).bind(key).fetch_optional(&mut *conn).await?;

    row.as_ref().map(request_from_row).transpose()
}

/// List requests, newest first, optionally filtered by caller (internal id) and status.
pub async fn list_requests(
    conn: &mut SqliteConnection,
    caller: Option<&str>,
    status: Option<RequestStatus>,
) -> Result<Vec<AssignmentRequest>, AppError> {
    let sql = format!(
        "SELECT {} FROM requests \
         WHERE (?1 IS NULL OR caller = ?1) AND (?2 IS NULL OR status = ?2) \
         ORDER BY created_at DESC, request_id DESC",
        REQUEST_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(caller)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(request_from_row).collect()
}

/// Reserve the next request number from the monotonic sequence.
pub async fn next_request_number(conn: &mut SqliteConnection) -> Result<i64, AppError> {
    sqlx::query("UPDATE meta SET request_seq = request_seq + 1 WHERE id = 1")
        .execute(&mut *conn)
        .await?;
    let seq: i64 = sqlx::query_scalar("SELECT request_seq FROM meta WHERE id = 1")
        .fetch_one(&mut *conn)
        .await?;
    Ok(seq)
}

/// Format a sequence number as a request business id.
pub fn format_request_id(seq: i64) -> String {
    format!("REQ{:05}", seq)
}

pub async fn insert_request(
    conn: &mut SqliteConnection,
    request: &AssignmentRequest,
) -> Result<(), AppError> {
    let customers_json = serde_json::to_string(&request.customers)?;

    sqlx::query(
        r#"INSERT INTO requests (id, request_id, caller, caller_id, status, customers_sent, sent_date,
                                 responded_date, decline_reason, sent_by, customers, created_at, version)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&request.id)
    .bind(&request.request_id)
    .bind(&request.caller)
    .bind(&request.caller_id)
    .bind(request.status.as_str())
    .bind(request.customers_sent)
    .bind(&request.sent_date)
    .bind(&request.responded_date)
    .bind(&request.decline_reason)
    .bind(&request.sent_by)
    .bind(&customers_json)
    .bind(&request.created_at)
    .bind(request.version)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Write back a request's mutable fields, guarded by its version.
///
/// Snapshots and the target caller are fixed at creation and never rewritten.
pub async fn update_request(
    conn: &mut SqliteConnection,
    request: &AssignmentRequest,
) -> Result<AssignmentRequest, AppError> {
    let new_version = request.version + 1;

    let result = sqlx::query(
        r#"UPDATE requests SET
            status = ?, responded_date = ?, decline_reason = ?, sent_by = ?, version = ?
        WHERE id = ? AND version = ?"#,
    )
    .bind(request.status.as_str())
    .bind(&request.responded_date)
    .bind(&request.decline_reason)
    .bind(&request.sent_by)
    .bind(new_version)
    .bind(&request.id)
    .bind(request.version)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let current: Option<i64> = sqlx::query_scalar("SELECT version FROM requests WHERE id = ?")
            .bind(&request.id)
            .fetch_optional(&mut *conn)
            .await?;
        return Err(match current {
            Some(current_version) => AppError::VersionMismatch {
                message: format!(
                    "Concurrent modification detected for request {}",
                    request.request_id
                ),
                current_version,
            },
            None => AppError::NotFound(format!("Request {} not found", request.request_id)),
        });
    }

    let mut stored = request.clone();
    stored.version = new_version;
    Ok(stored)
}

fn request_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<AssignmentRequest, AppError> {
    let status_str: String = row.get("status");
    let status = status_str
        .parse::<RequestStatus>()
        .map_err(|_| AppError::Database(format!("Invalid request status: {}", status_str)))?;
    let customers_str: String = row.get("customers");
    let customers: Vec<CustomerSnapshot> = serde_json::from_str(&customers_str).map_err(|e| {
        AppError::Database(format!("Invalid customer snapshots on request: {}", e))
    })?;

    Ok(AssignmentRequest {
        id: row.get("id"),
        request_id: row.get("request_id"),
        caller: row.get("caller"),
        caller_id: row.get("caller_id"),
        status,
        customers_sent: row.get("customers_sent"),
        sent_date: row.get("sent_date"),
        responded_date: row.get("responded_date"),
        decline_reason: row.get("decline_reason"),
        sent_by: row.get("sent_by"),
        customers,
        created_at: row.get("created_at"),
        version: row.get("version"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_format() {
        assert_eq!(format_request_id(7), "REQ00007");
        assert_eq!(format_request_id(123456), "REQ123456");
    }
}
