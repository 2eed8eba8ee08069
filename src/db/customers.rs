//! Customer and contact-history rows.
//!
//! Functions take a bare connection so the workflow can run them inside a
//! transaction and the repository can run them on a pooled connection.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{Row, SqliteConnection};

use crate::errors::AppError;
use crate::models::{ContactAttempt, ContactOutcome, Customer, CustomerStatus};

const CUSTOMER_COLUMNS: &str = "id, account_number, name, contact_number, amount_overdue, days_overdue, \
     status, response, previous_response, region, rtom, assigned_to, assigned_date, \
     created_at, updated_at, version";

/// Get a customer by internal id, with its full contact history.
pub async fn fetch_customer(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<Customer>, AppError> {
    let sql = format!("SELECT {} FROM customers WHERE id = ?", CUSTOMER_COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await?;

    match row {
        Some(row) => {
            let mut customer = customer_from_row(&row)?;
            customer.contact_history = fetch_history(conn, &customer.id).await?;
            Ok(Some(customer))
        }
        None => Ok(None),
    }
}

/// Get a customer by account number, with its full contact history.
pub async fn fetch_customer_by_account(
    conn: &mut SqliteConnection,
    account_number: &str,
) -> Result<Option<Customer>, AppError> {
    let sql = format!(
        "SELECT {} FROM customers WHERE account_number = ?",
        CUSTOMER_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(account_number)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => {
            let mut customer = customer_from_row(&row)?;
            customer.contact_history = fetch_history(conn, &customer.id).await?;
            Ok(Some(customer))
        }
        None => Ok(None),
    }
}

/// List customers, optionally filtered by owning caller (internal id) and status.
pub async fn list_customers(
    conn: &mut SqliteConnection,
    assigned_to: Option<&str>,
    status: Option<CustomerStatus>,
) -> Result<Vec<Customer>, AppError> {
    let status_str = status.map(|s| s.as_str());

    let sql = format!(
        "SELECT {} FROM customers \
         WHERE (?1 IS NULL OR assigned_to = ?1) AND (?2 IS NULL OR status = ?2) \
         ORDER BY account_number",
        CUSTOMER_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(assigned_to)
        .bind(status_str)
        .fetch_all(&mut *conn)
        .await?;

    let history_rows = sqlx::query(
        r#"SELECT a.customer_id, a.date, a.outcome, a.response, a.promised_date, a.payment_made
           FROM contact_attempts a
           JOIN customers c ON c.id = a.customer_id
           WHERE (?1 IS NULL OR c.assigned_to = ?1) AND (?2 IS NULL OR c.status = ?2)
           ORDER BY a.seq"#,
    )
    .bind(assigned_to)
    .bind(status_str)
    .fetch_all(&mut *conn)
    .await?;

    let mut histories: HashMap<String, Vec<ContactAttempt>> = HashMap::new();
    for row in &history_rows {
        let customer_id: String = row.get("customer_id");
        histories
            .entry(customer_id)
            .or_default()
            .push(attempt_from_row(row)?);
    }

    rows.iter()
        .map(|row| {
            let mut customer = customer_from_row(row)?;
            customer.contact_history = histories.remove(&customer.id).unwrap_or_default();
            Ok(customer)
        })
        .collect()
}

/// Insert a new customer row. Contact history is written separately.
pub async fn insert_customer(
    conn: &mut SqliteConnection,
    customer: &Customer,
) -> Result<(), AppError> {
    sqlx::query(
        r#"INSERT INTO customers (id, account_number, name, contact_number, amount_overdue, days_overdue,
                                  status, response, previous_response, region, rtom, assigned_to,
                                  assigned_date, created_at, updated_at, version)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&customer.id)
    .bind(&customer.account_number)
    .bind(&customer.name)
    .bind(&customer.contact_number)
    .bind(customer.amount_overdue)
    .bind(customer.days_overdue)
    .bind(customer.status.as_str())
    .bind(&customer.response)
    .bind(&customer.previous_response)
    .bind(&customer.region)
    .bind(&customer.rtom)
    .bind(&customer.assigned_to)
    .bind(&customer.assigned_date)
    .bind(&customer.created_at)
    .bind(&customer.updated_at)
    .bind(customer.version)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Write back a customer's scalar fields, guarded by its version.
///
/// Returns the stored customer with the bumped version. History is untouched.
pub async fn update_customer(
    conn: &mut SqliteConnection,
    customer: &Customer,
) -> Result<Customer, AppError> {
    let now = Utc::now().to_rfc3339();
    let new_version = customer.version + 1;

    let result = sqlx::query(
        r#"UPDATE customers SET
            name = ?, contact_number = ?, amount_overdue = ?, days_overdue = ?, status = ?,
            response = ?, previous_response = ?, region = ?, rtom = ?, assigned_to = ?,
            assigned_date = ?, updated_at = ?, version = ?
        WHERE id = ? AND version = ?"#,
    )
    .bind(&customer.name)
    .bind(&customer.contact_number)
    .bind(customer.amount_overdue)
    .bind(customer.days_overdue)
    .bind(customer.status.as_str())
    .bind(&customer.response)
    .bind(&customer.previous_response)
    .bind(&customer.region)
    .bind(&customer.rtom)
    .bind(&customer.assigned_to)
    .bind(&customer.assigned_date)
    .bind(&now)
    .bind(new_version)
    .bind(&customer.id)
    .bind(customer.version)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let current: Option<i64> = sqlx::query_scalar("SELECT version FROM customers WHERE id = ?")
            .bind(&customer.id)
            .fetch_optional(&mut *conn)
            .await?;
        return Err(match current {
            Some(current_version) => AppError::VersionMismatch {
                message: format!(
                    "Concurrent modification detected for customer {}",
                    customer.account_number
                ),
                current_version,
            },
            None => AppError::NotFound(format!("Customer {} not found", customer.id)),
        });
    }

    let mut stored = customer.clone();
    stored.updated_at = now;
    stored.version = new_version;
    Ok(stored)
}

/// Append one attempt to a customer's history.
pub async fn append_contact_attempt(
    conn: &mut SqliteConnection,
    customer_id: &str,
    attempt: &ContactAttempt,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO contact_attempts (customer_id, date, outcome, response, promised_date, payment_made) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(customer_id)
    .bind(&attempt.date)
    .bind(attempt.outcome.as_str())
    .bind(&attempt.response)
    .bind(&attempt.promised_date)
    .bind(attempt.payment_made as i32)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// A customer's history in insertion order.
pub async fn fetch_history(
    conn: &mut SqliteConnection,
    customer_id: &str,
) -> Result<Vec<ContactAttempt>, AppError> {
    let rows = sqlx::query(
        "SELECT date, outcome, response, promised_date, payment_made FROM contact_attempts WHERE customer_id = ? ORDER BY seq",
    )
    .bind(customer_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(attempt_from_row).collect()
}

fn customer_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Customer, AppError> {
    let status_str: String = row.get("status");
    let status = status_str
        .parse::<CustomerStatus>()
        .map_err(|_| AppError::Database(format!("Invalid customer status: {}", status_str)))?;

    Ok(Customer {
        id: row.get("id"),
        account_number: row.get("account_number"),
        name: row.get("name"),
        contact_number: row.get("contact_number"),
        amount_overdue: row.get("amount_overdue"),
        days_overdue: row.get("days_overdue"),
        status,
        response: row.get("response"),
        previous_response: row.get("previous_response"),
        region: row.get("region"),
        rtom: row.get("rtom"),
        assigned_to: row.get("assigned_to"),
        assigned_date: row.get("assigned_date"),
        contact_history: Vec::new(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    })
}

fn attempt_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ContactAttempt, AppError> {
    let outcome_str: String = row.get("outcome");
    let outcome = outcome_str
        .parse::<ContactOutcome>()
        .map_err(|_| AppError::Database(format!("Invalid contact outcome: {}", outcome_str)))?;
    let payment_made: i32 = row.get("payment_made");

    Ok(ContactAttempt {
        date: row.get("date"),
        outcome,
        response: row.get("response"),
        promised_date: row.get("promised_date"),
        payment_made: payment_made != 0,
    })
}
