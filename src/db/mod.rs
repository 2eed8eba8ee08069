//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all application data.

mod assignments;
mod callers;
mod customers;
mod repository;

pub use assignments::*;
pub use callers::*;
pub use customers::*;
pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // caller_seq / request_seq back the business ids; they only ever grow.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            schema_version INTEGER NOT NULL DEFAULT 1,
            revision_id INTEGER NOT NULL DEFAULT 0,
            caller_seq INTEGER NOT NULL DEFAULT 0,
            request_seq INTEGER NOT NULL DEFAULT 0,
            generated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        INSERT OR IGNORE INTO meta (id, schema_version, revision_id, caller_seq, request_seq, generated_at)
        VALUES (1, 1, 0, 0, 0, datetime('now'));
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS callers (
            id TEXT PRIMARY KEY,
            caller_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            phone_number TEXT,
            status TEXT NOT NULL,
            current_load INTEGER NOT NULL DEFAULT 0,
            max_load INTEGER NOT NULL,
            task_status TEXT NOT NULL,
            assigned_customers TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            version INTEGER NOT NULL DEFAULT 1
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS customers (
            id TEXT PRIMARY KEY,
            account_number TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            contact_number TEXT NOT NULL,
            amount_overdue REAL NOT NULL DEFAULT 0,
            days_overdue INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL,
            response TEXT,
            previous_response TEXT,
            region TEXT,
            rtom TEXT,
            assigned_to TEXT,
            assigned_date TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            version INTEGER NOT NULL DEFAULT 1
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Append-only: rows are never updated or deleted by the application.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contact_attempts (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id TEXT NOT NULL REFERENCES customers(id),
            date TEXT NOT NULL,
            outcome TEXT NOT NULL,
            response TEXT NOT NULL,
            promised_date TEXT,
            payment_made INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )
    .execute(pool)
    .await?;

    // No foreign key on `caller`: a request may outlive its caller, and
    // answering such a request must fail explicitly.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS requests (
            id TEXT PRIMARY KEY,
            request_id TEXT NOT NULL UNIQUE,
            caller TEXT NOT NULL,
            caller_id TEXT NOT NULL,
            status TEXT NOT NULL,
            customers_sent INTEGER NOT NULL,
            sent_date TEXT NOT NULL,
            responded_date TEXT,
            decline_reason TEXT,
            sent_by TEXT NOT NULL,
            customers TEXT NOT NULL,
            created_at TEXT NOT NULL,
            version INTEGER NOT NULL DEFAULT 1
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_customers_assigned_to ON customers(assigned_to);
        CREATE INDEX IF NOT EXISTS idx_customers_status ON customers(status);
        CREATE INDEX IF NOT EXISTS idx_contact_attempts_customer ON contact_attempts(customer_id, seq);
        CREATE INDEX IF NOT EXISTS idx_requests_caller ON requests(caller);
        CREATE INDEX IF NOT EXISTS idx_requests_status ON requests(status);
        CREATE INDEX IF NOT EXISTS idx_callers_status ON callers(status);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
