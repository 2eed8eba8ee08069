//! Database repository for reads and customer import.
//!
//! Writes that touch more than one record go through [`Repository::begin_write`]
//! so they commit or roll back as a unit.

use chrono::Utc;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use super::{assignments, callers, customers};
use crate::errors::AppError;
use crate::models::{
    AssignmentRequest, Caller, CallerStatus, Customer, CustomerStatus, ImportCustomer,
    ImportSummary, RequestStatus, RevisionInfo,
};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let revision: i64 = sqlx::query_scalar("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(revision)
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let (revision_id, generated_at): (i64, String) =
            sqlx::query_as("SELECT revision_id, generated_at FROM meta WHERE id = 1")
                .fetch_one(&self.pool)
                .await?;
        Ok(RevisionInfo {
            revision_id,
            generated_at,
        })
    }

    /// Open a write transaction.
    ///
    /// The first statement bumps the store revision, which takes SQLite's
    /// writer lock before anything is read. Concurrent writers queue on the
    /// busy timeout instead of failing on a stale read snapshot, so every
    /// read inside the transaction sees the latest committed state.
    pub async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, AppError> {
        let mut tx = self.pool.begin().await?;
        bump_revision(&mut tx).await?;
        Ok(tx)
    }

    // ==================== CUSTOMER OPERATIONS ====================

    pub async fn get_customer(&self, id: &str) -> Result<Option<Customer>, AppError> {
        let mut conn = self.pool.acquire().await?;
        customers::fetch_customer(&mut conn, id).await
    }

    pub async fn get_customer_by_account(
        &self,
        account_number: &str,
    ) -> Result<Option<Customer>, AppError> {
        let mut conn = self.pool.acquire().await?;
        customers::fetch_customer_by_account(&mut conn, account_number).await
    }

    /// List customers; `caller` is a caller's internal id.
    pub async fn list_customers(
        &self,
        caller: Option<&str>,
        status: Option<CustomerStatus>,
    ) -> Result<Vec<Customer>, AppError> {
        let mut conn = self.pool.acquire().await?;
        customers::list_customers(&mut conn, caller, status).await
    }

    /// Upsert importer output into the customer store.
    ///
    /// New accounts land in the unassigned pool. Known accounts get their
    /// contact and balance details refreshed; assignment and history stay.
    pub async fn import_customers(
        &self,
        records: &[ImportCustomer],
    ) -> Result<ImportSummary, AppError> {
        let mut tx = self.begin_write().await?;
        let now = Utc::now().to_rfc3339();
        let mut created = 0;
        let mut updated = 0;
        let mut stored = Vec::with_capacity(records.len());

        for record in records {
            let account_number = record.account_number.trim();
            match customers::fetch_customer_by_account(&mut tx, account_number).await? {
                Some(mut existing) => {
                    existing.name = record.name.trim().to_string();
                    existing.contact_number = record.contact_number.trim().to_string();
                    existing.amount_overdue = record.amount_overdue;
                    existing.days_overdue = record.days_overdue;
                    if record.region.is_some() {
                        existing.region = record.region.clone();
                    }
                    if record.rtom.is_some() {
                        existing.rtom = record.rtom.clone();
                    }
                    stored.push(customers::update_customer(&mut tx, &existing).await?);
                    updated += 1;
                }
                None => {
                    let customer = Customer {
                        id: uuid::Uuid::new_v4().to_string(),
                        account_number: account_number.to_string(),
                        name: record.name.trim().to_string(),
                        contact_number: record.contact_number.trim().to_string(),
                        amount_overdue: record.amount_overdue,
                        days_overdue: record.days_overdue,
                        status: CustomerStatus::Unassigned,
                        response: None,
                        previous_response: None,
                        region: record.region.clone(),
                        rtom: record.rtom.clone(),
                        assigned_to: None,
                        assigned_date: None,
                        contact_history: Vec::new(),
                        created_at: now.clone(),
                        updated_at: now.clone(),
                        version: 1,
                    };
                    customers::insert_customer(&mut tx, &customer).await?;
                    stored.push(customer);
                    created += 1;
                }
            }
        }

        tx.commit().await?;

        Ok(ImportSummary {
            created,
            updated,
            customers: stored,
        })
    }

    // ==================== CALLER OPERATIONS ====================

    /// Get a caller by internal id or `CALLER###`.
    pub async fn get_caller(&self, key: &str) -> Result<Option<Caller>, AppError> {
        let mut conn = self.pool.acquire().await?;
        callers::fetch_caller(&mut conn, key).await
    }

    pub async fn list_callers(
        &self,
        status: Option<CallerStatus>,
    ) -> Result<Vec<Caller>, AppError> {
        let mut conn = self.pool.acquire().await?;
        callers::list_callers(&mut conn, status).await
    }

    // ==================== REQUEST OPERATIONS ====================

    /// Get a request by internal id or `REQ#####`.
    pub async fn get_request(&self, key: &str) -> Result<Option<AssignmentRequest>, AppError> {
        let mut conn = self.pool.acquire().await?;
        assignments::fetch_request(&mut conn, key).await
    }

    /// List requests; `caller` is a caller's internal id.
    pub async fn list_requests(
        &self,
        caller: Option<&str>,
        status: Option<RequestStatus>,
    ) -> Result<Vec<AssignmentRequest>, AppError> {
        let mut conn = self.pool.acquire().await?;
        assignments::list_requests(&mut conn, caller, status).await
    }
}

/// Increment the revision ID and return the new value.
pub async fn bump_revision(conn: &mut SqliteConnection) -> Result<i64, AppError> {
    let now = Utc::now().to_rfc3339();
    sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
        .bind(&now)
        .execute(&mut *conn)
        .await?;
    let revision: i64 = sqlx::query_scalar("SELECT revision_id FROM meta WHERE id = 1")
        .fetch_one(&mut *conn)
        .await?;
    Ok(revision)
}
