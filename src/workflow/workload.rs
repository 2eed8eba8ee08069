//! Caller workload tracking.
//!
//! `currentLoad` and `taskStatus` are a materialized view of a caller's
//! assignment list. They are only ever written through
//! [`recompute_load_and_status`], after the list itself has changed.

use chrono::Utc;
use sqlx::SqliteConnection;

use super::validation::{check_expected_version, require_non_blank, validate_max_load};
use crate::db::{self, Repository};
use crate::errors::AppError;
use crate::models::{
    Caller, CallerStatus, CreateCallerRequest, Customer, EditWorkloadRequest, TaskStatus,
    UpdateCallerRequest,
};

/// Task status for a given load and capacity.
pub fn derive_task_status(current_load: i64, max_load: i64) -> TaskStatus {
    if current_load == 0 {
        TaskStatus::Idle
    } else if current_load < max_load {
        TaskStatus::Ongoing
    } else {
        TaskStatus::Completed
    }
}

/// Re-derive load and task status from the assignment list.
pub fn recompute_load_and_status(caller: &mut Caller) {
    caller.current_load = caller.assigned_customers.len() as i64;
    caller.task_status = derive_task_status(caller.current_load, caller.max_load);
}

/// Append a customer to the assignment list unless it is already there.
///
/// Returns whether the list changed. Load is not recomputed here.
pub fn add_assignment(caller: &mut Caller, customer_id: &str) -> bool {
    if caller.assigned_customers.iter().any(|id| id == customer_id) {
        return false;
    }
    caller.assigned_customers.push(customer_id.to_string());
    true
}

/// Drop the given customers from the assignment list, keeping order.
///
/// Returns how many entries were removed. Load is not recomputed here.
pub fn remove_assignments(caller: &mut Caller, customer_ids: &[String]) -> usize {
    let before = caller.assigned_customers.len();
    caller
        .assigned_customers
        .retain(|id| !customer_ids.iter().any(|gone| gone == id));
    before - caller.assigned_customers.len()
}

/// Take `customer` off the list of any caller other than `new_owner`.
///
/// Keeps a customer on at most one caller's list when it moves between callers.
pub(crate) async fn detach_from_other_caller(
    conn: &mut SqliteConnection,
    customer: &Customer,
    new_owner: &str,
) -> Result<(), AppError> {
    let Some(previous) = customer.assigned_to.as_deref() else {
        return Ok(());
    };
    if previous == new_owner {
        return Ok(());
    }

    match db::fetch_caller(conn, previous).await? {
        Some(mut other) => {
            if remove_assignments(&mut other, std::slice::from_ref(&customer.id)) > 0 {
                recompute_load_and_status(&mut other);
                db::update_caller(conn, &other).await?;
                tracing::info!(
                    customer = %customer.account_number,
                    from = %other.caller_id,
                    "Customer transferred away from previous caller"
                );
            }
        }
        None => {
            tracing::warn!(
                customer = %customer.account_number,
                previous_caller = %previous,
                "Customer referenced a caller that no longer exists"
            );
        }
    }
    Ok(())
}

/// Register a new caller with a sequential `CALLER###` id.
pub async fn create_caller(
    repo: &Repository,
    request: &CreateCallerRequest,
    default_max_load: i64,
) -> Result<Caller, AppError> {
    require_non_blank(&request.name, "Caller name")?;
    let max_load = request.max_load.unwrap_or(default_max_load);
    validate_max_load(max_load)?;

    let mut tx = repo.begin_write().await?;
    let seq = db::next_caller_number(&mut tx).await?;
    let now = Utc::now().to_rfc3339();

    let mut caller = Caller {
        id: uuid::Uuid::new_v4().to_string(),
        caller_id: db::format_caller_id(seq),
        name: request.name.trim().to_string(),
        phone_number: request.phone_number.clone(),
        status: request.status.unwrap_or(CallerStatus::Available),
        current_load: 0,
        max_load,
        task_status: TaskStatus::Idle,
        assigned_customers: Vec::new(),
        created_at: now.clone(),
        updated_at: now,
        version: 1,
    };
    recompute_load_and_status(&mut caller);

    db::insert_caller(&mut tx, &caller).await?;
    tx.commit().await?;

    tracing::info!(caller = %caller.caller_id, max_load, "Caller created");
    Ok(caller)
}

/// Update a caller's profile. A capacity change re-derives the task status.
pub async fn update_caller(
    repo: &Repository,
    key: &str,
    request: &UpdateCallerRequest,
) -> Result<Caller, AppError> {
    let mut tx = repo.begin_write().await?;
    let mut caller = db::fetch_caller(&mut tx, key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Caller {} not found", key)))?;
    check_expected_version(caller.version, request.expected_version)?;

    if let Some(name) = &request.name {
        require_non_blank(name, "Caller name")?;
        caller.name = name.trim().to_string();
    }
    if let Some(phone_number) = &request.phone_number {
        caller.phone_number = Some(phone_number.clone());
    }
    if let Some(status) = request.status {
        caller.status = status;
    }
    if let Some(max_load) = request.max_load {
        validate_max_load(max_load)?;
        caller.max_load = max_load;
    }
    recompute_load_and_status(&mut caller);

    let caller = db::update_caller(&mut tx, &caller).await?;
    tx.commit().await?;
    Ok(caller)
}

/// Remove a caller that holds no customers.
pub async fn delete_caller(repo: &Repository, key: &str) -> Result<(), AppError> {
    let mut tx = repo.begin_write().await?;
    let caller = db::fetch_caller(&mut tx, key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Caller {} not found", key)))?;

    if !caller.assigned_customers.is_empty() {
        return Err(AppError::Conflict(format!(
            "Caller {} still has {} assigned customers",
            caller.caller_id,
            caller.assigned_customers.len()
        )));
    }

    db::delete_caller(&mut tx, &caller.id).await?;
    tx.commit().await?;

    tracing::info!(caller = %caller.caller_id, "Caller deleted");
    Ok(())
}

/// Replace a caller's assignment list by hand.
///
/// Customers dropped from the list go back to the unassigned pool; customers
/// added to it are assigned to this caller, moving off any other caller.
pub async fn edit_workload(
    repo: &Repository,
    key: &str,
    request: &EditWorkloadRequest,
) -> Result<Caller, AppError> {
    let mut tx = repo.begin_write().await?;
    let mut caller = db::fetch_caller(&mut tx, key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Caller {} not found", key)))?;
    check_expected_version(caller.version, request.expected_version)?;

    let mut desired: Vec<String> = Vec::with_capacity(request.assigned_customers.len());
    for id in &request.assigned_customers {
        let id = id.trim();
        if !id.is_empty() && !desired.iter().any(|d| d == id) {
            desired.push(id.to_string());
        }
    }

    let removed: Vec<String> = caller
        .assigned_customers
        .iter()
        .filter(|id| !desired.contains(id))
        .cloned()
        .collect();

    for id in &removed {
        if let Some(mut customer) = db::fetch_customer(&mut tx, id).await? {
            if customer.is_assigned_to(&caller.id) {
                customer.release();
                db::update_customer(&mut tx, &customer).await?;
            }
        }
    }

    let today = super::today();
    let mut added = 0;
    for id in &desired {
        let mut customer = db::fetch_customer(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", id)))?;
        if !customer.is_assigned_to(&caller.id) {
            detach_from_other_caller(&mut tx, &customer, &caller.id).await?;
            customer.assign(&caller.id, &today);
            db::update_customer(&mut tx, &customer).await?;
            added += 1;
        }
    }

    caller.assigned_customers = desired;
    recompute_load_and_status(&mut caller);
    let caller = db::update_caller(&mut tx, &caller).await?;
    tx.commit().await?;

    tracing::info!(
        caller = %caller.caller_id,
        added,
        removed = removed.len(),
        current_load = caller.current_load,
        "Workload edited"
    );
    Ok(caller)
}
