//! Request workflow: offering customer batches to callers.
//!
//! A request is created PENDING without touching customers or callers. Only
//! an answer applies side effects:
//!
//! - accept: each snapshot is resolved by account number (created if unknown),
//!   assigned to the caller, and appended to the caller's list if absent.
//! - decline: each snapshot's live customer is returned to the pool and taken
//!   off the caller's list.
//!
//! Both answers go through [`update_request`] in one transaction, after a
//! PENDING check. A second answer to the same request is a conflict and
//! changes nothing.

use chrono::Utc;
use sqlx::SqliteConnection;

use super::validation::{
    check_expected_version, ensure_pending, require_non_blank, validate_snapshots,
};
use super::workload::{
    add_assignment, detach_from_other_caller, recompute_load_and_status, remove_assignments,
};
use crate::db::{self, Repository};
use crate::errors::AppError;
use crate::models::{
    AssignmentRequest, Caller, CreateAssignmentRequest, Customer, CustomerSnapshot,
    CustomerStatus, RequestStatus, UpdateAssignmentRequest,
};

/// Send a batch of customer snapshots to a caller.
pub async fn create_request(
    repo: &Repository,
    input: &CreateAssignmentRequest,
    sent_by: &str,
) -> Result<AssignmentRequest, AppError> {
    require_non_blank(&input.caller_id, "Caller id")?;
    validate_snapshots(&input.customers)?;

    let mut tx = repo.begin_write().await?;
    let caller = db::fetch_caller(&mut tx, input.caller_id.trim())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Caller {} not found", input.caller_id)))?;

    let seq = db::next_request_number(&mut tx).await?;
    let request = AssignmentRequest {
        id: uuid::Uuid::new_v4().to_string(),
        request_id: db::format_request_id(seq),
        caller: caller.id.clone(),
        caller_id: caller.caller_id.clone(),
        status: RequestStatus::Pending,
        customers_sent: input.customers.len() as i64,
        sent_date: super::now_stamp(),
        responded_date: None,
        decline_reason: None,
        sent_by: sent_by.to_string(),
        customers: input.customers.iter().map(normalize_snapshot).collect(),
        created_at: Utc::now().to_rfc3339(),
        version: 1,
    };

    db::insert_request(&mut tx, &request).await?;
    tx.commit().await?;

    tracing::info!(
        request = %request.request_id,
        caller = %request.caller_id,
        customers = request.customers_sent,
        sent_by = %request.sent_by,
        "Assignment request created"
    );
    Ok(request)
}

/// Accept a pending request, moving its customers into the caller's workload.
pub async fn accept_request(repo: &Repository, key: &str) -> Result<AssignmentRequest, AppError> {
    update_request(
        repo,
        key,
        &UpdateAssignmentRequest {
            status: Some(RequestStatus::Accepted),
            ..Default::default()
        },
    )
    .await
}

/// Decline a pending request, returning its customers to the pool.
pub async fn decline_request(
    repo: &Repository,
    key: &str,
    reason: &str,
) -> Result<AssignmentRequest, AppError> {
    update_request(
        repo,
        key,
        &UpdateAssignmentRequest {
            status: Some(RequestStatus::Declined),
            decline_reason: Some(reason.to_string()),
            ..Default::default()
        },
    )
    .await
}

/// Apply a partial update to a request.
///
/// A status change to ACCEPTED or DECLINED runs the matching side effects;
/// ACCEPTED may later move to COMPLETED. Remaining fields are applied after
/// the transition. Any failure rolls everything back and leaves the request
/// as it was.
pub async fn update_request(
    repo: &Repository,
    key: &str,
    patch: &UpdateAssignmentRequest,
) -> Result<AssignmentRequest, AppError> {
    let decline_reason = match &patch.decline_reason {
        Some(reason) => {
            require_non_blank(reason, "Decline reason")?;
            Some(reason.trim().to_string())
        }
        None => None,
    };
    if patch.status == Some(RequestStatus::Declined) && decline_reason.is_none() {
        return Err(AppError::Validation(
            "Decline reason is required".to_string(),
        ));
    }

    let mut tx = repo.begin_write().await?;
    let mut request = db::fetch_request(&mut tx, key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Request {} not found", key)))?;
    check_expected_version(request.version, patch.expected_version)?;

    let previous = request.status;
    let mut affected = 0;
    match patch.status {
        Some(RequestStatus::Accepted) => {
            ensure_pending(&request, "accept")?;
            affected = apply_acceptance(&mut tx, &mut request).await?;
        }
        Some(RequestStatus::Declined) => {
            ensure_pending(&request, "decline")?;
            affected = apply_decline(&mut tx, &mut request).await?;
        }
        Some(RequestStatus::Completed) => {
            if request.status != RequestStatus::Accepted {
                return Err(AppError::Conflict(format!(
                    "Cannot complete request {}: it is {}, not ACCEPTED",
                    request.request_id,
                    request.status.as_str()
                )));
            }
            request.status = RequestStatus::Completed;
        }
        Some(RequestStatus::Pending) => {
            if request.status != RequestStatus::Pending {
                return Err(AppError::Conflict(format!(
                    "Request {} cannot return to PENDING from {}",
                    request.request_id,
                    request.status.as_str()
                )));
            }
        }
        None => {}
    }

    if let Some(reason) = decline_reason {
        if request.status != RequestStatus::Declined {
            return Err(AppError::Validation(format!(
                "Decline reason only applies to declined requests; {} is {}",
                request.request_id,
                request.status.as_str()
            )));
        }
        request.decline_reason = Some(reason);
    }
    if let Some(sent_by) = &patch.sent_by {
        require_non_blank(sent_by, "Sent by")?;
        request.sent_by = sent_by.trim().to_string();
    }

    let request = db::update_request(&mut tx, &request).await?;
    tx.commit().await?;

    if previous != request.status {
        tracing::info!(
            request = %request.request_id,
            caller = %request.caller_id,
            from = previous.as_str(),
            to = request.status.as_str(),
            customers = affected,
            "Assignment request answered"
        );
    }
    Ok(request)
}

/// Resolve the request's caller for an answer.
///
/// A missing caller fails the whole answer instead of marking the request
/// answered with nothing assigned.
async fn load_caller(
    conn: &mut SqliteConnection,
    request: &AssignmentRequest,
) -> Result<Caller, AppError> {
    db::fetch_caller(conn, &request.caller).await?.ok_or_else(|| {
        AppError::PartialFailure(format!(
            "Caller {} for request {} no longer exists; no customers were changed",
            request.caller_id, request.request_id
        ))
    })
}

/// Accept side effects. Returns the number of customers assigned.
async fn apply_acceptance(
    conn: &mut SqliteConnection,
    request: &mut AssignmentRequest,
) -> Result<usize, AppError> {
    let mut caller = load_caller(conn, request).await?;
    let today = super::today();

    for snapshot in &request.customers {
        let customer = match db::fetch_customer_by_account(conn, snapshot.account_number.trim()).await? {
            Some(mut existing) => {
                detach_from_other_caller(conn, &existing, &caller.id).await?;
                existing.assign(&caller.id, &today);
                existing.amount_overdue = snapshot.amount_overdue;
                existing.days_overdue = snapshot.days_overdue;
                db::update_customer(conn, &existing).await?
            }
            None => {
                let customer = customer_from_snapshot(snapshot, &caller.id, &today);
                db::insert_customer(conn, &customer).await?;
                customer
            }
        };
        add_assignment(&mut caller, &customer.id);
    }

    recompute_load_and_status(&mut caller);
    db::update_caller(conn, &caller).await?;

    request.status = RequestStatus::Accepted;
    request.responded_date = Some(super::now_stamp());
    Ok(request.customers.len())
}

/// Decline side effects. Returns the number of customers released.
async fn apply_decline(
    conn: &mut SqliteConnection,
    request: &mut AssignmentRequest,
) -> Result<usize, AppError> {
    let mut caller = load_caller(conn, request).await?;
    let mut released: Vec<String> = Vec::new();

    for snapshot in &request.customers {
        let Some(mut customer) = resolve_for_decline(conn, snapshot).await? else {
            continue;
        };
        // A customer now owned by someone else is not this request's to release.
        if customer.assigned_to.is_some() && !customer.is_assigned_to(&caller.id) {
            tracing::debug!(
                customer = %customer.account_number,
                request = %request.request_id,
                "Skipping customer owned by another caller"
            );
            continue;
        }
        customer.release();
        db::update_customer(conn, &customer).await?;
        released.push(customer.id);
    }

    remove_assignments(&mut caller, &released);
    recompute_load_and_status(&mut caller);
    db::update_caller(conn, &caller).await?;

    request.status = RequestStatus::Declined;
    request.responded_date = Some(super::now_stamp());
    Ok(released.len())
}

/// Find the live customer behind a snapshot: by stored id first, then by
/// account number when the snapshot carries no id or a stale one.
async fn resolve_for_decline(
    conn: &mut SqliteConnection,
    snapshot: &CustomerSnapshot,
) -> Result<Option<Customer>, AppError> {
    if let Some(id) = snapshot.customer_id.as_deref() {
        if let Some(customer) = db::fetch_customer(conn, id).await? {
            return Ok(Some(customer));
        }
    }
    db::fetch_customer_by_account(conn, snapshot.account_number.trim()).await
}

/// Snapshots are stored trimmed so account lookups match imported keys.
fn normalize_snapshot(snapshot: &CustomerSnapshot) -> CustomerSnapshot {
    CustomerSnapshot {
        customer_id: snapshot
            .customer_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        account_number: snapshot.account_number.trim().to_string(),
        name: snapshot.name.trim().to_string(),
        contact_number: snapshot.contact_number.trim().to_string(),
        amount_overdue: snapshot.amount_overdue,
        days_overdue: snapshot.days_overdue,
    }
}

fn customer_from_snapshot(snapshot: &CustomerSnapshot, caller_id: &str, today: &str) -> Customer {
    let now = Utc::now().to_rfc3339();
    Customer {
        id: uuid::Uuid::new_v4().to_string(),
        account_number: snapshot.account_number.trim().to_string(),
        name: snapshot.name.trim().to_string(),
        contact_number: snapshot.contact_number.trim().to_string(),
        amount_overdue: snapshot.amount_overdue,
        days_overdue: snapshot.days_overdue,
        status: CustomerStatus::Overdue,
        response: None,
        previous_response: None,
        region: None,
        rtom: None,
        assigned_to: Some(caller_id.to_string()),
        assigned_date: Some(today.to_string()),
        contact_history: Vec::new(),
        created_at: now.clone(),
        updated_at: now,
        version: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateCallerRequest, ImportCustomer, TaskStatus};
    use crate::workflow::{test_support, workload};

    async fn caller(repo: &Repository, max_load: i64) -> Caller {
        workload::create_caller(
            repo,
            &CreateCallerRequest {
                name: "Kamal Silva".to_string(),
                phone_number: Some("0771112233".to_string()),
                status: None,
                max_load: Some(max_load),
            },
            20,
        )
        .await
        .unwrap()
    }

    fn snapshot(account: &str) -> CustomerSnapshot {
        CustomerSnapshot {
            customer_id: None,
            account_number: account.to_string(),
            name: format!("Customer {}", account),
            contact_number: "0112345678".to_string(),
            amount_overdue: 3200.5,
            days_overdue: 60,
        }
    }

    async fn imported_snapshots(repo: &Repository, accounts: &[&str]) -> Vec<CustomerSnapshot> {
        let records: Vec<ImportCustomer> = accounts
            .iter()
            .map(|a| ImportCustomer {
                account_number: a.to_string(),
                name: format!("Customer {}", a),
                contact_number: "0112345678".to_string(),
                amount_overdue: 1000.0,
                days_overdue: 30,
                region: Some("Western".to_string()),
                rtom: Some("CO".to_string()),
            })
            .collect();
        let summary = repo.import_customers(&records).await.unwrap();
        summary
            .customers
            .iter()
            .map(|c| CustomerSnapshot {
                customer_id: Some(c.id.clone()),
                account_number: c.account_number.clone(),
                name: c.name.clone(),
                contact_number: c.contact_number.clone(),
                amount_overdue: c.amount_overdue,
                days_overdue: c.days_overdue,
            })
            .collect()
    }

    async fn send(
        repo: &Repository,
        caller: &Caller,
        customers: Vec<CustomerSnapshot>,
    ) -> AssignmentRequest {
        create_request(
            repo,
            &CreateAssignmentRequest {
                caller_id: caller.caller_id.clone(),
                customers,
            },
            "admin",
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_does_not_touch_caller_or_customers() {
        let (repo, _dir) = test_support::repo().await;
        let caller = caller(&repo, 20).await;
        let snapshots = imported_snapshots(&repo, &["1001", "1002"]).await;

        let request = send(&repo, &caller, snapshots).await;
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.customers_sent, 2);
        assert_eq!(request.request_id, "REQ00001");
        assert_eq!(request.sent_by, "admin");
        assert_eq!(request.sent_date.len(), "DD/MM/YYYY HH:MM".len());

        let caller = repo.get_caller(&caller.id).await.unwrap().unwrap();
        assert_eq!(caller.current_load, 0);
        let customers = repo.list_customers(None, None).await.unwrap();
        assert!(customers
            .iter()
            .all(|c| c.status == CustomerStatus::Unassigned && c.assigned_to.is_none()));
    }

    #[tokio::test]
    async fn test_create_for_unknown_caller_is_not_found() {
        let (repo, _dir) = test_support::repo().await;
        let result = create_request(
            &repo,
            &CreateAssignmentRequest {
                caller_id: "CALLER999".to_string(),
                customers: vec![snapshot("1001")],
            },
            "admin",
        )
        .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_accept_assigns_and_creates_missing_customers() {
        let (repo, _dir) = test_support::repo().await;
        let caller = caller(&repo, 20).await;
        let request = send(
            &repo,
            &caller,
            vec![snapshot("1001"), snapshot("1002"), snapshot("1003")],
        )
        .await;

        let accepted = accept_request(&repo, &request.request_id).await.unwrap();
        assert_eq!(accepted.status, RequestStatus::Accepted);
        assert!(accepted.responded_date.is_some());

        let caller = repo.get_caller(&caller.caller_id).await.unwrap().unwrap();
        assert_eq!(caller.current_load, 3);
        assert_eq!(caller.assigned_customers.len(), 3);
        assert_eq!(caller.task_status, TaskStatus::Ongoing);

        let customers = repo.list_customers(Some(caller.id.as_str()), None).await.unwrap();
        assert_eq!(customers.len(), 3);
        for customer in &customers {
            assert_eq!(customer.status, CustomerStatus::Overdue);
            assert!(customer.is_assigned_to(&caller.id));
            assert!(customer.assigned_date.is_some());
            assert!(caller.assigned_customers.contains(&customer.id));
        }
    }

    #[tokio::test]
    async fn test_padded_account_number_matches_imported_customer() {
        let (repo, _dir) = test_support::repo().await;
        let caller = caller(&repo, 20).await;
        let imported = imported_snapshots(&repo, &["1001"]).await;

        let request = send(&repo, &caller, vec![snapshot(" 1001 ")]).await;
        assert_eq!(request.customers[0].account_number, "1001");

        accept_request(&repo, &request.id).await.unwrap();

        let all = repo.list_customers(None, None).await.unwrap();
        assert_eq!(all.len(), 1);
        let customer = repo
            .get_customer(imported[0].customer_id.as_deref().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(customer.is_assigned_to(&caller.id));
        assert_eq!(customer.status, CustomerStatus::Overdue);

        let second = send(&repo, &caller, vec![snapshot("1001  ")]).await;
        decline_request(&repo, &second.id, "Already working it").await.unwrap();
        let released = repo.get_customer(&customer.id).await.unwrap().unwrap();
        assert_eq!(released.status, CustomerStatus::Unassigned);
    }

    #[tokio::test]
    async fn test_accept_twice_conflicts_without_changes() {
        let (repo, _dir) = test_support::repo().await;
        let caller = caller(&repo, 20).await;
        let request = send(&repo, &caller, vec![snapshot("1001"), snapshot("1002")]).await;

        accept_request(&repo, &request.id).await.unwrap();
        let after_first = repo.get_caller(&caller.id).await.unwrap().unwrap();

        let second = accept_request(&repo, &request.id).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));

        let after_second = repo.get_caller(&caller.id).await.unwrap().unwrap();
        assert_eq!(after_second.assigned_customers, after_first.assigned_customers);
        assert_eq!(after_second.current_load, 2);
        assert_eq!(after_second.version, after_first.version);
    }

    #[tokio::test]
    async fn test_accepted_request_cannot_be_declined() {
        let (repo, _dir) = test_support::repo().await;
        let caller = caller(&repo, 20).await;
        let request = send(&repo, &caller, vec![snapshot("1001")]).await;

        accept_request(&repo, &request.id).await.unwrap();
        let result = decline_request(&repo, &request.id, "Changed my mind").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let stored = repo.get_request(&request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Accepted);
        assert!(stored.decline_reason.is_none());
        let caller = repo.get_caller(&caller.id).await.unwrap().unwrap();
        assert_eq!(caller.current_load, 1);
    }

    #[tokio::test]
    async fn test_decline_releases_customers() {
        let (repo, _dir) = test_support::repo().await;
        let caller = caller(&repo, 20).await;
        let snapshots = imported_snapshots(&repo, &["1001", "1002", "1003"]).await;
        let request = send(&repo, &caller, snapshots).await;

        let declined = decline_request(&repo, &request.request_id, "Too many customers")
            .await
            .unwrap();
        assert_eq!(declined.status, RequestStatus::Declined);
        assert_eq!(declined.decline_reason.as_deref(), Some("Too many customers"));
        assert!(declined.responded_date.is_some());

        let caller = repo.get_caller(&caller.id).await.unwrap().unwrap();
        assert_eq!(caller.current_load, 0);
        assert_eq!(caller.task_status, TaskStatus::Idle);
        for customer in repo.list_customers(None, None).await.unwrap() {
            assert_eq!(customer.status, CustomerStatus::Unassigned);
            assert!(customer.assigned_to.is_none());
            assert!(customer.assigned_date.is_none());
        }
    }

    #[tokio::test]
    async fn test_decline_requires_reason() {
        let (repo, _dir) = test_support::repo().await;
        let caller = caller(&repo, 20).await;
        let request = send(&repo, &caller, vec![snapshot("1001")]).await;

        let result = decline_request(&repo, &request.id, "   ").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        let stored = repo.get_request(&request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn test_missing_caller_fails_whole_accept() {
        let (repo, _dir) = test_support::repo().await;
        let caller = caller(&repo, 20).await;
        let snapshots = imported_snapshots(&repo, &["1001"]).await;
        let request = send(&repo, &caller, snapshots).await;

        workload::delete_caller(&repo, &caller.id).await.unwrap();

        let result = accept_request(&repo, &request.id).await;
        assert!(matches!(result, Err(AppError::PartialFailure(_))));

        let stored = repo.get_request(&request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Pending);
        assert!(stored.responded_date.is_none());
        let customer = repo.list_customers(None, None).await.unwrap().remove(0);
        assert_eq!(customer.status, CustomerStatus::Unassigned);
        assert!(customer.assigned_to.is_none());
    }

    #[tokio::test]
    async fn test_accept_moves_customer_off_previous_caller() {
        let (repo, _dir) = test_support::repo().await;
        let first = caller(&repo, 20).await;
        let second = caller(&repo, 20).await;

        let r1 = send(&repo, &first, vec![snapshot("1001"), snapshot("1002")]).await;
        accept_request(&repo, &r1.id).await.unwrap();
        let r2 = send(&repo, &second, vec![snapshot("1002")]).await;
        accept_request(&repo, &r2.id).await.unwrap();

        let first = repo.get_caller(&first.id).await.unwrap().unwrap();
        let second = repo.get_caller(&second.id).await.unwrap().unwrap();
        assert_eq!(first.current_load, 1);
        assert_eq!(second.current_load, 1);

        let moved = repo.list_customers(Some(second.id.as_str()), None).await.unwrap();
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].account_number, "1002");
        assert!(!first.assigned_customers.contains(&moved[0].id));
    }

    #[tokio::test]
    async fn test_duplicate_snapshots_assign_once() {
        let (repo, _dir) = test_support::repo().await;
        let caller = caller(&repo, 20).await;
        let request = send(&repo, &caller, vec![snapshot("1001"), snapshot("1001")]).await;

        accept_request(&repo, &request.id).await.unwrap();
        let caller = repo.get_caller(&caller.id).await.unwrap().unwrap();
        assert_eq!(caller.current_load, 1);
        assert_eq!(caller.assigned_customers.len(), 1);
    }

    #[tokio::test]
    async fn test_full_batch_marks_caller_completed() {
        let (repo, _dir) = test_support::repo().await;
        let caller = caller(&repo, 2).await;
        let request = send(&repo, &caller, vec![snapshot("1001"), snapshot("1002")]).await;

        accept_request(&repo, &request.id).await.unwrap();
        let caller = repo.get_caller(&caller.id).await.unwrap().unwrap();
        assert_eq!(caller.task_status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_update_completes_only_accepted_requests() {
        let (repo, _dir) = test_support::repo().await;
        let caller = caller(&repo, 20).await;
        let request = send(&repo, &caller, vec![snapshot("1001")]).await;

        let complete = UpdateAssignmentRequest {
            status: Some(RequestStatus::Completed),
            ..Default::default()
        };
        assert!(matches!(
            update_request(&repo, &request.id, &complete).await,
            Err(AppError::Conflict(_))
        ));

        accept_request(&repo, &request.id).await.unwrap();
        let completed = update_request(&repo, &request.id, &complete).await.unwrap();
        assert_eq!(completed.status, RequestStatus::Completed);
    }

    #[tokio::test]
    async fn test_update_applies_bookkeeping_fields() {
        let (repo, _dir) = test_support::repo().await;
        let caller = caller(&repo, 20).await;
        let request = send(&repo, &caller, vec![snapshot("1001")]).await;

        let updated = update_request(
            &repo,
            &request.id,
            &UpdateAssignmentRequest {
                sent_by: Some("supervisor".to_string()),
                expected_version: Some(request.version),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.sent_by, "supervisor");
        assert_eq!(updated.status, RequestStatus::Pending);

        let stale = update_request(
            &repo,
            &request.id,
            &UpdateAssignmentRequest {
                sent_by: Some("someone".to_string()),
                expected_version: Some(request.version),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(stale, Err(AppError::VersionMismatch { .. })));

        let stray_reason = update_request(
            &repo,
            &request.id,
            &UpdateAssignmentRequest {
                decline_reason: Some("why not".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(stray_reason, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_concurrent_accepts_apply_once() {
        let (repo, _dir) = test_support::repo().await;
        let caller = caller(&repo, 20).await;
        let request = send(
            &repo,
            &caller,
            vec![snapshot("1001"), snapshot("1002"), snapshot("1003")],
        )
        .await;

        let mut handles = Vec::new();
        for _ in 0..4 {
            let repo = repo.clone();
            let id = request.id.clone();
            handles.push(tokio::spawn(
                async move { accept_request(&repo, &id).await },
            ));
        }

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(AppError::Conflict(_)) => {}
                Err(other) => panic!("unexpected error: {}", other),
            }
        }
        assert_eq!(accepted, 1);

        let caller = repo.get_caller(&caller.id).await.unwrap().unwrap();
        assert_eq!(caller.current_load, 3);
        assert_eq!(caller.assigned_customers.len(), 3);
    }
}
