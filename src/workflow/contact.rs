//! Contact recording for a single customer.

use super::validation::validate_promised_date;
use crate::db::{self, Repository};
use crate::errors::AppError;
use crate::models::{ContactAttempt, ContactOutcome, Customer, CustomerStatus, RecordContactRequest};

/// Append a contact attempt and derive the customer's new status.
///
/// Paid accounts become COMPLETED, anything else PENDING. Only assigned
/// customers can be contacted. Callers and requests are never touched.
pub async fn record_contact(
    repo: &Repository,
    customer_id: &str,
    input: &RecordContactRequest,
) -> Result<Customer, AppError> {
    let outcome: ContactOutcome = input.outcome.trim().parse()?;
    let promised_date = validate_promised_date(input.promised_date.as_deref())?;
    let response = input.response.trim().to_string();

    let mut tx = repo.begin_write().await?;
    let mut customer = db::fetch_customer(&mut tx, customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", customer_id)))?;
    if customer.assigned_to.is_none() {
        return Err(AppError::Conflict(format!(
            "Customer {} is not assigned to a caller",
            customer.account_number
        )));
    }

    let attempt = ContactAttempt {
        date: super::today(),
        outcome,
        response: response.clone(),
        promised_date,
        payment_made: input.payment_made,
    };
    db::append_contact_attempt(&mut tx, &customer.id, &attempt).await?;

    customer.status = if input.payment_made {
        CustomerStatus::Completed
    } else {
        CustomerStatus::Pending
    };
    customer.previous_response = Some(response.clone());
    customer.response = Some(response);

    let mut customer = db::update_customer(&mut tx, &customer).await?;
    customer.contact_history.push(attempt);
    tx.commit().await?;

    tracing::info!(
        customer = %customer.account_number,
        outcome = outcome.as_str(),
        payment_made = input.payment_made,
        status = customer.status.as_str(),
        attempts = customer.contact_history.len(),
        "Contact recorded"
    );
    Ok(customer)
}
