//! Customer API endpoints.

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use super::{error, respond_after_write, success, ApiJson, ApiResult};
use crate::errors::AppError;
use crate::models::{Customer, CustomerStatus, ImportCustomersRequest, ImportSummary, RecordContactRequest};
use crate::workflow::{contact, validation};
use crate::AppState;

/// Query parameters for listing customers.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerQuery {
    /// Internal id or `CALLER###` of the owning caller.
    #[serde(default)]
    pub caller_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// GET /api/customers - List customers, optionally filtered.
pub async fn list_customers(
    State(state): State<AppState>,
    Query(params): Query<CustomerQuery>,
) -> ApiResult<Vec<Customer>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let status = match params
        .status
        .as_deref()
        .map(str::parse::<CustomerStatus>)
        .transpose()
    {
        Ok(status) => status,
        Err(e) => return error(e, revision_id),
    };

    let owner = match params.caller_id.as_deref() {
        Some(key) => match state.repo.get_caller(key).await {
            Ok(Some(caller)) => Some(caller.id),
            Ok(None) => {
                return error(
                    AppError::NotFound(format!("Caller {} not found", key)),
                    revision_id,
                )
            }
            Err(e) => return error(e, revision_id),
        },
        None => None,
    };

    match state.repo.list_customers(owner.as_deref(), status).await {
        Ok(customers) => success(customers, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/customers/:id - Get a customer with contact history.
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Customer> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_customer(&id).await {
        Ok(Some(customer)) => success(customer, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Customer {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/customers/import - Upsert importer records.
pub async fn import_customers(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ImportCustomersRequest>,
) -> ApiResult<ImportSummary> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = validation::validate_import(&request.customers) {
        return error(e, revision_id);
    }

    let summary = match state.repo.import_customers(&request.customers).await {
        Ok(summary) => summary,
        Err(e) => return error(e, revision_id),
    };

    if let Err(e) = state.search.index_customers(&summary.customers).await {
        tracing::warn!("Failed to index imported customers: {}", e);
    }

    tracing::info!(
        created = summary.created,
        updated = summary.updated,
        "Customers imported"
    );
    respond_after_write(&state, Ok(summary), revision_id).await
}

/// POST /api/customers/:id/contacts - Record a contact attempt.
pub async fn record_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<RecordContactRequest>,
) -> ApiResult<Customer> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = contact::record_contact(&state.repo, &id, &request).await;
    respond_after_write(&state, result, revision_id).await
}
