//! Assignment request API endpoints.

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use super::{error, respond_after_write, success, ApiJson, ApiResult};
use crate::auth::Actor;
use crate::errors::AppError;
use crate::models::{
    AssignmentRequest, CreateAssignmentRequest, DeclineAssignmentRequest, RequestStatus,
    UpdateAssignmentRequest,
};
use crate::workflow::requests;
use crate::AppState;

/// Query parameters for listing requests.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestQuery {
    /// Internal id or `CALLER###` of the receiving caller.
    #[serde(default)]
    pub caller_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// GET /api/requests - List requests, newest first.
pub async fn list_requests(
    State(state): State<AppState>,
    Query(params): Query<RequestQuery>,
) -> ApiResult<Vec<AssignmentRequest>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let status = match params
        .status
        .as_deref()
        .map(str::parse::<RequestStatus>)
        .transpose()
    {
        Ok(status) => status,
        Err(e) => return error(e, revision_id),
    };

    let caller = match params.caller_id.as_deref() {
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

    match state.repo.list_requests(caller.as_deref(), status).await {
        Ok(list) => success(list, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/requests/:id - Get a request by internal id or REQ#####.
pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<AssignmentRequest> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_request(&id).await {
        Ok(Some(request)) => success(request, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Request {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/requests - Send a batch of customers to a caller.
pub async fn create_request(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiJson(request): ApiJson<CreateAssignmentRequest>,
) -> ApiResult<AssignmentRequest> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = requests::create_request(&state.repo, &request, &actor).await;
    respond_after_write(&state, result, revision_id).await
}

/// PUT /api/requests/:id - Partially update a request.
pub async fn update_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<UpdateAssignmentRequest>,
) -> ApiResult<AssignmentRequest> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = requests::update_request(&state.repo, &id, &patch).await;
    if let Ok(request) = &result {
        reindex_batch(&state, request).await;
    }
    respond_after_write(&state, result, revision_id).await
}

/// POST /api/requests/:id/accept - Accept a pending request.
pub async fn accept_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<AssignmentRequest> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = requests::accept_request(&state.repo, &id).await;
    if let Ok(request) = &result {
        reindex_batch(&state, request).await;
    }
    respond_after_write(&state, result, revision_id).await
}

/// POST /api/requests/:id/decline - Decline a pending request.
pub async fn decline_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<DeclineAssignmentRequest>,
) -> ApiResult<AssignmentRequest> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = requests::decline_request(&state.repo, &id, &body.reason).await;
    // Decline only changes ownership and status, neither of which is indexed.
    respond_after_write(&state, result, revision_id).await
}

/// Refresh search entries for the batch's accounts; acceptance can create
/// customers and refresh their balances.
async fn reindex_batch(state: &AppState, request: &AssignmentRequest) {
    if request.status != RequestStatus::Accepted {
        return;
    }

    let mut customers = Vec::with_capacity(request.customers.len());
    for snapshot in &request.customers {
        match state
            .repo
            .get_customer_by_account(snapshot.account_number.trim())
            .await
        {
            Ok(Some(customer)) => customers.push(customer),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Failed to load customer for reindex: {}", e);
                return;
            }
        }
    }

    if let Err(e) = state.search.index_customers(&customers).await {
        tracing::warn!(request = %request.request_id, "Failed to reindex customers: {}", e);
    }
}
