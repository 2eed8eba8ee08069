//! Caller API endpoints.

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use super::{error, respond_after_write, success, ApiJson, ApiResult};
use crate::errors::AppError;
use crate::models::{Caller, CallerStatus, CreateCallerRequest, EditWorkloadRequest, UpdateCallerRequest};
use crate::workflow::workload;
use crate::AppState;

/// Query parameters for listing callers.
#[derive(Debug, Deserialize)]
pub struct CallerQuery {
    #[serde(default)]
    pub status: Option<String>,
}

/// GET /api/callers - List callers.
pub async fn list_callers(
    State(state): State<AppState>,
    Query(params): Query<CallerQuery>,
) -> ApiResult<Vec<Caller>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let status = match params
        .status
        .as_deref()
        .map(str::parse::<CallerStatus>)
        .transpose()
    {
        Ok(status) => status,
        Err(e) => return error(e, revision_id),
    };

    match state.repo.list_callers(status).await {
        Ok(callers) => success(callers, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/callers/:id - Get a caller by internal id or CALLER###.
pub async fn get_caller(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Caller> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_caller(&id).await {
        Ok(Some(caller)) => success(caller, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Caller {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/callers - Register a caller.
pub async fn create_caller(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateCallerRequest>,
) -> ApiResult<Caller> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result =
        workload::create_caller(&state.repo, &request, state.config.default_max_load).await;
    respond_after_write(&state, result, revision_id).await
}

/// PUT /api/callers/:id - Update a caller's profile.
pub async fn update_caller(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateCallerRequest>,
) -> ApiResult<Caller> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = workload::update_caller(&state.repo, &id, &request).await;
    respond_after_write(&state, result, revision_id).await
}

/// PUT /api/callers/:id/workload - Replace a caller's assignment list.
pub async fn edit_workload(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<EditWorkloadRequest>,
) -> ApiResult<Caller> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = workload::edit_workload(&state.repo, &id, &request).await;
    respond_after_write(&state, result, revision_id).await
}

/// DELETE /api/callers/:id - Remove a caller with no assigned customers.
pub async fn delete_caller(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = workload::delete_caller(&state.repo, &id).await;
    respond_after_write(&state, result, revision_id).await
}
