//! REST API module.
//!
//! Handlers translate HTTP into workflow calls and wrap results in the
//! `{ success, data, revisionId }` envelope.

mod callers;
mod customers;
mod requests;
mod search;

pub use callers::*;
pub use customers::*;
pub use requests::*;
pub use search::*;

use axum::{
    extract::{FromRequest, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::{AppError, AppErrorWithRevision};
use crate::models::RevisionInfo;
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, revision_id: i64) -> Self {
        Self {
            success: true,
            data,
            revision_id,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// JSON body extractor whose rejection uses the error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppErrorWithRevision))]
pub struct ApiJson<T>(pub T);

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppErrorWithRevision>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, revision_id: i64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, revision_id))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: AppError, revision_id: i64) -> ApiResult<T> {
    Err(AppErrorWithRevision {
        error: err,
        revision_id,
    })
}

/// Wrap a write result, reporting the revision it produced.
async fn respond_after_write<T: Serialize>(
    state: &AppState,
    result: Result<T, AppError>,
    revision_before: i64,
) -> ApiResult<T> {
    match result {
        Ok(data) => {
            let revision = state
                .repo
                .get_revision_id()
                .await
                .unwrap_or(revision_before);
            success(data, revision)
        }
        Err(e) => error(e, revision_before),
    }
}

/// GET /api/revision - Get the current revision info.
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    match state.repo.get_revision_info().await {
        Ok(info) => {
            let revision_id = info.revision_id;
            success(info, revision_id)
        }
        Err(e) => error(e, 0),
    }
}
