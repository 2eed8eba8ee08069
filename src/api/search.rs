//! Customer search endpoint.

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use super::{error, success, ApiResult};
use crate::models::Customer;
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Account number, phone number or name fragment.
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    pub customer: Customer,
    pub score: f32,
}

const MAX_SEARCH_LIMIT: usize = 100;

/// GET /api/customers/search - Find customers by account, phone or name.
pub async fn search_customers(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let limit = params.limit.clamp(1, MAX_SEARCH_LIMIT);

    let hits = match state.search.search(&params.q, limit, params.offset) {
        Ok(hits) => hits,
        Err(e) => return error(e, revision_id),
    };

    // Hits only carry ids; status and ownership come from the store.
    let mut results = Vec::with_capacity(hits.len());
    for hit in hits {
        match state.repo.get_customer(&hit.customer_id).await {
            Ok(Some(customer)) => results.push(SearchResultItem {
                customer,
                score: hit.score,
            }),
            Ok(None) => {}
            Err(e) => return error(e, revision_id),
        }
    }

    let total = results.len();
    success(
        SearchResponse {
            results,
            total,
            limit,
            offset: params.offset,
        },
        revision_id,
    )
}
