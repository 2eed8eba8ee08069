//! Request authentication and actor identity.
//!
//! The API is gated by a pre-shared key compared in constant time. Who is
//! acting (the admin sending a batch) is resolved upstream and forwarded in
//! the `x-actor-id` header.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;

use crate::errors::{codes, ErrorDetails, ErrorResponse};

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";
/// Header carrying the resolved identity of the acting user.
pub const ACTOR_HEADER: &str = "x-actor-id";
/// Actor recorded when no identity is forwarded.
pub const DEFAULT_ACTOR: &str = "admin";

/// PSK authentication layer function that takes the expected PSK as a parameter.
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    // No PSK configured: dev mode, everything passes.
    let Some(expected) = expected_psk else {
        return next.run(request).await;
    };

    let api_key_ok = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|provided| constant_time_compare(provided, &expected));

    match api_key_ok {
        Some(true) => return next.run(request).await,
        Some(false) => return unauthorized_response("Invalid API key"),
        None => {}
    }

    let bearer_ok = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .is_some_and(|key| constant_time_compare(key, &expected));

    if bearer_ok {
        next.run(request).await
    } else {
        unauthorized_response("Missing or invalid API key")
    }
}

/// The identity on whose behalf a request is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub String);

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(actor_from_headers(parts))
    }
}

fn actor_from_headers(parts: &Parts) -> Actor {
    let actor = parts
        .headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_ACTOR);
    Actor(actor.to_string())
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorResponse {
        success: false,
        error: ErrorDetails {
            code: codes::UNAUTHORIZED.to_string(),
            message: message.to_string(),
            details: None,
        },
        revision_id: 0,
    };

    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    fn parts_with(header_value: Option<&str>) -> Parts {
        let mut builder = HttpRequest::builder().uri("/api/requests");
        if let Some(value) = header_value {
            builder = builder.header(ACTOR_HEADER, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("test-key-123", "test-key-123"));
        assert!(!constant_time_compare("test-key-123", "test-key-124"));
        assert!(!constant_time_compare("short", "much-longer-key"));
        assert!(constant_time_compare("", ""));
    }

    #[test]
    fn test_actor_header() {
        assert_eq!(
            actor_from_headers(&parts_with(Some("ops-lead"))),
            Actor("ops-lead".to_string())
        );
        assert_eq!(
            actor_from_headers(&parts_with(Some("   "))),
            Actor(DEFAULT_ACTOR.to_string())
        );
        assert_eq!(
            actor_from_headers(&parts_with(None)),
            Actor(DEFAULT_ACTOR.to_string())
        );
    }
}
