//! Error taxonomy and its mapping onto the wire.
//!
//! # Responsibilities
//! - One enum covering every gateway rejection class
//! - `IntoResponse` producing the documented JSON shapes
//!
//! # Design Decisions
//! - Non-validation errors carry generic messages only; internals (stack
//!   traces, lookup errors, expected roles) are never surfaced
//! - Upstream identity/role failures map to Forbidden: fail closed, never
//!   fail open on an unresolved role

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::auth::identity::IdentityError;

/// A single field-level validation failure. Field paths and human messages
/// only, never submitted values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

/// Every way the gateway can refuse a request.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Retryable after the advertised delay; not a client bug.
    #[error("rate limit exceeded")]
    RateLimited { retry_after_secs: u64 },

    /// Likely CSRF attempt; not retryable without a same-origin request.
    #[error("request origin rejected")]
    OriginRejected,

    /// The client should re-authenticate.
    #[error("not authenticated")]
    Unauthenticated,

    /// Role mismatch. Never hints at which role would work.
    #[error("insufficient permissions")]
    Forbidden,

    /// Client-fixable, field-level detail returned.
    #[error("validation failed")]
    Validation { details: Vec<FieldIssue> },

    /// Body could not be parsed into a structured form at all.
    #[error("invalid request body")]
    InvalidBody,

    /// Identity/role store error; treated as Forbidden for safety.
    #[error("upstream lookup failed")]
    Upstream(#[from] IdentityError),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::RateLimited { retry_after_secs } => {
                let body = json!({
                    "error": "Too many requests",
                    "message": "Rate limit exceeded. Please try again later.",
                    "retryAfter": retry_after_secs,
                });
                let mut response =
                    (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
                if let Ok(v) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, v);
                }
                response
            }
            GatewayError::OriginRejected => (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "Forbidden",
                    "message": "Invalid request origin",
                })),
            )
                .into_response(),
            GatewayError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Unauthorized" })),
            )
                .into_response(),
            GatewayError::Forbidden | GatewayError::Upstream(_) => (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "Forbidden",
                    "message": "Insufficient permissions",
                })),
            )
                .into_response(),
            GatewayError::Validation { details } => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Validation failed",
                    "details": details,
                })),
            )
                .into_response(),
            GatewayError::InvalidBody => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid request body" })),
            )
                .into_response(),
        }
    }
}
