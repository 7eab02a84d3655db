//! Bootstrap-token authentication for the internal admin surface.

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::http::request::client_identifier;
use crate::http::response::GatewayError;
use crate::security::compare::constant_time_eq;
use crate::security::events::EventLevel;
use crate::http::server::GatewayState;

pub async fn admin_auth_middleware(
    State(state): State<GatewayState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let identifier = client_identifier(&request, remote);

    // Brute-force protection before the token check.
    let limit = state.limiter.check(&identifier, "admin", None);
    if !limit.allowed {
        let retry_after_secs = limit.retry_after_secs.unwrap_or(1);
        let mut response = GatewayError::RateLimited { retry_after_secs }.into_response();
        limit.apply_headers(response.headers_mut());
        return response;
    }

    let presented = request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let valid = presented
        .map(|token| constant_time_eq(token, &state.config.admin.bootstrap_token))
        .unwrap_or(false);

    if !valid {
        state.events.log(
            "admin_token_rejected",
            json!({
                "client": identifier,
                "path": request.uri().path(),
            }),
            EventLevel::Warn,
        );
        let mut response = GatewayError::Unauthenticated.into_response();
        limit.apply_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    limit.apply_headers(response.headers_mut());
    response
}
