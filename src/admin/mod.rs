//! Internal admin surface, gated by the bootstrap token.
//!
//! Mounted under `/internal` so machine callers (bootstrap scripts,
//! scheduled jobs) are not subject to the session-based route tree that
//! protects the browser-facing `/admin` pages.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::GatewayState;

pub fn admin_router(state: GatewayState) -> Router<GatewayState> {
    Router::new()
        .route("/internal/status", get(get_status))
        .route("/internal/policies", get(get_policies))
        .layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
