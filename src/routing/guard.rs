//! Edge session/route guard, evaluated once per request before rendering.
//!
//! # Responsibilities
//! - Refresh the session from request cookies; write rotated cookies onto
//!   the outgoing response, redirects included
//! - Enforce the route-rule table: unauthenticated matches go to login with
//!   a `redirectTo` return target, under-privileged matches go home
//!
//! # Design Decisions
//! - Role fetch happens only for role-gated prefixes
//! - A role lookup failure on a gated prefix redirects like a mismatch:
//!   fail closed

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use serde_json::json;

use crate::auth::identity::{resolve_role, Session};
use crate::http::request::cookie_value;
use crate::http::server::GatewayState;
use crate::security::events::EventLevel;

/// Axum middleware enforcing the role-partitioned route tree.
pub async fn session_route_guard(
    State(state): State<GatewayState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    let token = cookie_value(&req, &state.config.session.cookie_name);

    // 1. Refresh/derive the session from request cookies.
    let session: Option<Session> = match &token {
        Some(token) => match state.identity.current_session(token).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Session refresh failed");
                None
            }
        },
        None => None,
    };
    let refreshed_cookie = session.as_ref().and_then(|s| s.refreshed_cookie.clone());

    // 2. Match the request path against the ordered rule table.
    let mut response = match state.routes.matched(&path) {
        None => next.run(req).await,
        Some(rule) => match &session {
            // 3. Protected prefix without a session: send to login, keeping
            // the original path as the return target.
            None => Redirect::temporary(&state.routes.login_redirect(&path)).into_response(),
            Some(session) => {
                if let Some(required) = &rule.required_roles {
                    // 4. Role-gated prefix: fetch the role; anything short of
                    // a match goes to the neutral home page.
                    let role = match state.identity.fetch_profile(&session.principal.id).await {
                        Ok(Some(record)) => Some(resolve_role(&record)),
                        Ok(None) => None,
                        Err(e) => {
                            tracing::warn!(
                                principal = %session.principal.id,
                                error = %e,
                                "Role lookup failed at edge"
                            );
                            None
                        }
                    };
                    let allowed = role
                        .as_ref()
                        .map(|role| required.contains(role))
                        .unwrap_or(false);
                    if allowed {
                        next.run(req).await
                    } else {
                        state.events.log(
                            "route_role_denied",
                            json!({
                                "path": path,
                                "principal": session.principal.id,
                                "actual": role
                                    .map(|r| r.to_string())
                                    .unwrap_or_else(|| "unresolved".to_string()),
                            }),
                            EventLevel::Warn,
                        );
                        Redirect::temporary(&state.routes.home_path).into_response()
                    }
                } else {
                    next.run(req).await
                }
            }
        },
    };

    if let Some(cookie) = refreshed_cookie {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}
