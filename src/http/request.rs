//! Request identification and metadata extraction.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) as early as possible and echo it
//!   on every response, whatever the outcome
//! - Extract the best-effort client identifier for rate limiting
//! - Pull the session token out of request cookies
//!
//! # Design Decisions
//! - Client identifier order: `X-Forwarded-For` (leftmost) → `X-Real-IP` →
//!   socket address → literal `"unknown"`; never empty
//! - An inbound `x-request-id` is preserved rather than replaced

use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{HeaderValue, Method, Request};
use axum::response::Response;
use tower::{Layer, Service};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID attached to request extensions by [`RequestIdLayer`].
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Tower layer that stamps a request ID on request and response.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RequestIdService<S>
where
    S: Service<Request<Body>, Response = Response>,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future =
        Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let id = req
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if let Ok(value) = HeaderValue::from_str(&id) {
            req.headers_mut().insert(X_REQUEST_ID, value);
        }
        req.extensions_mut().insert(RequestId(id.clone()));

        let future = self.inner.call(req);
        Box::pin(async move {
            let mut response = future.await?;
            if let Ok(value) = HeaderValue::from_str(&id) {
                response.headers_mut().insert(X_REQUEST_ID, value);
            }
            Ok(response)
        })
    }
}

/// Per-request facts the guard pipeline needs, extracted once.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    /// Best-effort client address; never empty.
    pub identifier: String,
    pub method: Method,
    pub path: String,
    pub origin: Option<String>,
    pub referer: Option<String>,
    pub session_token: Option<String>,
}

impl RequestMeta {
    pub fn from_request(
        req: &Request<Body>,
        remote: Option<SocketAddr>,
        session_cookie: &str,
    ) -> Self {
        let headers = req.headers();
        Self {
            identifier: client_identifier(req, remote),
            method: req.method().clone(),
            path: req.uri().path().to_string(),
            origin: headers
                .get("origin")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            referer: headers
                .get("referer")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            session_token: cookie_value(req, session_cookie),
        }
    }
}

/// Extract the client identifier from proxy headers, falling back to the
/// socket address and finally a shared `"unknown"` bucket.
pub fn client_identifier(req: &Request<Body>, remote: Option<SocketAddr>) -> String {
    // X-Forwarded-For: client, proxy1, proxy2 - leftmost is the real client.
    if let Some(xff) = req.headers().get("x-forwarded-for") {
        if let Ok(s) = xff.to_str() {
            if let Some(ip) = s.split(',').next().map(str::trim) {
                if !ip.is_empty() {
                    return ip.to_string();
                }
            }
        }
    }

    if let Some(xri) = req.headers().get("x-real-ip") {
        if let Ok(s) = xri.to_str() {
            if !s.is_empty() {
                return s.to_string();
            }
        }
    }

    remote
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Read a single cookie value from the `Cookie` header.
pub fn cookie_value(req: &Request<Body>, name: &str) -> Option<String> {
    let header = req.headers().get("cookie")?.to_str().ok()?;
    for pair in header.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        if parts.next() == Some(name) {
            let value = parts.next().unwrap_or("");
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}
