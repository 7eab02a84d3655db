//! Shared utilities for gateway integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use jobgate::auth::guard::GuardOptions;
use jobgate::auth::identity::{
    InMemoryIdentityStore, Principal, ProfileRecord, Session,
};
use jobgate::auth::Role;
use jobgate::config::GatewayConfig;
use jobgate::http::response::FieldIssue;
use jobgate::http::server::{GatewayServer, GatewayState};
use jobgate::security::events::SecurityEventLog;
use jobgate::security::store::SystemClock;
use jobgate::validate::{validate_body, InputSchema};

pub const ADMIN_TOKEN: &str = "test-bootstrap-token-1234";
pub const COOKIE: &str = "jb-session";

pub struct TestGateway {
    pub base: String,
    pub state: GatewayState,
    pub hits: Arc<AtomicU32>,
}

/// Login schema with per-field reporting, standing in for the application's
/// entity schemas.
struct LoginSchema;

impl InputSchema for LoginSchema {
    type Output = (String, String);

    fn parse(&self, input: &Value) -> Result<Self::Output, Vec<FieldIssue>> {
        let mut issues = Vec::new();
        let email = input.get("email").and_then(Value::as_str).unwrap_or("");
        let password = input.get("password").and_then(Value::as_str).unwrap_or("");
        if !email.contains('@') {
            issues.push(FieldIssue {
                field: "email".into(),
                message: "must be a valid email address".into(),
            });
        }
        if password.len() < 8 {
            issues.push(FieldIssue {
                field: "password".into(),
                message: "must be at least 8 characters".into(),
            });
        }
        if issues.is_empty() {
            Ok((email.to_string(), password.to_string()))
        } else {
            Err(issues)
        }
    }
}

fn seed_identity() -> Arc<InMemoryIdentityStore> {
    let identity = InMemoryIdentityStore::new();
    for (token, id, role) in [
        ("tok-admin", "u-admin", "admin"),
        ("tok-emp", "u-emp", "employer"),
        ("tok-seeker", "u-seeker", "jobseeker"),
    ] {
        identity.insert_session(
            token,
            Session {
                principal: Principal {
                    id: id.into(),
                    email: format!("{id}@example.com"),
                },
                refreshed_cookie: None,
            },
        );
        identity.insert_profile(ProfileRecord {
            id: id.into(),
            email: format!("{id}@example.com"),
            profile_role: Some(role.into()),
            ..ProfileRecord::default()
        });
    }
    Arc::new(identity)
}

/// Start a gateway on an ephemeral port with seeded sessions and the test
/// application routes mounted behind the guard.
pub async fn start_gateway() -> TestGateway {
    let mut config = GatewayConfig::default();
    config.admin.enabled = true;
    config.admin.bootstrap_token = ADMIN_TOKEN.to_string();
    config.security.allowed_origins = vec!["http://localhost:3000".to_string()];

    let identity = seed_identity();
    let events = Arc::new(SecurityEventLog::with_capture(false));
    let state = GatewayState::with_parts(config, identity, Arc::new(SystemClock), events);

    let hits = Arc::new(AtomicU32::new(0));
    let server = GatewayServer::from_state(state.clone()).merge(app_routes(hits.clone()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    TestGateway {
        base: format!("http://{addr}"),
        state,
        hits,
    }
}

fn app_routes(hits: Arc<AtomicU32>) -> Router<GatewayState> {
    let jobs_hits = hits.clone();
    let create_job = move |State(state): State<GatewayState>,
                           ConnectInfo(remote): ConnectInfo<SocketAddr>,
                           req: Request<Body>| {
        let hits = jobs_hits.clone();
        async move {
            let meta = state.request_meta(&req, Some(remote));
            let opts = GuardOptions::new()
                .roles([Role::Employer, Role::Admin])
                .origin_check();
            state
                .guard
                .run(&meta, &opts, |_auth| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::CREATED, Json(json!({"created": true}))).into_response()
                })
                .await
        }
    };

    let login = move |State(state): State<GatewayState>,
                      ConnectInfo(remote): ConnectInfo<SocketAddr>,
                      req: Request<Body>| async move {
        let meta = state.request_meta(&req, Some(remote));
        let opts = GuardOptions::new().policy("login");
        let body = match axum::body::to_bytes(req.into_body(), 64 * 1024).await {
            Ok(bytes) => bytes,
            Err(_) => return StatusCode::BAD_REQUEST.into_response(),
        };
        state
            .guard
            .run(&meta, &opts, |_auth| async move {
                match validate_body(&body, &LoginSchema) {
                    Ok((email, _password)) => {
                        Json(json!({"ok": true, "email": email})).into_response()
                    }
                    Err(error) => error.into_response(),
                }
            })
            .await
    };

    Router::new()
        .route("/api/jobs", post(create_job))
        .route("/api/auth/login", post(login))
        .route("/admin/reports", get(|| async { "reports" }))
        .route("/dashboard", get(|| async { "dashboard" }))
}

/// Client that never follows redirects, so tests can assert on them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

/// Client bound to a specific loopback address, so tests can present
/// distinct source addresses to the gateway.
pub fn client_from(ip: &str) -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .local_address(ip.parse::<std::net::IpAddr>().unwrap())
        .no_proxy()
        .build()
        .unwrap()
}
