//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Own the gateway's shared state (counter store, limiter, event log)
//! - Wire up middleware (tracing, timeout, request ID, session route guard)
//! - Mount the admin surface and merge application routes
//! - Bind the server and run it with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::routing::get;
use axum::{middleware, Json, Router};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin;
use crate::auth::guard::AuthorizationGuard;
use crate::auth::identity::IdentityStore;
use crate::auth::resolver::AuthResolver;
use crate::config::schema::GatewayConfig;
use crate::http::request::{RequestIdLayer, RequestMeta};
use crate::routing::guard::session_route_guard;
use crate::routing::rules::RouteTable;
use crate::security::events::SecurityEventLog;
use crate::security::origin::OriginValidator;
use crate::security::rate_limit::RateLimiter;
use crate::security::store::{Clock, SystemClock, WindowedCounterStore};

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<GatewayConfig>,
    pub identity: Arc<dyn IdentityStore>,
    pub limiter: Arc<RateLimiter>,
    pub guard: AuthorizationGuard,
    pub events: Arc<SecurityEventLog>,
    pub routes: Arc<RouteTable>,
}

impl GatewayState {
    /// Standard construction: wall clock, event emission per config.
    pub fn new(config: GatewayConfig, identity: Arc<dyn IdentityStore>) -> Self {
        let events = Arc::new(SecurityEventLog::new(config.security.log_security_events));
        Self::with_parts(config, identity, Arc::new(SystemClock), events)
    }

    /// Full construction with an injectable clock and event log; tests use
    /// this to control time and capture events.
    pub fn with_parts(
        config: GatewayConfig,
        identity: Arc<dyn IdentityStore>,
        clock: Arc<dyn Clock>,
        events: Arc<SecurityEventLog>,
    ) -> Self {
        let store = Arc::new(WindowedCounterStore::new(clock));
        let limiter = Arc::new(RateLimiter::new(
            store,
            config.rate_limit.policy_registry(),
            config.rate_limit.default_policy.into(),
        ));
        let origins = Arc::new(OriginValidator::new(
            config.security.allowed_origins.clone(),
        ));
        let guard = AuthorizationGuard::new(
            limiter.clone(),
            origins,
            AuthResolver::new(identity.clone()),
            events.clone(),
        );
        let routes = Arc::new(config.route_table());
        Self {
            config: Arc::new(config),
            identity,
            limiter,
            guard,
            events,
            routes,
        }
    }

    /// Extract the guard pipeline's per-request facts.
    pub fn request_meta(&self, req: &Request<Body>, remote: Option<SocketAddr>) -> RequestMeta {
        RequestMeta::from_request(req, remote, &self.config.session.cookie_name)
    }
}

/// HTTP server for the security gateway. Application routes (the CRUD
/// surface) are merged in by the embedder; this type owns the gatekeeping
/// layers around them.
pub struct GatewayServer {
    state: GatewayState,
    app: Router<GatewayState>,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig, identity: Arc<dyn IdentityStore>) -> Self {
        Self::from_state(GatewayState::new(config, identity))
    }

    pub fn from_state(state: GatewayState) -> Self {
        let mut app = Router::new().route("/health", get(health));
        if state.config.admin.enabled {
            app = app.merge(admin::admin_router(state.clone()));
        }
        Self { state, app }
    }

    /// Merge application routes. Handlers receive [`GatewayState`] and wrap
    /// themselves with `state.guard.run(...)`.
    pub fn merge(mut self, routes: Router<GatewayState>) -> Self {
        self.app = self.app.merge(routes);
        self
    }

    pub fn state(&self) -> GatewayState {
        self.state.clone()
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(&self) -> Router {
        self.app
            .clone()
            .with_state(self.state.clone())
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.state.config.timeouts.request_secs,
            )))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                session_route_guard,
            ))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gateway starting");

        // The sweeper lives as long as the server; dropping the handle on
        // shutdown aborts the task.
        let _sweeper = self.state.limiter.store().spawn_sweeper(Duration::from_secs(
            self.state.config.rate_limit.sweep_interval_secs,
        ));

        let app = self
            .build_router()
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
    }
    tracing::info!("Shutdown signal received");
}
