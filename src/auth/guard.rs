//! Ordered authorization pipeline wrapped around handlers.
//!
//! # Responsibilities
//! - Rate limit → origin check → auth resolution → role check → handler,
//!   strictly in that order; first failure wins
//! - Stamp rate-limit metadata on every response, rejections included
//!
//! # Design Decisions
//! - Cheap checks run before expensive ones: the counter store is consulted
//!   before any identity-store round trip
//! - Steps before the handler are pure gatekeeping; no handler side effects
//!   can occur until authorization fully succeeds
//! - A required role with an unresolved profile fails closed (403), even for
//!   a legitimately authenticated principal during a backing-store outage

use std::future::Future;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::auth::identity::Role;
use crate::auth::resolver::{AuthContext, AuthResolver};
use crate::http::request::RequestMeta;
use crate::http::response::GatewayError;
use crate::security::events::{EventLevel, SecurityEventLog};
use crate::security::origin::OriginValidator;
use crate::security::rate_limit::{Policy, RateLimitResult, RateLimiter};

/// Rate-limit policies whose exhaustion is itself a security signal.
const SENSITIVE_POLICIES: &[&str] = &["auth", "login", "register", "admin"];

/// Per-route guard configuration.
#[derive(Debug, Clone, Default)]
pub struct GuardOptions {
    pub require_auth: bool,
    /// Allow-list of roles. Non-empty implies authentication is required.
    pub required_roles: Vec<Role>,
    /// Named policy; `None` selects `"default"`.
    pub rate_limit_policy: Option<String>,
    /// Ad-hoc policy taking precedence over the named registry.
    pub override_policy: Option<Policy>,
    pub require_origin_check: bool,
}

impl GuardOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require_auth(mut self) -> Self {
        self.require_auth = true;
        self
    }

    pub fn roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.required_roles = roles.into_iter().collect();
        self
    }

    pub fn policy(mut self, name: impl Into<String>) -> Self {
        self.rate_limit_policy = Some(name.into());
        self
    }

    pub fn override_policy(mut self, policy: Policy) -> Self {
        self.override_policy = Some(policy);
        self
    }

    pub fn origin_check(mut self) -> Self {
        self.require_origin_check = true;
        self
    }

    fn policy_name(&self) -> &str {
        self.rate_limit_policy.as_deref().unwrap_or("default")
    }
}

/// Composes the rate limiter, origin validator, auth resolver and a role
/// allow-list into one pipeline around a handler.
#[derive(Clone)]
pub struct AuthorizationGuard {
    limiter: Arc<RateLimiter>,
    origins: Arc<OriginValidator>,
    resolver: AuthResolver,
    events: Arc<SecurityEventLog>,
}

impl AuthorizationGuard {
    pub fn new(
        limiter: Arc<RateLimiter>,
        origins: Arc<OriginValidator>,
        resolver: AuthResolver,
        events: Arc<SecurityEventLog>,
    ) -> Self {
        Self {
            limiter,
            origins,
            resolver,
            events,
        }
    }

    /// Run steps 1–4 of the pipeline. The rate-limit result is returned for
    /// both outcomes so callers can stamp headers on every exit path.
    pub async fn authorize(
        &self,
        meta: &RequestMeta,
        opts: &GuardOptions,
    ) -> (RateLimitResult, Result<AuthContext, GatewayError>) {
        let policy_name = opts.policy_name();

        // 1. Rate limit. Mutates shared state exactly once per request.
        let limit = self
            .limiter
            .check(&meta.identifier, policy_name, opts.override_policy);
        if !limit.allowed {
            if SENSITIVE_POLICIES.contains(&policy_name) {
                self.events.log(
                    "rate_limit_exhausted",
                    json!({
                        "client": meta.identifier,
                        "policy": policy_name,
                        "path": meta.path,
                    }),
                    EventLevel::Warn,
                );
            }
            let retry_after_secs = limit.retry_after_secs.unwrap_or(1);
            return (limit, Err(GatewayError::RateLimited { retry_after_secs }));
        }

        // 2. Origin check, state-changing verbs only.
        if opts.require_origin_check
            && OriginValidator::applies_to(&meta.method)
            && !self
                .origins
                .check(meta.origin.as_deref(), meta.referer.as_deref())
        {
            self.events.log(
                "origin_rejected",
                json!({
                    "client": meta.identifier,
                    "method": meta.method.as_str(),
                    "path": meta.path,
                    "origin": meta.origin,
                    "referer": meta.referer,
                }),
                EventLevel::Warn,
            );
            return (limit, Err(GatewayError::OriginRejected));
        }

        // 3. Auth resolution. A role requirement implies an auth requirement.
        let auth = self.resolver.resolve(meta.session_token.as_deref()).await;
        if (opts.require_auth || !opts.required_roles.is_empty()) && !auth.is_authenticated() {
            return (limit, Err(GatewayError::Unauthenticated));
        }

        // 4. Role check. An unresolved profile never satisfies a role gate.
        if !opts.required_roles.is_empty() {
            let actual = auth.profile.as_ref().map(|p| p.role.clone());
            let allowed = actual
                .as_ref()
                .map(|role| opts.required_roles.contains(role))
                .unwrap_or(false);
            if !allowed {
                self.events.log(
                    "role_mismatch",
                    json!({
                        "client": meta.identifier,
                        "path": meta.path,
                        "required": opts
                            .required_roles
                            .iter()
                            .map(Role::to_string)
                            .collect::<Vec<_>>(),
                        "actual": actual
                            .map(|r| r.to_string())
                            .unwrap_or_else(|| "unresolved".to_string()),
                    }),
                    EventLevel::Warn,
                );
                return (limit, Err(GatewayError::Forbidden));
            }
        }

        (limit, Ok(auth))
    }

    /// Full pipeline: authorize, invoke the handler on success, and stamp
    /// rate-limit headers on whichever response results.
    pub async fn run<F, Fut>(&self, meta: &RequestMeta, opts: &GuardOptions, handler: F) -> Response
    where
        F: FnOnce(AuthContext) -> Fut,
        Fut: Future<Output = Response>,
    {
        let (limit, outcome) = self.authorize(meta, opts).await;
        let mut response = match outcome {
            Ok(auth) => handler(auth).await,
            Err(error) => error.into_response(),
        };
        limit.apply_headers(response.headers_mut());
        crate::observability::metrics::record_gated(response.status().as_u16());
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use axum::http::{Method, StatusCode};

    use crate::auth::identity::{
        InMemoryIdentityStore, Principal, ProfileRecord, Session,
    };
    use crate::security::store::{ManualClock, WindowedCounterStore};

    struct Fixture {
        guard: AuthorizationGuard,
        events: Arc<SecurityEventLog>,
        identity: Arc<InMemoryIdentityStore>,
        hits: Arc<AtomicU32>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(WindowedCounterStore::new(clock));
        let limiter = Arc::new(RateLimiter::new(
            store,
            RateLimiter::default_policies(),
            Policy::new(60_000, 100),
        ));
        let origins = Arc::new(OriginValidator::new(vec![
            "https://jobs.example.com".to_string(),
        ]));
        let events = Arc::new(SecurityEventLog::with_capture(false));

        let identity = Arc::new(InMemoryIdentityStore::new());
        identity.insert_session(
            "tok-emp",
            Session {
                principal: Principal {
                    id: "emp-1".into(),
                    email: "emp@example.com".into(),
                },
                refreshed_cookie: None,
            },
        );
        identity.insert_profile(ProfileRecord {
            id: "emp-1".into(),
            email: "emp@example.com".into(),
            profile_role: Some("employer".into()),
            ..ProfileRecord::default()
        });

        let guard = AuthorizationGuard::new(
            limiter,
            origins,
            AuthResolver::new(identity.clone()),
            events.clone(),
        );
        Fixture {
            guard,
            events,
            identity,
            hits: Arc::new(AtomicU32::new(0)),
        }
    }

    fn meta(token: Option<&str>) -> RequestMeta {
        RequestMeta {
            identifier: "1.2.3.4".into(),
            method: Method::POST,
            path: "/api/jobs".into(),
            origin: Some("https://jobs.example.com".into()),
            referer: None,
            session_token: token.map(str::to_string),
        }
    }

    async fn run(f: &Fixture, meta: &RequestMeta, opts: &GuardOptions) -> Response {
        let hits = f.hits.clone();
        f.guard
            .run(meta, opts, |_auth| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                StatusCode::CREATED.into_response()
            })
            .await
    }

    #[tokio::test]
    async fn test_no_session_returns_401_without_calling_handler() {
        let f = fixture();
        let opts = GuardOptions::new().require_auth();
        let response = run(&f, &meta(None), &opts).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(f.hits.load(Ordering::SeqCst), 0, "handler must not run");
        // Rate-limit metadata present even on rejection.
        assert!(response.headers().contains_key("x-ratelimit-remaining"));
    }

    #[tokio::test]
    async fn test_role_mismatch_returns_403_and_logs_one_event() {
        let f = fixture();
        let opts = GuardOptions::new().roles([Role::Admin]);
        let response = run(&f, &meta(Some("tok-emp")), &opts).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(f.hits.load(Ordering::SeqCst), 0);

        let events = f.events.captured();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "role_mismatch");
        assert_eq!(events[0].details["actual"], "employer");
        assert_eq!(events[0].details["required"][0], "admin");
    }

    #[tokio::test]
    async fn test_matching_role_reaches_handler() {
        let f = fixture();
        let opts = GuardOptions::new().roles([Role::Employer, Role::Admin]);
        let response = run(&f, &meta(Some("tok-emp")), &opts).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(f.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unresolved_profile_fails_closed() {
        let f = fixture();
        f.identity.fail_profile_lookups(true);
        let opts = GuardOptions::new().roles([Role::Employer]);
        let response = run(&f, &meta(Some("tok-emp")), &opts).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let events = f.events.captured();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].details["actual"], "unresolved");
    }

    #[tokio::test]
    async fn test_foreign_origin_rejected_before_auth() {
        let f = fixture();
        let opts = GuardOptions::new().require_auth().origin_check();
        let mut m = meta(Some("tok-emp"));
        m.origin = Some("https://evil.example.net".into());
        let response = run(&f, &m, &opts).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(f.events.captured()[0].event, "origin_rejected");
    }

    #[tokio::test]
    async fn test_get_bypasses_origin_check() {
        let f = fixture();
        let opts = GuardOptions::new().origin_check();
        let mut m = meta(None);
        m.method = Method::GET;
        m.origin = Some("https://evil.example.net".into());
        let response = run(&f, &m, &opts).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_before_everything() {
        let f = fixture();
        let opts = GuardOptions::new()
            .require_auth()
            .policy("login")
            .override_policy(Policy::new(60_000, 1));
        let m = meta(None);
        let first = run(&f, &m, &opts).await;
        assert_eq!(first.status(), StatusCode::UNAUTHORIZED);
        let second = run(&f, &m, &opts).await;
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key("retry-after"));
        // Exhaustion on a sensitive policy is itself a security event.
        let events = f.events.captured();
        assert_eq!(events.last().unwrap().event, "rate_limit_exhausted");
    }
}
