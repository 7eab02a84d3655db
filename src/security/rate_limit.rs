//! Per-identifier rate limiting with named policies.
//!
//! # Responsibilities
//! - Resolve a named policy (or an ad-hoc override) and consult the counter
//!   store under the composite key `identifier:policy`
//! - Produce remaining-quota and reset metadata for response headers
//!
//! # Design Decisions
//! - Fixed-window counting, not sliding-window or token-bucket. A client can
//!   burst up to 2x `max_requests` in a short span straddling a window
//!   boundary; policy thresholds were tuned against fixed-window semantics,
//!   so this is accepted behavior rather than a bug.
//! - Every check mutates the store exactly once, rejected calls included.
//! - An empty identifier falls back to the shared `"unknown"` bucket.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::security::store::WindowedCounterStore;

pub const HEADER_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RESET: &str = "x-ratelimit-reset";

/// Immutable rate-limit policy: window length and request cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub window_ms: i64,
    pub max_requests: u32,
}

impl Policy {
    pub const fn new(window_ms: i64, max_requests: u32) -> Self {
        Self {
            window_ms,
            max_requests,
        }
    }
}

/// Outcome of a single rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
    /// Present only when the request was rejected.
    pub retry_after_secs: Option<u64>,
}

impl RateLimitResult {
    /// Stamp rate-limit metadata onto a response header map. Applied to every
    /// gated response, success or failure.
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        if let Ok(v) = HeaderValue::from_str(&self.remaining.to_string()) {
            headers.insert(HEADER_REMAINING, v);
        }
        if let Ok(v) = HeaderValue::from_str(&self.reset_at.to_rfc3339()) {
            headers.insert(HEADER_RESET, v);
        }
        if let Some(retry) = self.retry_after_secs {
            if let Ok(v) = HeaderValue::from_str(&retry.to_string()) {
                headers.insert(header::RETRY_AFTER, v);
            }
        }
    }
}

/// Fixed-window rate limiter over a shared counter store.
pub struct RateLimiter {
    store: Arc<WindowedCounterStore>,
    policies: HashMap<String, Policy>,
    default_policy: Policy,
}

impl RateLimiter {
    pub fn new(
        store: Arc<WindowedCounterStore>,
        policies: HashMap<String, Policy>,
        default_policy: Policy,
    ) -> Self {
        Self {
            store,
            policies,
            default_policy,
        }
    }

    /// The standard policy registry used when none is configured.
    pub fn default_policies() -> HashMap<String, Policy> {
        let mut m = HashMap::new();
        m.insert("default".into(), Policy::new(60_000, 100));
        m.insert("auth".into(), Policy::new(60_000, 20));
        m.insert("login".into(), Policy::new(300_000, 5));
        m.insert("register".into(), Policy::new(3_600_000, 3));
        m.insert("admin".into(), Policy::new(60_000, 30));
        m.insert("upload".into(), Policy::new(3_600_000, 20));
        m.insert("search".into(), Policy::new(60_000, 60));
        m.insert("chatbot".into(), Policy::new(60_000, 10));
        m
    }

    pub fn policy(&self, name: &str) -> Policy {
        self.policies
            .get(name)
            .copied()
            .unwrap_or(self.default_policy)
    }

    pub fn policies(&self) -> &HashMap<String, Policy> {
        &self.policies
    }

    pub fn store(&self) -> &Arc<WindowedCounterStore> {
        &self.store
    }

    /// Count one request for `identifier` under `policy_name` and report
    /// whether it is within quota. `override_policy` takes precedence over
    /// the named registry lookup.
    pub fn check(
        &self,
        identifier: &str,
        policy_name: &str,
        override_policy: Option<Policy>,
    ) -> RateLimitResult {
        let policy = override_policy.unwrap_or_else(|| self.policy(policy_name));
        let identifier = if identifier.is_empty() {
            "unknown"
        } else {
            identifier
        };
        let key = format!("{identifier}:{policy_name}");

        let entry = self.store.increment(&key, policy.window_ms);
        let allowed = entry.count <= policy.max_requests;
        let remaining = policy.max_requests.saturating_sub(entry.count);
        let reset_at = Utc
            .timestamp_millis_opt(entry.reset_at_ms)
            .single()
            .unwrap_or_else(Utc::now);

        let retry_after_secs = if allowed {
            None
        } else {
            let now = self.store.clock().now_ms();
            let millis_left = (entry.reset_at_ms - now).max(0) as u64;
            // Ceil to whole seconds, never advertise less than one.
            Some(millis_left.div_ceil(1000).max(1))
        };

        if !allowed {
            tracing::warn!(
                client = %identifier,
                policy = %policy_name,
                count = entry.count,
                "Rate limit exceeded"
            );
            crate::observability::metrics::record_rate_limited(policy_name);
        }

        RateLimitResult {
            allowed,
            remaining,
            reset_at,
            retry_after_secs,
        }
    }
}
