//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::auth::identity::Role;
use crate::routing::rules::{RouteRule, RouteTable};
use crate::security::rate_limit::{Policy, RateLimiter};

/// Root configuration for the security gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, connection cap).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Rate limiting policies and sweep cadence.
    pub rate_limit: RateLimitConfig,

    /// Origin allow-list and security event emission.
    pub security: SecurityConfig,

    /// Session cookie and redirect paths.
    pub session: SessionConfig,

    /// Route-prefix → required-role rules, most-specific-first.
    pub routes: Vec<RouteRuleConfig>,

    pub admin: AdminConfig,

    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// One named rate-limit policy.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct PolicyConfig {
    /// Window length in milliseconds.
    pub window_ms: i64,

    /// Maximum requests per window.
    pub max_requests: u32,
}

impl From<PolicyConfig> for Policy {
    fn from(c: PolicyConfig) -> Self {
        Policy::new(c.window_ms, c.max_requests)
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// How often the expired-counter sweep runs, in seconds.
    pub sweep_interval_secs: u64,

    /// Fallback policy for unnamed lookups.
    pub default_policy: PolicyConfig,

    /// Named policy registry. Omitted names fall back to the standard set.
    pub policies: HashMap<String, PolicyConfig>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let policies = RateLimiter::default_policies()
            .into_iter()
            .map(|(name, p)| {
                (
                    name,
                    PolicyConfig {
                        window_ms: p.window_ms,
                        max_requests: p.max_requests,
                    },
                )
            })
            .collect();
        Self {
            sweep_interval_secs: 60,
            default_policy: PolicyConfig {
                window_ms: 60_000,
                max_requests: 100,
            },
            policies,
        }
    }
}

impl RateLimitConfig {
    pub fn policy_registry(&self) -> HashMap<String, Policy> {
        self.policies
            .iter()
            .map(|(name, p)| (name.clone(), (*p).into()))
            .collect()
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Base URLs accepted in Origin/Referer for state-changing requests.
    pub allowed_origins: Vec<String>,

    /// Emit security events through tracing. Redaction runs regardless.
    pub log_security_events: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            log_security_events: true,
        }
    }
}

/// Session cookie and redirect configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the session cookie issued by the identity provider.
    pub cookie_name: String,

    /// Where unauthenticated requests to protected prefixes are sent.
    pub login_path: String,

    /// Neutral page for role mismatches.
    pub home_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "jb-session".to_string(),
            login_path: "/login".to_string(),
            home_path: "/".to_string(),
        }
    }
}

/// One configured route rule. Empty `roles` means any authenticated
/// principal; listed roles gate the prefix.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteRuleConfig {
    pub path_prefix: String,

    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

/// Admin surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin endpoints.
    pub enabled: bool,

    /// Bootstrap token for admin endpoints (Bearer), compared in constant
    /// time.
    pub bootstrap_token: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: placeholder; config validation rejects it when the
            // admin surface is enabled.
            bootstrap_token: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Build the route table from configuration, falling back to the
    /// standard job-board partition when no rules are configured.
    pub fn route_table(&self) -> RouteTable {
        if self.routes.is_empty() {
            let defaults = RouteTable::job_board_defaults();
            return RouteTable::new(
                defaults.rules().to_vec(),
                self.session.login_path.clone(),
                self.session.home_path.clone(),
            );
        }
        let rules = self
            .routes
            .iter()
            .map(|r| RouteRule {
                path_prefix: r.path_prefix.clone(),
                required_roles: r
                    .roles
                    .as_ref()
                    .map(|roles| roles.iter().map(|s| Role::parse(s)).collect()),
            })
            .collect();
        RouteTable::new(
            rules,
            self.session.login_path.clone(),
            self.session.home_path.clone(),
        )
    }
}
