//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (windows and caps > 0, addresses parse)
//! - Catch misconfigurations the runtime would otherwise fail open on
//!   (placeholder admin token, malformed origin allow-list)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function over the config; it runs before the
//!   config is accepted into the system

use crate::auth::identity::Role;
use crate::config::schema::GatewayConfig;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a valid socket address")]
    InvalidBindAddress(String),

    #[error("rate_limit policy '{0}' has a non-positive window")]
    NonPositiveWindow(String),

    #[error("rate_limit policy '{0}' allows zero requests")]
    ZeroMaxRequests(String),

    #[error("security.allowed_origins entry '{0}' is not a valid base URL")]
    InvalidOrigin(String),

    #[error("admin surface enabled with the placeholder bootstrap token")]
    PlaceholderAdminToken,

    #[error("admin.bootstrap_token is too short (need at least 16 characters)")]
    WeakAdminToken,

    #[error("route rule prefix '{0}' must start with '/'")]
    RelativeRulePrefix(String),

    #[error("route rule '{prefix}' names unknown role '{role}'")]
    UnknownRuleRole { prefix: String, role: String },
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config
        .listener
        .bind_address
        .parse::<std::net::SocketAddr>()
        .is_err()
    {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let mut check_policy = |name: &str, window_ms: i64, max_requests: u32| {
        if window_ms <= 0 {
            errors.push(ValidationError::NonPositiveWindow(name.to_string()));
        }
        if max_requests == 0 {
            errors.push(ValidationError::ZeroMaxRequests(name.to_string()));
        }
    };
    check_policy(
        "default",
        config.rate_limit.default_policy.window_ms,
        config.rate_limit.default_policy.max_requests,
    );
    for (name, policy) in &config.rate_limit.policies {
        check_policy(name, policy.window_ms, policy.max_requests);
    }

    for origin in &config.security.allowed_origins {
        if url::Url::parse(origin).is_err() {
            errors.push(ValidationError::InvalidOrigin(origin.clone()));
        }
    }

    if config.admin.enabled {
        if config.admin.bootstrap_token == "CHANGE_ME_IN_PRODUCTION" {
            errors.push(ValidationError::PlaceholderAdminToken);
        } else if config.admin.bootstrap_token.len() < 16 {
            errors.push(ValidationError::WeakAdminToken);
        }
    }

    for rule in &config.routes {
        if !rule.path_prefix.starts_with('/') {
            errors.push(ValidationError::RelativeRulePrefix(rule.path_prefix.clone()));
        }
        if let Some(roles) = &rule.roles {
            for role in roles {
                if matches!(Role::parse(role), Role::Unknown(_)) {
                    errors.push(ValidationError::UnknownRuleRole {
                        prefix: rule.path_prefix.clone(),
                        role: role.clone(),
                    });
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
