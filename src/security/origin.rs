//! Origin/Referer validation for state-changing requests.
//!
//! # Responsibilities
//! - Prefix-match `Origin` and `Referer` against allow-listed base URLs
//! - Apply only to POST/PUT/PATCH/DELETE; reads bypass entirely
//!
//! # Design Decisions
//! - Requests carrying neither header are allowed: legitimate same-origin
//!   clients (and some non-browser ones) omit both
//! - Denials are the caller's signal to log a security event; this type
//!   stays a pure predicate

use axum::http::Method;

/// Allow-list of base URLs derived from configured application URLs.
#[derive(Debug, Clone)]
pub struct OriginValidator {
    allowed: Vec<String>,
}

impl OriginValidator {
    pub fn new(allowed_origins: impl IntoIterator<Item = String>) -> Self {
        let allowed = allowed_origins
            .into_iter()
            .map(|o| o.trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();
        Self { allowed }
    }

    /// True for verbs that mutate state and therefore need the check.
    pub fn applies_to(method: &Method) -> bool {
        matches!(
            *method,
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE
        )
    }

    /// Check the given header values. `None` for both means the check passes.
    pub fn check(&self, origin: Option<&str>, referer: Option<&str>) -> bool {
        if origin.is_none() && referer.is_none() {
            return true;
        }
        [origin, referer]
            .into_iter()
            .flatten()
            .any(|value| self.allowed.iter().any(|base| Self::matches(value, base)))
    }

    /// Prefix match that stops at the host boundary: the value must be the
    /// base itself or continue with a path, so `http://localhost:3000` never
    /// matches `http://localhost:30001`.
    fn matches(value: &str, base: &str) -> bool {
        match value.strip_prefix(base) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}
