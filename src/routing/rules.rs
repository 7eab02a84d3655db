//! Static route-prefix → required-role rule table.

use url::form_urlencoded;

use crate::auth::identity::Role;

/// One rule: a path prefix and the roles allowed past it.
/// `required_roles: None` means any authenticated principal may pass.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub path_prefix: String,
    pub required_roles: Option<Vec<Role>>,
}

impl RouteRule {
    pub fn authenticated(prefix: impl Into<String>) -> Self {
        Self {
            path_prefix: prefix.into(),
            required_roles: None,
        }
    }

    pub fn role(prefix: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            path_prefix: prefix.into(),
            required_roles: Some(roles.into_iter().collect()),
        }
    }
}

/// Ordered rule table evaluated once per request at the edge.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
    pub login_path: String,
    pub home_path: String,
}

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>, login_path: String, home_path: String) -> Self {
        Self {
            rules,
            login_path,
            home_path,
        }
    }

    /// Default partition for the job board: admin and employer areas are
    /// role-gated, the rest of the protected tree needs any session.
    pub fn job_board_defaults() -> Self {
        Self::new(
            vec![
                RouteRule::role("/admin", [Role::Admin]),
                RouteRule::role("/employer", [Role::Employer, Role::Admin]),
                RouteRule::authenticated("/dashboard"),
                RouteRule::authenticated("/profile"),
                RouteRule::authenticated("/applications"),
            ],
            "/login".to_string(),
            "/".to_string(),
        )
    }

    /// First matching prefix wins.
    pub fn matched(&self, path: &str) -> Option<&RouteRule> {
        self.rules
            .iter()
            .find(|rule| path.starts_with(rule.path_prefix.as_str()))
    }

    /// Login target carrying the original path as a return target.
    pub fn login_redirect(&self, original_path: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(original_path.as_bytes()).collect();
        format!("{}?redirectTo={}", self.login_path, encoded)
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }
}
