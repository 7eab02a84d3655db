//! Session and role resolution.
//!
//! # Responsibilities
//! - Turn a session cookie into a [`Principal`]
//! - Fetch the principal's role profile, resolving role provenance
//!
//! # Design Decisions
//! - Absent session → `{principal: None, profile: None}`, no error
//! - Profile lookup failure → principal set, profile `None`; callers must
//!   treat "authenticated but role unknown" distinctly from "not
//!   authenticated" and fail closed for role-gated operations

use std::sync::Arc;

use crate::auth::identity::{resolve_role, IdentityStore, Principal, Profile, Session};

/// What the resolver learned about the caller. Produced once per request.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub principal: Option<Principal>,
    pub profile: Option<Profile>,
    /// Rotated session cookie to write onto the response, when present.
    pub refreshed_cookie: Option<String>,
}

impl AuthContext {
    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }
}

/// Resolves the authenticated principal and stored role for a request.
#[derive(Clone)]
pub struct AuthResolver {
    identity: Arc<dyn IdentityStore>,
}

impl AuthResolver {
    pub fn new(identity: Arc<dyn IdentityStore>) -> Self {
        Self { identity }
    }

    /// Resolve the caller behind `session_token`.
    pub async fn resolve(&self, session_token: Option<&str>) -> AuthContext {
        let Some(token) = session_token else {
            return AuthContext::default();
        };

        let session: Session = match self.identity.current_session(token).await {
            Ok(Some(session)) => session,
            Ok(None) => return AuthContext::default(),
            Err(e) => {
                // Session lookup failure is indistinguishable from "no
                // session" to the caller; authorization fails closed.
                tracing::warn!(error = %e, "Session lookup failed");
                return AuthContext::default();
            }
        };

        let principal = session.principal.clone();
        let profile = match self.identity.fetch_profile(&principal.id).await {
            Ok(Some(record)) => Some(Profile {
                id: record.id.clone(),
                email: record.email.clone(),
                role: resolve_role(&record),
            }),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(principal = %principal.id, error = %e, "Role lookup failed");
                None
            }
        };

        AuthContext {
            principal: Some(principal),
            profile,
            refreshed_cookie: session.refreshed_cookie,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::{InMemoryIdentityStore, ProfileRecord, Role};

    fn seeded_store() -> Arc<InMemoryIdentityStore> {
        let store = InMemoryIdentityStore::new();
        store.insert_session(
            "tok-1",
            Session {
                principal: Principal {
                    id: "u1".into(),
                    email: "u1@example.com".into(),
                },
                refreshed_cookie: None,
            },
        );
        store.insert_profile(ProfileRecord {
            id: "u1".into(),
            email: "u1@example.com".into(),
            profile_role: Some("employer".into()),
            ..ProfileRecord::default()
        });
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_no_token_resolves_empty() {
        let resolver = AuthResolver::new(seeded_store());
        let ctx = resolver.resolve(None).await;
        assert!(ctx.principal.is_none());
        assert!(ctx.profile.is_none());
    }

    #[tokio::test]
    async fn test_valid_session_resolves_principal_and_role() {
        let resolver = AuthResolver::new(seeded_store());
        let ctx = resolver.resolve(Some("tok-1")).await;
        assert_eq!(ctx.principal.unwrap().id, "u1");
        assert_eq!(ctx.profile.unwrap().role, Role::Employer);
    }

    #[tokio::test]
    async fn test_profile_failure_keeps_principal_drops_profile() {
        let store = seeded_store();
        store.fail_profile_lookups(true);
        let resolver = AuthResolver::new(store);
        let ctx = resolver.resolve(Some("tok-1")).await;
        assert!(ctx.principal.is_some(), "authenticated despite role outage");
        assert!(ctx.profile.is_none(), "role must stay unresolved");
    }

    #[tokio::test]
    async fn test_missing_profile_row_resolves_none() {
        let store = InMemoryIdentityStore::new();
        store.insert_session(
            "tok-2",
            Session {
                principal: Principal {
                    id: "u2".into(),
                    email: "u2@example.com".into(),
                },
                refreshed_cookie: None,
            },
        );
        let resolver = AuthResolver::new(Arc::new(store));
        let ctx = resolver.resolve(Some("tok-2")).await;
        assert!(ctx.principal.is_some());
        assert!(ctx.profile.is_none());
    }
}
