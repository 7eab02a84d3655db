//! Collaborator contract to the hosted identity/persistence provider.
//!
//! The gateway never talks to the provider's wire protocol directly; it sees
//! only this narrow trait. Production wires an adapter over the provider's
//! client library; tests and local development use [`InMemoryIdentityStore`].

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Known roles plus an explicit variant for anything else the provider
/// hands back. Free-form strings never compare equal to a known role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Employer,
    JobSeeker,
    Unknown(String),
}

impl Role {
    pub fn parse(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            "employer" => Role::Employer,
            "jobseeker" => Role::JobSeeker,
            other => Role::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Employer => "employer",
            Role::JobSeeker => "jobseeker",
            Role::Unknown(s) => s,
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        Role::parse(&s)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Role::Unknown(s) = self {
            if s.is_empty() {
                return write!(f, "unknown");
            }
        }
        write!(f, "{}", self.as_str())
    }
}

/// Authenticated identity attached to a valid session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub email: String,
}

/// A resolved session. `refreshed_cookie` carries a rotated session cookie
/// the edge guard must write onto the outgoing response.
#[derive(Debug, Clone)]
pub struct Session {
    pub principal: Principal,
    pub refreshed_cookie: Option<String>,
}

/// Raw role material as stored by the provider. Roles can live in the
/// profile table, the auth provider's app metadata, or user metadata, and
/// the three may disagree.
#[derive(Debug, Clone, Default)]
pub struct ProfileRecord {
    pub id: String,
    pub email: String,
    pub profile_role: Option<String>,
    pub app_metadata_role: Option<String>,
    pub user_metadata_role: Option<String>,
}

/// Role profile after provenance resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub role: Role,
}

/// Resolve the effective role from its three provenance points.
/// Precedence: profile table, then app metadata, then user metadata.
pub fn resolve_role(record: &ProfileRecord) -> Role {
    record
        .profile_role
        .as_deref()
        .or(record.app_metadata_role.as_deref())
        .or(record.user_metadata_role.as_deref())
        .map(Role::parse)
        .unwrap_or(Role::Unknown(String::new()))
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity store unavailable: {0}")]
    Unavailable(String),
    #[error("profile lookup failed: {0}")]
    Lookup(String),
}

/// Narrow interface to the hosted identity store.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Resolve the session behind a cookie token. `Ok(None)` means no
    /// session; that is not an error condition.
    async fn current_session(&self, token: &str) -> Result<Option<Session>, IdentityError>;

    /// Fetch the role profile for a principal. `Ok(None)` means the
    /// principal has no profile row.
    async fn fetch_profile(&self, principal_id: &str) -> Result<Option<ProfileRecord>, IdentityError>;
}

/// In-memory identity store for tests and local development.
#[derive(Default)]
pub struct InMemoryIdentityStore {
    sessions: Mutex<HashMap<String, Session>>,
    profiles: Mutex<HashMap<String, ProfileRecord>>,
    fail_profile_lookups: AtomicBool,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_session(&self, token: &str, session: Session) {
        self.sessions
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(token.to_string(), session);
    }

    pub fn insert_profile(&self, record: ProfileRecord) {
        self.profiles
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(record.id.clone(), record);
    }

    /// Make subsequent profile lookups fail, simulating a backing-store
    /// outage independent of session validity.
    pub fn fail_profile_lookups(&self, fail: bool) {
        self.fail_profile_lookups.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn current_session(&self, token: &str) -> Result<Option<Session>, IdentityError> {
        Ok(self
            .sessions
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(token)
            .cloned())
    }

    async fn fetch_profile(&self, principal_id: &str) -> Result<Option<ProfileRecord>, IdentityError> {
        if self.fail_profile_lookups.load(Ordering::SeqCst) {
            return Err(IdentityError::Lookup("injected failure".to_string()));
        }
        Ok(self
            .profiles
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(principal_id)
            .cloned())
    }
}
