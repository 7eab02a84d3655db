//! Authentication and authorization subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → identity.rs (collaborator contract to the hosted identity store)
//!     → resolver.rs (session → principal, principal → role profile)
//!     → guard.rs    (ordered pipeline: rate limit → origin → auth → role)
//! ```
//!
//! # Design Decisions
//! - "No session" and "session present but role lookup failed" are distinct
//!   states; the latter fails closed for role-gated operations
//! - Roles form a closed enum plus an explicit unknown variant, because the
//!   provider can surface roles from three provenance points that disagree

pub mod guard;
pub mod identity;
pub mod resolver;

pub use guard::{AuthorizationGuard, GuardOptions};
pub use identity::{
    IdentityError, IdentityStore, InMemoryIdentityStore, Principal, Profile, ProfileRecord, Role,
    Session,
};
pub use resolver::{AuthContext, AuthResolver};
