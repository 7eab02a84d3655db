//! Edge routing subsystem: the role-partitioned route tree.
//!
//! # Data Flow
//! ```text
//! Inbound request (before any handler):
//!     → rules.rs (ordered prefix table: protected / admin / employer)
//!     → guard.rs (session refresh, redirect decision)
//! ```
//!
//! # Design Decisions
//! - First prefix match wins; overlapping prefixes must be ordered
//!   most-specific-first in configuration, not resolved at runtime
//! - Redirects carry the originally requested path so login can return there

pub mod guard;
pub mod rules;

pub use guard::session_route_guard;
pub use rules::{RouteRule, RouteTable};
