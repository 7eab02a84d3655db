//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-identifier fixed-window limits, named policies)
//!     → origin.rs     (Origin/Referer allow-list for state-changing verbs)
//!     → events.rs     (redaction-aware security event sink)
//!
//! Secret checks (admin bootstrap, scheduled-job tokens):
//!     → compare.rs    (constant-time comparison)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input
//! - Shared mutable state is confined to the counter store (store.rs)

pub mod compare;
pub mod events;
pub mod origin;
pub mod rate_limit;
pub mod store;

pub use compare::constant_time_eq;
pub use events::SecurityEventLog;
pub use origin::OriginValidator;
pub use rate_limit::{Policy, RateLimitResult, RateLimiter};
pub use store::{Clock, CounterEntry, SystemClock, WindowedCounterStore};
