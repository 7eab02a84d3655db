//! Request security gateway for the job-board platform.
//!
//! Every mutating or privileged request passes through this layer before it
//! can touch data:
//!
//! ```text
//! Client request
//!     → http/request.rs    (request ID, client identifier)
//!     → routing/guard.rs   (session refresh, route-prefix role rules, redirects)
//!     → auth/guard.rs      (rate limit → origin → auth → role → handler)
//!     → validate/          (schema validation of bodies and query params)
//!     → business handler   (out of scope for this crate)
//!     → response           (rate-limit headers on every exit path)
//! ```
//!
//! The business CRUD surface (jobs, applications, companies) lives behind the
//! `IdentityStore` and `InputSchema` collaborator traits and is not part of
//! this crate.

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;

// Gatekeeping
pub mod auth;
pub mod security;
pub mod validate;

// Cross-cutting concerns
pub mod admin;
pub mod observability;

pub use config::schema::GatewayConfig;
pub use http::GatewayServer;
pub use http::GatewayState;
