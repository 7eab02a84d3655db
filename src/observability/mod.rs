//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging through `tracing`; the request ID flows through all
//!   subsystems as a span/field
//! - Metrics are cheap counter increments; the Prometheus endpoint is
//!   optional and off by default

pub mod logging;
pub mod metrics;
