//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound connection
//!     → server.rs  (Axum setup, middleware layering, state wiring)
//!     → request.rs (request ID, client identifier, session cookie)
//!     → [routing guard + authorization guard decide fate]
//!     → response.rs (error taxonomy → wire shapes, rate-limit headers)
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestId, RequestIdLayer, RequestMeta, X_REQUEST_ID};
pub use response::GatewayError;
pub use server::{GatewayServer, GatewayState};
