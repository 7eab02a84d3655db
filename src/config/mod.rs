//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! gateway.toml → loader.rs (read + parse) → validation.rs (semantic checks)
//!             → schema.rs types consumed by the rest of the gateway
//! ```

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::GatewayConfig;
pub use validation::{validate_config, ValidationError};
