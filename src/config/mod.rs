//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! ClientConfig (caller-built or TOML file)
//!     → loader.rs (parse & deserialize, optional)
//!     → schema.rs with_defaults (fill gaps, derive response timeout)
//!     → validation.rs (semantic checks)
//!     → transport settings → connection pool
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → Client::apply_config swaps in a freshly built pool
//! ```
//!
//! # Design Decisions
//! - Zero means "unset"; defaults are applied in a fixed order
//! - Config is immutable once applied; every change rebuilds the pool
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::ClientConfig;
pub use validation::{validate_config, ValidationError};
