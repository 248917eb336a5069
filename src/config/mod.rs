//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config files (TOML/YAML/JSON)
//!     → loader.rs (parse, deep-merge & deserialize)
//!     → validation.rs (semantic checks)
//!     → FakeApiConfig (validated, immutable)
//!     → routing::table builds the endpoint table from `api`
//!
//! On reload (--watch):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → new config handed to the server, which rebuilds its routes
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ApiConfig, EndpointDefinition, FakeApiConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    ResourceDefinition, StaticConfig, TimeoutConfig, TlsConfig,
};
