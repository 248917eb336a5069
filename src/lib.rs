//! Fake REST API server library.
//!
//! Serves canned responses described in configuration files: fixed
//! bodies, file contents and in-memory CRUD resources backed by JSON
//! arrays.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::FakeApiConfig;
pub use http::FakeApiServer;
pub use lifecycle::Shutdown;
