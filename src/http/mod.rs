//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (add request ID)
//!     → middleware/ (metrics, optional delay)
//!     → live router (routing::router, swapped on reload)
//!     → response.rs (JSON errors and 404 fallback)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use server::{FakeApiServer, LiveRouter};
