//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup, and on each reload):
//!     ApiConfig { urls, resources }
//!     → definition.rs (defaults, leading slash, file check)
//!     → resource.rs (expand resources into CRUD endpoints)
//!     → table.rs (collect errors, sort, drop duplicates)
//!     → router.rs (register each endpoint with axum)
//!     → Freeze as immutable axum::Router
//!
//! Incoming Request:
//!     → axum path/method match
//!     → handler.rs (status, headers, body)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same config always registers in the same order
//! - All definition errors reported together, not one per run

pub mod definition;
pub mod handler;
pub mod resource;
pub mod router;
pub mod table;

pub use definition::{normalize, DefinitionSource, Endpoint, ValidationError};
pub use handler::{EndpointHandler, ResponseProducer, ResponseTemplate};
pub use resource::{expand, ResourceAction, ResourceHandler, ENDPOINTS_PER_RESOURCE};
pub use router::{AxumRegistrar, RegisteredRoute};
pub use table::{build, Register, RegisterError, RouteTable, RouteTableBuilder};
