//! Request middleware applied to every fake endpoint.

pub mod delay;
pub mod metrics;

pub use delay::delay_middleware;
pub use metrics::metrics_middleware;
