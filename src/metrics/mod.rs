//! Prometheus metrics for the resource provider
//!
//! Reconcilers record counts and durations here; the binary can expose them
//! over HTTP while long operations run.

mod prometheus;

pub use prometheus::*;
