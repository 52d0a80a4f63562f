//! Yandex Cloud resource provider
//!
//! Declarative lifecycle management for managed Kafka clusters (with their
//! topics and users) and VPC addresses, driven through the cloud's
//! asynchronous management API.

pub mod adapters;
pub mod api;
pub mod apply;
pub mod changes;
pub mod config;
pub mod diff;
pub mod error;
pub mod fieldmask;
pub mod metrics;
pub mod operation;
pub mod reconcilers;
pub mod resources;
pub mod state;

pub use error::{Error, Result};
