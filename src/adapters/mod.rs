//! Adapters between declared resource specs and API messages

mod kafka_cluster;
mod vpc_address;

pub use kafka_cluster::*;
pub use vpc_address::*;
