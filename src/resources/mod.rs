//! Declared resource definitions
//!
//! These are the documents users write. Field names are snake_case and
//! enumerated values are the remote enum names, validated before any call.

mod kafka_cluster;
mod vpc_address;

pub use kafka_cluster::*;
pub use vpc_address::*;

use std::fmt;
use std::str::FromStr;

use schemars::schema_for;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Resource kinds handled by the provider
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    KafkaCluster,
    VpcAddress,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::KafkaCluster => "kafka_cluster",
            ResourceKind::VpcAddress => "vpc_address",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "kafka_cluster" => Ok(ResourceKind::KafkaCluster),
            "vpc_address" => Ok(ResourceKind::VpcAddress),
            other => Err(Error::validation(format!(
                "Unknown resource kind '{}': must be one of: kafka_cluster, vpc_address",
                other
            ))),
        }
    }
}

/// Generate JSON schema YAML documents for every declared resource
pub fn generate_schemas() -> Result<Vec<(ResourceKind, String)>> {
    Ok(vec![
        (
            ResourceKind::KafkaCluster,
            serde_yaml::to_string(&schema_for!(KafkaClusterSpec))?,
        ),
        (
            ResourceKind::VpcAddress,
            serde_yaml::to_string(&schema_for!(VpcAddressSpec))?,
        ),
    ])
}
