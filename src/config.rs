//! Provider configuration
//!
//! Loaded from an optional YAML file, then overridden from the environment.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default management API endpoints
pub const DEFAULT_MDB_ENDPOINT: &str = "https://mdb.api.cloud.yandex.net";
pub const DEFAULT_VPC_ENDPOINT: &str = "https://vpc.api.cloud.yandex.net";
pub const DEFAULT_OPERATION_ENDPOINT: &str = "https://operation.api.cloud.yandex.net";

/// Base URLs of the management API services
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Endpoints {
    #[serde(default = "default_mdb_endpoint")]
    pub mdb: String,
    #[serde(default = "default_vpc_endpoint")]
    pub vpc: String,
    #[serde(default = "default_operation_endpoint")]
    pub operation: String,
}

fn default_mdb_endpoint() -> String {
    DEFAULT_MDB_ENDPOINT.to_string()
}

fn default_vpc_endpoint() -> String {
    DEFAULT_VPC_ENDPOINT.to_string()
}

fn default_operation_endpoint() -> String {
    DEFAULT_OPERATION_ENDPOINT.to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            mdb: default_mdb_endpoint(),
            vpc: default_vpc_endpoint(),
            operation: default_operation_endpoint(),
        }
    }
}

impl Endpoints {
    /// Point every service at the same base URL
    pub fn single(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            mdb: base.clone(),
            vpc: base.clone(),
            operation: base,
        }
    }
}

/// Deadlines of the four reconciliation phases of one resource kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Timeouts {
    #[serde(with = "duration_secs")]
    pub create: Duration,
    #[serde(with = "duration_secs")]
    pub read: Duration,
    #[serde(with = "duration_secs")]
    pub update: Duration,
    #[serde(with = "duration_secs")]
    pub delete: Duration,
}

impl Timeouts {
    /// Defaults for managed Kafka clusters
    pub fn kafka_cluster() -> Self {
        Self {
            create: Duration::from_secs(60 * 60),
            read: Duration::from_secs(5 * 60),
            update: Duration::from_secs(60 * 60),
            delete: Duration::from_secs(60 * 60),
        }
    }

    /// Defaults for VPC addresses
    pub fn vpc_address() -> Self {
        Self {
            create: Duration::from_secs(30),
            read: Duration::from_secs(5 * 60),
            update: Duration::from_secs(30),
            delete: Duration::from_secs(30),
        }
    }
}

/// Per-kind timeouts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeoutConfig {
    #[serde(default = "Timeouts::kafka_cluster")]
    pub kafka_cluster: Timeouts,
    #[serde(default = "Timeouts::vpc_address")]
    pub vpc_address: Timeouts,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            kafka_cluster: Timeouts::kafka_cluster(),
            vpc_address: Timeouts::vpc_address(),
        }
    }
}

/// Operation polling cadence
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PollConfig {
    /// Delay before the first status poll
    #[serde(with = "duration_millis", default = "default_poll_initial")]
    pub initial_interval: Duration,
    /// Upper bound for the doubling poll delay
    #[serde(with = "duration_millis", default = "default_poll_max")]
    pub max_interval: Duration,
}

fn default_poll_initial() -> Duration {
    Duration::from_millis(500)
}

fn default_poll_max() -> Duration {
    Duration::from_secs(10)
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval: default_poll_initial(),
            max_interval: default_poll_max(),
        }
    }
}

/// Provider configuration
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub endpoints: Endpoints,
    /// IAM token; normally supplied through `YC_TOKEN`
    #[serde(default, skip_serializing)]
    pub token: String,
    /// Folder used when a resource does not name one
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("endpoints", &self.endpoints)
            .field("token", &"<redacted>")
            .field("folder_id", &self.folder_id)
            .field("poll", &self.poll)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl ProviderConfig {
    /// Load from an optional YAML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a YAML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration text
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Override fields from environment lookups
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("YC_TOKEN") {
            self.token = token;
        }
        if let Some(folder_id) = lookup("YC_FOLDER_ID") {
            self.folder_id = Some(folder_id);
        }
        if let Some(endpoint) = lookup("YC_MDB_ENDPOINT") {
            self.endpoints.mdb = endpoint;
        }
        if let Some(endpoint) = lookup("YC_VPC_ENDPOINT") {
            self.endpoints.vpc = endpoint;
        }
        if let Some(endpoint) = lookup("YC_OPERATION_ENDPOINT") {
            self.endpoints.operation = endpoint;
        }
    }

    /// Ensure the configuration can talk to the API
    pub fn validate(&self) -> Result<()> {
        if self.token.is_empty() {
            return Err(Error::config(
                "No IAM token configured: set YC_TOKEN or `token` in the config file",
            ));
        }
        if self.poll.initial_interval.is_zero() {
            return Err(Error::config("poll.initial_interval must be greater than 0"));
        }
        if self.poll.max_interval < self.poll.initial_interval {
            return Err(Error::config(
                "poll.max_interval must not be shorter than poll.initial_interval",
            ));
        }
        Ok(())
    }

    /// Resolve the folder of a resource: its own, else the provider default
    pub fn resolve_folder_id(&self, declared: Option<&str>) -> Result<String> {
        declared
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .or_else(|| self.folder_id.clone())
            .ok_or_else(|| {
                Error::config("cannot determine folder_id: set it on the resource or the provider")
            })
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_resource_kinds() {
        let config = ProviderConfig::default();
        assert_eq!(config.timeouts.kafka_cluster.create, Duration::from_secs(3600));
        assert_eq!(config.timeouts.kafka_cluster.read, Duration::from_secs(300));
        assert_eq!(config.timeouts.vpc_address.delete, Duration::from_secs(30));
        assert_eq!(config.endpoints.mdb, DEFAULT_MDB_ENDPOINT);
    }

    #[test]
    fn yaml_overrides_selected_fields() {
        let config = ProviderConfig::from_yaml(
            r#"
folder_id: b1g-folder
endpoints:
  mdb: http://localhost:8080
poll:
  initial_interval: 100
timeouts:
  vpc_address:
    create: 60
    read: 60
    update: 60
    delete: 60
"#,
        )
        .unwrap();

        assert_eq!(config.folder_id.as_deref(), Some("b1g-folder"));
        assert_eq!(config.endpoints.mdb, "http://localhost:8080");
        assert_eq!(config.endpoints.vpc, DEFAULT_VPC_ENDPOINT);
        assert_eq!(config.poll.initial_interval, Duration::from_millis(100));
        assert_eq!(config.poll.max_interval, Duration::from_secs(10));
        assert_eq!(config.timeouts.vpc_address.create, Duration::from_secs(60));
        assert_eq!(config.timeouts.kafka_cluster, Timeouts::kafka_cluster());
    }

    #[test]
    fn environment_overrides_file() {
        let env: HashMap<&str, &str> =
            [("YC_TOKEN", "t0k3n"), ("YC_FOLDER_ID", "from-env")].into();
        let mut config = ProviderConfig {
            folder_id: Some("from-file".to_string()),
            ..Default::default()
        };
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.token, "t0k3n");
        assert_eq!(config.folder_id.as_deref(), Some("from-env"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_token_fails_validation() {
        let err = ProviderConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("YC_TOKEN"));
    }

    #[test]
    fn folder_resolution_prefers_resource() {
        let config = ProviderConfig {
            folder_id: Some("provider".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolve_folder_id(Some("own")).unwrap(), "own");
        assert_eq!(config.resolve_folder_id(Some("")).unwrap(), "provider");
        assert_eq!(config.resolve_folder_id(None).unwrap(), "provider");
        assert!(ProviderConfig::default().resolve_folder_id(None).is_err());
    }
}
