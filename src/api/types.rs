//! Wire messages of the management API
//!
//! JSON field names follow the REST mapping of the remote protobuf messages:
//! camelCase names, 64-bit integers as strings, versioned Kafka settings in
//! per-version fields such as `kafkaConfig_2_8`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::fieldmask::{version_suffix, FieldMask};

/// Kafka versions with a versioned settings block on the remote side
pub const SUPPORTED_KAFKA_VERSIONS: &[&str] = &["2.1", "2.6", "2.8"];

/// Accepts a 64-bit integer encoded either as a JSON number or a string
#[derive(Deserialize)]
#[serde(untagged)]
enum Int64Repr {
    Num(i64),
    Str(String),
}

impl Int64Repr {
    fn into_i64<E: serde::de::Error>(self) -> std::result::Result<i64, E> {
        match self {
            Int64Repr::Num(n) => Ok(n),
            Int64Repr::Str(s) => s.parse().map_err(E::custom),
        }
    }
}

pub(crate) mod int64 {
    use super::*;

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
        Int64Repr::deserialize(deserializer)?.into_i64()
    }
}

pub(crate) mod opt_int64 {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<i64>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<i64>, D::Error> {
        match Option::<Int64Repr>::deserialize(deserializer)? {
            Some(repr) => repr.into_i64().map(Some),
            None => Ok(None),
        }
    }
}

/// Defines a remote enum carried as its string name. Unknown names coming
/// back from the API decode to the unspecified variant; parsing declared
/// values only accepts the listed names.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal, unspecified = $unspec:literal,
        { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum $name {
            #[default]
            Unspecified,
            $($variant),+
        }

        impl $name {
            /// Accepted declared values
            pub const VALUES: &'static [&'static str] = &[$($wire),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $name::Unspecified => $unspec,
                    $($name::$variant => $wire),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(Error::validation(format!(
                        "Invalid {} '{}': must be one of: {}",
                        $label,
                        other,
                        Self::VALUES.join(", ")
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Ok(raw.parse().unwrap_or($name::Unspecified))
            }
        }
    };
}

wire_enum! {
    /// Cluster environment
    Environment, "environment", unspecified = "ENVIRONMENT_UNSPECIFIED",
    {
        Production => "PRODUCTION",
        Prestable => "PRESTABLE",
    }
}

wire_enum! {
    /// Message compression codec
    CompressionType, "compression type", unspecified = "COMPRESSION_TYPE_UNSPECIFIED",
    {
        Uncompressed => "COMPRESSION_TYPE_UNCOMPRESSED",
        Zstd => "COMPRESSION_TYPE_ZSTD",
        Lz4 => "COMPRESSION_TYPE_LZ4",
        Snappy => "COMPRESSION_TYPE_SNAPPY",
        Gzip => "COMPRESSION_TYPE_GZIP",
        Producer => "COMPRESSION_TYPE_PRODUCER",
    }
}

wire_enum! {
    /// Topic log cleanup policy
    CleanupPolicy, "cleanup policy", unspecified = "CLEANUP_POLICY_UNSPECIFIED",
    {
        Delete => "CLEANUP_POLICY_DELETE",
        Compact => "CLEANUP_POLICY_COMPACT",
        CompactAndDelete => "CLEANUP_POLICY_COMPACT_AND_DELETE",
    }
}

wire_enum! {
    /// Role granted to a user on a topic
    AccessRole, "access role", unspecified = "ACCESS_ROLE_UNSPECIFIED",
    {
        Producer => "ACCESS_ROLE_PRODUCER",
        Consumer => "ACCESS_ROLE_CONSUMER",
        Admin => "ACCESS_ROLE_ADMIN",
    }
}

/// Check a declared Kafka version against the versioned settings blocks
pub fn check_kafka_version(version: &str) -> Result<()> {
    if SUPPORTED_KAFKA_VERSIONS.contains(&version) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "Unsupported Kafka version '{}': must be one of: {}",
            version,
            SUPPORTED_KAFKA_VERSIONS.join(", ")
        )))
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Long-running operation handle
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

/// Error status of a failed operation
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Status {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<Value>,
}

/// Typed view of an operation's metadata payload
pub trait OperationMetadata: DeserializeOwned {
    /// Fully qualified message name carried in the `@type` field
    const TYPE_NAME: &'static str;
}

impl Operation {
    /// Decode the operation metadata as `T`.
    ///
    /// Fails when metadata is missing, carries a different `@type`, or does
    /// not deserialize into `T`.
    pub fn metadata_as<T: OperationMetadata>(&self) -> Result<T> {
        let metadata = self.metadata.as_ref().ok_or_else(|| {
            Error::metadata(format!("operation {} carries no metadata", self.id))
        })?;

        if let Some(type_url) = metadata.get("@type").and_then(Value::as_str) {
            if !type_url.ends_with(T::TYPE_NAME) {
                return Err(Error::metadata(format!(
                    "operation {} metadata is '{}', expected '{}'",
                    self.id,
                    type_url,
                    T::TYPE_NAME
                )));
            }
        }

        serde_json::from_value(metadata.clone()).map_err(|e| {
            Error::metadata(format!(
                "operation {} metadata is not {}: {}",
                self.id,
                T::TYPE_NAME,
                e
            ))
        })
    }
}

/// Metadata of a cluster creation operation
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClusterMetadata {
    pub cluster_id: String,
}

impl OperationMetadata for CreateClusterMetadata {
    const TYPE_NAME: &'static str = "yandex.cloud.mdb.kafka.v1.CreateClusterMetadata";
}

/// Metadata of an address creation operation
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddressMetadata {
    pub address_id: String,
}

impl OperationMetadata for CreateAddressMetadata {
    const TYPE_NAME: &'static str = "yandex.cloud.vpc.v1.CreateAddressMetadata";
}

// ============================================================================
// Kafka clusters
// ============================================================================

/// Compute and storage resources of a host group
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    #[serde(default)]
    pub resource_preset_id: String,
    #[serde(default, with = "int64")]
    pub disk_size: i64,
    #[serde(default)]
    pub disk_type_id: String,
}

/// Broker-wide Kafka settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KafkaConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_type: Option<CompressionType>,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub log_flush_interval_messages: Option<i64>,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub log_flush_interval_ms: Option<i64>,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub log_flush_scheduler_interval_ms: Option<i64>,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub log_retention_bytes: Option<i64>,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub log_retention_hours: Option<i64>,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub log_retention_minutes: Option<i64>,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub log_retention_ms: Option<i64>,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub log_segment_bytes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_preallocate: Option<bool>,
}

/// Per-version slots for broker settings; at most one is populated
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct VersionedKafkaConfig {
    #[serde(rename = "kafkaConfig_2_1", default, skip_serializing_if = "Option::is_none")]
    pub v2_1: Option<KafkaConfig>,
    #[serde(rename = "kafkaConfig_2_6", default, skip_serializing_if = "Option::is_none")]
    pub v2_6: Option<KafkaConfig>,
    #[serde(rename = "kafkaConfig_2_8", default, skip_serializing_if = "Option::is_none")]
    pub v2_8: Option<KafkaConfig>,
}

impl VersionedKafkaConfig {
    /// Settings block for the given cluster version
    pub fn get(&self, version: &str) -> Option<&KafkaConfig> {
        match version_suffix(version).as_str() {
            "2_1" => self.v2_1.as_ref(),
            "2_6" => self.v2_6.as_ref(),
            "2_8" => self.v2_8.as_ref(),
            _ => None,
        }
    }

    /// Build the slot set holding `config` under `version`
    pub fn for_version(version: &str, config: KafkaConfig) -> Result<Self> {
        check_kafka_version(version)?;
        let mut versioned = Self::default();
        match version_suffix(version).as_str() {
            "2_1" => versioned.v2_1 = Some(config),
            "2_6" => versioned.v2_6 = Some(config),
            _ => versioned.v2_8 = Some(config),
        }
        Ok(versioned)
    }
}

/// Kafka broker group configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KafkaServiceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Resources>,
    #[serde(flatten)]
    pub kafka_config: VersionedKafkaConfig,
}

/// ZooKeeper host group configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZookeeperConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Resources>,
}

/// Cluster configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSpec {
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kafka: Option<KafkaServiceConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zookeeper: Option<ZookeeperConfig>,
    #[serde(default)]
    pub zone_id: Vec<String>,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub brokers_count: Option<i64>,
    #[serde(default)]
    pub assign_public_ip: bool,
}

/// Managed Kafka cluster as returned by the API
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: String,
    #[serde(default)]
    pub folder_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigSpec>,
    #[serde(default)]
    pub network_id: String,
    #[serde(default)]
    pub health: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub security_group_ids: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClusterRequest {
    pub folder_id: String,
    pub name: String,
    pub description: String,
    pub labels: BTreeMap<String, String>,
    pub environment: Environment,
    pub config_spec: ConfigSpec,
    pub topic_specs: Vec<TopicSpec>,
    pub user_specs: Vec<UserSpec>,
    pub network_id: String,
    pub subnet_id: Vec<String>,
    pub security_group_ids: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClusterRequest {
    #[serde(skip)]
    pub cluster_id: String,
    pub update_mask: FieldMask,
    pub name: String,
    pub description: String,
    pub labels: BTreeMap<String, String>,
    pub config_spec: ConfigSpec,
    pub security_group_ids: Vec<String>,
}

// ============================================================================
// Topics
// ============================================================================

/// Per-topic settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopicConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup_policy: Option<CleanupPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_type: Option<CompressionType>,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub delete_retention_ms: Option<i64>,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub file_delete_delay_ms: Option<i64>,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub flush_messages: Option<i64>,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub flush_ms: Option<i64>,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub min_compaction_lag_ms: Option<i64>,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub retention_bytes: Option<i64>,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub retention_ms: Option<i64>,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub max_message_bytes: Option<i64>,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub min_insync_replicas: Option<i64>,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub segment_bytes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preallocate: Option<bool>,
}

/// Per-version slots for topic settings; at most one is populated
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct VersionedTopicConfig {
    #[serde(rename = "topicConfig_2_1", default, skip_serializing_if = "Option::is_none")]
    pub v2_1: Option<TopicConfig>,
    #[serde(rename = "topicConfig_2_6", default, skip_serializing_if = "Option::is_none")]
    pub v2_6: Option<TopicConfig>,
    #[serde(rename = "topicConfig_2_8", default, skip_serializing_if = "Option::is_none")]
    pub v2_8: Option<TopicConfig>,
}

impl VersionedTopicConfig {
    /// Settings block for the given cluster version
    pub fn get(&self, version: &str) -> Option<&TopicConfig> {
        match version_suffix(version).as_str() {
            "2_1" => self.v2_1.as_ref(),
            "2_6" => self.v2_6.as_ref(),
            "2_8" => self.v2_8.as_ref(),
            _ => None,
        }
    }

    /// Build the slot set holding `config` under `version`
    pub fn for_version(version: &str, config: TopicConfig) -> Result<Self> {
        check_kafka_version(version)?;
        let mut versioned = Self::default();
        match version_suffix(version).as_str() {
            "2_1" => versioned.v2_1 = Some(config),
            "2_6" => versioned.v2_6 = Some(config),
            _ => versioned.v2_8 = Some(config),
        }
        Ok(versioned)
    }
}

/// Topic definition sent on create and update
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopicSpec {
    pub name: String,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub partitions: Option<i64>,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub replication_factor: Option<i64>,
    #[serde(flatten)]
    pub topic_config: VersionedTopicConfig,
}

/// Topic as returned by the API
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub name: String,
    #[serde(default)]
    pub cluster_id: String,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub partitions: Option<i64>,
    #[serde(default, with = "opt_int64", skip_serializing_if = "Option::is_none")]
    pub replication_factor: Option<i64>,
    #[serde(flatten)]
    pub topic_config: VersionedTopicConfig,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTopicsResponse {
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub next_page_token: String,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTopicRequest {
    #[serde(skip)]
    pub cluster_id: String,
    pub topic_spec: TopicSpec,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTopicRequest {
    #[serde(skip)]
    pub cluster_id: String,
    #[serde(skip)]
    pub topic_name: String,
    pub update_mask: FieldMask,
    pub topic_spec: TopicSpec,
}

// ============================================================================
// Users
// ============================================================================

/// Role of a user on one topic
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub topic_name: String,
    pub role: AccessRole,
}

/// User definition sent on create
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSpec {
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

/// User as returned by the API; passwords are never returned
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub cluster_id: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersResponse {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub next_page_token: String,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(skip)]
    pub cluster_id: String,
    pub user_spec: UserSpec,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(skip)]
    pub cluster_id: String,
    #[serde(skip)]
    pub user_name: String,
    pub update_mask: FieldMask,
    pub password: String,
    pub permissions: Vec<Permission>,
}

// ============================================================================
// VPC addresses
// ============================================================================

/// Placement requirements of an external address
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequirements {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ddos_protection_provider: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub outgoing_smtp_capability: String,
}

/// Allocated external IPv4 address
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalIpv4Address {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub zone_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<AddressRequirements>,
}

/// Requested external IPv4 address
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalIpv4AddressSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub address: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub zone_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<AddressRequirements>,
}

/// VPC address as returned by the API
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: String,
    #[serde(default)]
    pub folder_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ipv4_address: Option<ExternalIpv4Address>,
    #[serde(default)]
    pub reserved: bool,
    #[serde(default)]
    pub used: bool,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddressRequest {
    pub folder_id: String,
    pub name: String,
    pub description: String,
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_ipv4_address_spec: Option<ExternalIpv4AddressSpec>,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddressRequest {
    #[serde(skip)]
    pub address_id: String,
    pub update_mask: FieldMask,
    pub name: String,
    pub description: String,
    pub labels: BTreeMap<String, String>,
}
