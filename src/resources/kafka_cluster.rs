//! Declared managed Kafka cluster resource

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Managed Kafka cluster specification
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct KafkaClusterSpec {
    /// Cluster name
    pub name: String,

    /// Network the cluster hosts live in (changing it replaces the cluster)
    pub network_id: String,

    /// Deployment environment (PRODUCTION, PRESTABLE)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Resource labels
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Subnets for the cluster hosts, one per zone
    #[serde(default)]
    pub subnet_ids: Vec<String>,

    /// Folder to create the cluster in; defaults to the provider folder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,

    /// Security groups attached to the cluster
    #[serde(default)]
    pub security_group_ids: BTreeSet<String>,

    /// Cluster configuration
    pub config: KafkaConfigSpec,

    /// Topics, keyed by name
    #[serde(default)]
    pub topics: Vec<KafkaTopicSpec>,

    /// Users, keyed by name
    #[serde(default)]
    pub users: Vec<KafkaUserSpec>,
}

fn default_environment() -> String {
    "PRODUCTION".to_string()
}

/// Cluster configuration block
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct KafkaConfigSpec {
    /// Kafka version (2.1, 2.6, 2.8)
    pub version: String,

    /// Availability zones for the brokers
    pub zones: Vec<String>,

    /// Brokers per zone
    #[serde(default = "default_brokers_count")]
    pub brokers_count: i64,

    /// Assign public IPs to the brokers (changing it replaces the cluster)
    #[serde(default)]
    pub assign_public_ip: bool,

    /// Broker group configuration
    pub kafka: KafkaServiceSpec,

    /// ZooKeeper group configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zookeeper: Option<ZookeeperSpec>,
}

fn default_brokers_count() -> i64 {
    1
}

/// Broker group block
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct KafkaServiceSpec {
    /// Broker host resources
    pub resources: ResourcesSpec,

    /// Broker-wide settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kafka_config: Option<KafkaSettingsSpec>,
}

/// ZooKeeper group block
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ZookeeperSpec {
    /// ZooKeeper host resources
    pub resources: ResourcesSpec,
}

/// Host resources
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ResourcesSpec {
    /// Host class, e.g. `s2.micro`
    pub resource_preset_id: String,
    /// Disk size in bytes
    pub disk_size: i64,
    /// Disk type, e.g. `network-ssd`
    pub disk_type_id: String,
}

/// Broker-wide Kafka settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct KafkaSettingsSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_flush_interval_messages: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_flush_interval_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_flush_scheduler_interval_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_retention_bytes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_retention_hours: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_retention_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_retention_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_segment_bytes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_preallocate: Option<bool>,
}

/// Kafka topic
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct KafkaTopicSpec {
    /// Topic name, unique within the cluster
    pub name: String,
    pub partitions: i64,
    pub replication_factor: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_config: Option<TopicSettingsSpec>,
}

/// Per-topic settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct TopicSettingsSpec {
    /// CLEANUP_POLICY_DELETE, CLEANUP_POLICY_COMPACT or CLEANUP_POLICY_COMPACT_AND_DELETE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_retention_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_delete_delay_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flush_messages: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flush_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_compaction_lag_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_bytes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_message_bytes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_insync_replicas: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_bytes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preallocate: Option<bool>,
}

/// Kafka user
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct KafkaUserSpec {
    /// User name, unique within the cluster
    pub name: String,
    /// Password; never returned by the API
    pub password: String,
    /// Topic permissions, compared as an ordered list
    #[serde(default)]
    pub permissions: Vec<KafkaPermissionSpec>,
}

/// Role of a user on a topic
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct KafkaPermissionSpec {
    pub topic_name: String,
    /// ACCESS_ROLE_PRODUCER, ACCESS_ROLE_CONSUMER or ACCESS_ROLE_ADMIN
    pub role: String,
}

/// Computed attributes of a Kafka cluster
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct KafkaClusterStatus {
    pub folder_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub health: String,
    pub status: String,
}
