//! Update-mask construction
//!
//! Maps declared-field paths (dotted paths into the serialized declared spec)
//! to the paths the management API expects in an `updateMask`. Versioned
//! Kafka settings live under a per-version message on the remote side, so
//! their remote paths carry a `{version}` placeholder that is filled with the
//! normalized cluster version (`2.8` becomes `2_8`).

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Placeholder substituted with the normalized Kafka version
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Cluster-level declared fields and their remote update paths
pub const CLUSTER_UPDATE_FIELDS: &[(&str, &str)] = &[
    ("name", "name"),
    ("description", "description"),
    ("labels", "labels"),
    ("security_group_ids", "security_group_ids"),
    ("config.zones", "config_spec.zone_id"),
    ("config.brokers_count", "config_spec.brokers_count"),
    (
        "config.kafka.resources.resource_preset_id",
        "config_spec.kafka.resources.resource_preset_id",
    ),
    (
        "config.kafka.resources.disk_type_id",
        "config_spec.kafka.resources.disk_type_id",
    ),
    (
        "config.kafka.resources.disk_size",
        "config_spec.kafka.resources.disk_size",
    ),
    (
        "config.kafka.kafka_config.compression_type",
        "config_spec.kafka.kafka_config_{version}.compression_type",
    ),
    (
        "config.kafka.kafka_config.log_flush_interval_messages",
        "config_spec.kafka.kafka_config_{version}.log_flush_interval_messages",
    ),
    (
        "config.kafka.kafka_config.log_flush_interval_ms",
        "config_spec.kafka.kafka_config_{version}.log_flush_interval_ms",
    ),
    (
        "config.kafka.kafka_config.log_flush_scheduler_interval_ms",
        "config_spec.kafka.kafka_config_{version}.log_flush_scheduler_interval_ms",
    ),
    (
        "config.kafka.kafka_config.log_retention_bytes",
        "config_spec.kafka.kafka_config_{version}.log_retention_bytes",
    ),
    (
        "config.kafka.kafka_config.log_retention_hours",
        "config_spec.kafka.kafka_config_{version}.log_retention_hours",
    ),
    (
        "config.kafka.kafka_config.log_retention_minutes",
        "config_spec.kafka.kafka_config_{version}.log_retention_minutes",
    ),
    (
        "config.kafka.kafka_config.log_retention_ms",
        "config_spec.kafka.kafka_config_{version}.log_retention_ms",
    ),
    (
        "config.kafka.kafka_config.log_segment_bytes",
        "config_spec.kafka.kafka_config_{version}.log_segment_bytes",
    ),
    (
        "config.kafka.kafka_config.log_preallocate",
        "config_spec.kafka.kafka_config_{version}.log_preallocate",
    ),
    (
        "config.zookeeper.resources.resource_preset_id",
        "config_spec.zookeeper.resources.resource_preset_id",
    ),
    (
        "config.zookeeper.resources.disk_type_id",
        "config_spec.zookeeper.resources.disk_type_id",
    ),
    (
        "config.zookeeper.resources.disk_size",
        "config_spec.zookeeper.resources.disk_size",
    ),
];

/// Topic declared fields (relative to one topic) and their remote update paths
pub const TOPIC_UPDATE_FIELDS: &[(&str, &str)] = &[
    ("name", "topic_spec.name"),
    ("partitions", "topic_spec.partitions"),
    ("replication_factor", "topic_spec.replication_factor"),
    (
        "topic_config.cleanup_policy",
        "topic_spec.topic_config_{version}.cleanup_policy",
    ),
    (
        "topic_config.compression_type",
        "topic_spec.topic_config_{version}.compression_type",
    ),
    (
        "topic_config.delete_retention_ms",
        "topic_spec.topic_config_{version}.delete_retention_ms",
    ),
    (
        "topic_config.file_delete_delay_ms",
        "topic_spec.topic_config_{version}.file_delete_delay_ms",
    ),
    (
        "topic_config.flush_messages",
        "topic_spec.topic_config_{version}.flush_messages",
    ),
    (
        "topic_config.flush_ms",
        "topic_spec.topic_config_{version}.flush_ms",
    ),
    (
        "topic_config.min_compaction_lag_ms",
        "topic_spec.topic_config_{version}.min_compaction_lag_ms",
    ),
    (
        "topic_config.retention_bytes",
        "topic_spec.topic_config_{version}.retention_bytes",
    ),
    (
        "topic_config.retention_ms",
        "topic_spec.topic_config_{version}.retention_ms",
    ),
    (
        "topic_config.max_message_bytes",
        "topic_spec.topic_config_{version}.max_message_bytes",
    ),
    (
        "topic_config.min_insync_replicas",
        "topic_spec.topic_config_{version}.min_insync_replicas",
    ),
    (
        "topic_config.segment_bytes",
        "topic_spec.topic_config_{version}.segment_bytes",
    ),
    (
        "topic_config.preallocate",
        "topic_spec.topic_config_{version}.preallocate",
    ),
];

/// User sub-paths that can be updated in place
pub const USER_UPDATE_FIELDS: &[(&str, &str)] =
    &[("password", "password"), ("permissions", "permissions")];

/// Address declared fields that can be updated in place
pub const ADDRESS_UPDATE_FIELDS: &[(&str, &str)] = &[
    ("labels", "labels"),
    ("name", "name"),
    ("description", "description"),
];

/// Normalize a Kafka version for use in remote message names (`2.8` -> `2_8`)
pub fn version_suffix(version: &str) -> String {
    version.replace('.', "_")
}

/// Substitute the version placeholder of a remote path, at most once.
/// Paths without a placeholder are returned unchanged.
pub fn resolve_path(path: &str, version: &str) -> String {
    if path.contains(VERSION_PLACEHOLDER) {
        path.replacen(VERSION_PLACEHOLDER, &version_suffix(version), 1)
    } else {
        path.to_string()
    }
}

/// Look up the remote path of a declared field in a table
pub fn remote_path(table: &[(&str, &str)], field: &str, version: &str) -> Option<String> {
    table
        .iter()
        .find(|(declared, _)| *declared == field)
        .map(|(_, remote)| resolve_path(remote, version))
}

/// Build an update mask from the declared fields that changed.
///
/// The mask keeps the table's order, whatever order `changed` is in. Fields
/// with no entry in the table are ignored.
pub fn build_mask(table: &[(&str, &str)], changed: &[&str], version: &str) -> FieldMask {
    let paths = table
        .iter()
        .filter(|(declared, _)| changed.contains(declared))
        .map(|(_, remote)| resolve_path(remote, version))
        .collect();
    FieldMask { paths }
}

/// List of remote field paths applied by an update call.
///
/// Serialized as a single comma-separated string, the JSON form of
/// `google.protobuf.FieldMask`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldMask {
    pub paths: Vec<String>,
}

impl FieldMask {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }
}

impl fmt::Display for FieldMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.paths.join(","))
    }
}

impl Serialize for FieldMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FieldMask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(FieldMask::new(
            raw.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_placeholder_is_substituted() {
        assert_eq!(
            resolve_path(
                "config_spec.kafka.kafka_config_{version}.compression_type",
                "2.8"
            ),
            "config_spec.kafka.kafka_config_2_8.compression_type"
        );
    }

    #[test]
    fn placeholder_substituted_only_once() {
        assert_eq!(resolve_path("a_{version}.b_{version}", "2.6"), "a_2_6.b_{version}");
    }

    #[test]
    fn paths_without_placeholder_are_unchanged() {
        assert_eq!(resolve_path("config_spec.zone_id", "2.8"), "config_spec.zone_id");
        assert_eq!(
            remote_path(CLUSTER_UPDATE_FIELDS, "labels", "2.8").as_deref(),
            Some("labels")
        );
    }

    #[test]
    fn unknown_field_has_no_remote_path() {
        assert_eq!(remote_path(CLUSTER_UPDATE_FIELDS, "network_id", "2.8"), None);
    }

    #[test]
    fn mask_follows_table_order() {
        let mask = build_mask(
            CLUSTER_UPDATE_FIELDS,
            &["config.kafka.kafka_config.log_retention_ms", "name"],
            "2.1",
        );
        assert_eq!(
            mask.paths,
            vec![
                "name".to_string(),
                "config_spec.kafka.kafka_config_2_1.log_retention_ms".to_string()
            ]
        );
    }

    #[test]
    fn topic_mask_uses_version() {
        let mask = build_mask(TOPIC_UPDATE_FIELDS, &["topic_config.retention_ms"], "2.8");
        assert!(mask.contains("topic_spec.topic_config_2_8.retention_ms"));
        assert_eq!(mask.len(), 1);
    }

    #[test]
    fn every_declared_field_is_unique() {
        for table in [
            CLUSTER_UPDATE_FIELDS,
            TOPIC_UPDATE_FIELDS,
            USER_UPDATE_FIELDS,
            ADDRESS_UPDATE_FIELDS,
        ] {
            let mut fields: Vec<_> = table.iter().map(|(f, _)| *f).collect();
            fields.sort_unstable();
            fields.dedup();
            assert_eq!(fields.len(), table.len());
        }
    }

    #[test]
    fn field_mask_serializes_as_joined_string() {
        let mask = FieldMask::new(["name", "labels"]);
        assert_eq!(serde_json::to_string(&mask).unwrap(), "\"name,labels\"");

        let parsed: FieldMask = serde_json::from_str("\"name, labels\"").unwrap();
        assert_eq!(parsed, mask);
    }
}
