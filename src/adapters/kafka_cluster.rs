//! Kafka cluster adapter
//!
//! Expands the declared cluster spec into API requests and flattens API
//! responses back into the declared shape.

use std::str::FromStr;

use crate::api::{
    AccessRole, CleanupPolicy, Cluster, CompressionType, ConfigSpec, CreateClusterRequest,
    Environment, KafkaConfig, KafkaServiceConfig, Permission, Resources, Topic, TopicConfig,
    TopicSpec, UpdateClusterRequest, User, UserSpec, VersionedKafkaConfig, VersionedTopicConfig,
    ZookeeperConfig,
};
use crate::diff::align_by_name;
use crate::error::{Error, Result};
use crate::fieldmask::FieldMask;
use crate::resources::{
    KafkaClusterSpec, KafkaClusterStatus, KafkaConfigSpec, KafkaPermissionSpec, KafkaServiceSpec,
    KafkaSettingsSpec, KafkaTopicSpec, KafkaUserSpec, ResourcesSpec, TopicSettingsSpec,
    ZookeeperSpec,
};

fn parse_optional<T>(value: &Option<String>) -> Result<Option<T>>
where
    T: FromStr<Err = Error>,
{
    value.as_deref().map(str::parse::<T>).transpose()
}

fn expand_resources(resources: &ResourcesSpec) -> Resources {
    Resources {
        resource_preset_id: resources.resource_preset_id.clone(),
        disk_size: resources.disk_size,
        disk_type_id: resources.disk_type_id.clone(),
    }
}

fn flatten_resources(resources: &Resources) -> ResourcesSpec {
    ResourcesSpec {
        resource_preset_id: resources.resource_preset_id.clone(),
        disk_size: resources.disk_size,
        disk_type_id: resources.disk_type_id.clone(),
    }
}

/// Broker settings in wire form; unknown compression types are rejected
pub fn expand_kafka_settings(settings: &KafkaSettingsSpec) -> Result<KafkaConfig> {
    Ok(KafkaConfig {
        compression_type: parse_optional::<CompressionType>(&settings.compression_type)?,
        log_flush_interval_messages: settings.log_flush_interval_messages,
        log_flush_interval_ms: settings.log_flush_interval_ms,
        log_flush_scheduler_interval_ms: settings.log_flush_scheduler_interval_ms,
        log_retention_bytes: settings.log_retention_bytes,
        log_retention_hours: settings.log_retention_hours,
        log_retention_minutes: settings.log_retention_minutes,
        log_retention_ms: settings.log_retention_ms,
        log_segment_bytes: settings.log_segment_bytes,
        log_preallocate: settings.log_preallocate,
    })
}

fn flatten_kafka_settings(config: &KafkaConfig) -> Option<KafkaSettingsSpec> {
    let settings = KafkaSettingsSpec {
        compression_type: config
            .compression_type
            .filter(|c| *c != CompressionType::Unspecified)
            .map(|c| c.as_str().to_string()),
        log_flush_interval_messages: config.log_flush_interval_messages,
        log_flush_interval_ms: config.log_flush_interval_ms,
        log_flush_scheduler_interval_ms: config.log_flush_scheduler_interval_ms,
        log_retention_bytes: config.log_retention_bytes,
        log_retention_hours: config.log_retention_hours,
        log_retention_minutes: config.log_retention_minutes,
        log_retention_ms: config.log_retention_ms,
        log_segment_bytes: config.log_segment_bytes,
        log_preallocate: config.log_preallocate,
    };
    (settings != KafkaSettingsSpec::default()).then_some(settings)
}

/// Cluster configuration in wire form, settings placed in the slot of the
/// declared version
pub fn expand_config(config: &KafkaConfigSpec) -> Result<ConfigSpec> {
    let kafka_config = match &config.kafka.kafka_config {
        Some(settings) => {
            VersionedKafkaConfig::for_version(&config.version, expand_kafka_settings(settings)?)?
        }
        None => VersionedKafkaConfig::default(),
    };

    Ok(ConfigSpec {
        version: config.version.clone(),
        kafka: Some(KafkaServiceConfig {
            resources: Some(expand_resources(&config.kafka.resources)),
            kafka_config,
        }),
        zookeeper: config.zookeeper.as_ref().map(|zk| ZookeeperConfig {
            resources: Some(expand_resources(&zk.resources)),
        }),
        zone_id: config.zones.clone(),
        brokers_count: Some(config.brokers_count),
        assign_public_ip: config.assign_public_ip,
    })
}

/// Declared view of a remote configuration. ZooKeeper resources are only
/// kept when the prior declaration had a ZooKeeper block.
pub fn flatten_config(config: &ConfigSpec, prior: &KafkaConfigSpec) -> KafkaConfigSpec {
    let kafka = config.kafka.clone().unwrap_or_default();
    let resources = kafka
        .resources
        .as_ref()
        .map(flatten_resources)
        .unwrap_or_else(|| prior.kafka.resources.clone());

    let zookeeper = match (&prior.zookeeper, &config.zookeeper) {
        (Some(_), Some(zk)) => zk.resources.as_ref().map(|r| ZookeeperSpec {
            resources: flatten_resources(r),
        }),
        _ => None,
    };

    KafkaConfigSpec {
        version: config.version.clone(),
        zones: config.zone_id.clone(),
        brokers_count: config.brokers_count.unwrap_or(prior.brokers_count),
        assign_public_ip: config.assign_public_ip,
        kafka: KafkaServiceSpec {
            resources,
            kafka_config: kafka
                .kafka_config
                .get(&config.version)
                .and_then(flatten_kafka_settings),
        },
        zookeeper,
    }
}

/// Topic settings in wire form; unknown enum values are rejected
pub fn expand_topic_settings(settings: &TopicSettingsSpec) -> Result<TopicConfig> {
    Ok(TopicConfig {
        cleanup_policy: parse_optional::<CleanupPolicy>(&settings.cleanup_policy)?,
        compression_type: parse_optional::<CompressionType>(&settings.compression_type)?,
        delete_retention_ms: settings.delete_retention_ms,
        file_delete_delay_ms: settings.file_delete_delay_ms,
        flush_messages: settings.flush_messages,
        flush_ms: settings.flush_ms,
        min_compaction_lag_ms: settings.min_compaction_lag_ms,
        retention_bytes: settings.retention_bytes,
        retention_ms: settings.retention_ms,
        max_message_bytes: settings.max_message_bytes,
        min_insync_replicas: settings.min_insync_replicas,
        segment_bytes: settings.segment_bytes,
        preallocate: settings.preallocate,
    })
}

fn flatten_topic_settings(config: &TopicConfig) -> Option<TopicSettingsSpec> {
    let settings = TopicSettingsSpec {
        cleanup_policy: config
            .cleanup_policy
            .filter(|c| *c != CleanupPolicy::Unspecified)
            .map(|c| c.as_str().to_string()),
        compression_type: config
            .compression_type
            .filter(|c| *c != CompressionType::Unspecified)
            .map(|c| c.as_str().to_string()),
        delete_retention_ms: config.delete_retention_ms,
        file_delete_delay_ms: config.file_delete_delay_ms,
        flush_messages: config.flush_messages,
        flush_ms: config.flush_ms,
        min_compaction_lag_ms: config.min_compaction_lag_ms,
        retention_bytes: config.retention_bytes,
        retention_ms: config.retention_ms,
        max_message_bytes: config.max_message_bytes,
        min_insync_replicas: config.min_insync_replicas,
        segment_bytes: config.segment_bytes,
        preallocate: config.preallocate,
    };
    (settings != TopicSettingsSpec::default()).then_some(settings)
}

/// Topic in wire form for a cluster of the given version
pub fn expand_topic(topic: &KafkaTopicSpec, version: &str) -> Result<TopicSpec> {
    let topic_config = match &topic.topic_config {
        Some(settings) => {
            VersionedTopicConfig::for_version(version, expand_topic_settings(settings)?)?
        }
        None => VersionedTopicConfig::default(),
    };

    Ok(TopicSpec {
        name: topic.name.clone(),
        partitions: Some(topic.partitions),
        replication_factor: Some(topic.replication_factor),
        topic_config,
    })
}

/// Declared view of a remote topic
pub fn flatten_topic(topic: &Topic, version: &str) -> KafkaTopicSpec {
    KafkaTopicSpec {
        name: topic.name.clone(),
        partitions: topic.partitions.unwrap_or_default(),
        replication_factor: topic.replication_factor.unwrap_or_default(),
        topic_config: topic
            .topic_config
            .get(version)
            .and_then(flatten_topic_settings),
    }
}

pub fn expand_permissions(permissions: &[KafkaPermissionSpec]) -> Result<Vec<Permission>> {
    permissions
        .iter()
        .map(|p| {
            Ok(Permission {
                topic_name: p.topic_name.clone(),
                role: p.role.parse::<AccessRole>()?,
            })
        })
        .collect()
}

fn flatten_permissions(permissions: &[Permission]) -> Vec<KafkaPermissionSpec> {
    permissions
        .iter()
        .map(|p| KafkaPermissionSpec {
            topic_name: p.topic_name.clone(),
            role: p.role.as_str().to_string(),
        })
        .collect()
}

pub fn expand_user(user: &KafkaUserSpec) -> Result<UserSpec> {
    Ok(UserSpec {
        name: user.name.clone(),
        password: user.password.clone(),
        permissions: expand_permissions(&user.permissions)?,
    })
}

/// Declared view of a remote user; the password comes from the prior
/// declaration since the API never returns it
pub fn flatten_user(user: &User, prior: &[KafkaUserSpec]) -> KafkaUserSpec {
    let password = prior
        .iter()
        .find(|p| p.name == user.name)
        .map(|p| p.password.clone())
        .unwrap_or_default();

    KafkaUserSpec {
        name: user.name.clone(),
        password,
        permissions: flatten_permissions(&user.permissions),
    }
}

/// Build the create request for a cluster in `folder_id`
pub fn build_create_cluster_request(spec: &KafkaClusterSpec, folder_id: &str) -> Result<CreateClusterRequest> {
    let version = spec.config.version.as_str();

    Ok(CreateClusterRequest {
        folder_id: folder_id.to_string(),
        name: spec.name.clone(),
        description: spec.description.clone(),
        labels: spec.labels.clone(),
        environment: spec.environment.parse::<Environment>()?,
        config_spec: expand_config(&spec.config)?,
        topic_specs: spec
            .topics
            .iter()
            .map(|t| expand_topic(t, version))
            .collect::<Result<_>>()?,
        user_specs: spec.users.iter().map(expand_user).collect::<Result<_>>()?,
        network_id: spec.network_id.clone(),
        subnet_id: spec.subnet_ids.clone(),
        security_group_ids: spec.security_group_ids.iter().cloned().collect(),
    })
}

/// Build the cluster-level update request carrying `mask`
pub fn build_update_cluster_request(
    cluster_id: &str,
    spec: &KafkaClusterSpec,
    mask: FieldMask,
) -> Result<UpdateClusterRequest> {
    Ok(UpdateClusterRequest {
        cluster_id: cluster_id.to_string(),
        update_mask: mask,
        name: spec.name.clone(),
        description: spec.description.clone(),
        labels: spec.labels.clone(),
        config_spec: expand_config(&spec.config)?,
        security_group_ids: spec.security_group_ids.iter().cloned().collect(),
    })
}

/// Declared spec and computed status of a remote cluster.
///
/// Fields the API does not return (subnets, passwords, the declared folder)
/// are carried over from `prior`. Topics and users are ordered like the
/// prior declaration.
pub fn flatten_cluster(
    cluster: &Cluster,
    mut topics: Vec<Topic>,
    mut users: Vec<User>,
    prior: &KafkaClusterSpec,
) -> (KafkaClusterSpec, KafkaClusterStatus) {
    let config = match &cluster.config {
        Some(config) => flatten_config(config, &prior.config),
        None => prior.config.clone(),
    };

    align_by_name(&mut topics, &prior.topics);
    align_by_name(&mut users, &prior.users);

    let environment = match cluster.environment {
        Environment::Unspecified => prior.environment.clone(),
        env => env.as_str().to_string(),
    };

    let spec = KafkaClusterSpec {
        name: cluster.name.clone(),
        network_id: cluster.network_id.clone(),
        environment,
        description: cluster.description.clone(),
        labels: cluster.labels.clone(),
        subnet_ids: prior.subnet_ids.clone(),
        folder_id: prior.folder_id.clone(),
        security_group_ids: cluster.security_group_ids.iter().cloned().collect(),
        topics: topics
            .iter()
            .map(|t| flatten_topic(t, &config.version))
            .collect(),
        users: users.iter().map(|u| flatten_user(u, &prior.users)).collect(),
        config,
    };

    let status = KafkaClusterStatus {
        folder_id: cluster.folder_id.clone(),
        created_at: cluster.created_at,
        health: cluster.health.clone(),
        status: cluster.status.clone(),
    };

    (spec, status)
}
