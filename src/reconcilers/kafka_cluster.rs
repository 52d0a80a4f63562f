//! Managed Kafka cluster reconciler
//!
//! Handles the business logic for clusters and their nested collections:
//! - Spec validation
//! - Creation through a long-running operation
//! - Refresh including paginated topics and users
//! - Phased updates (cluster parameters, topics, users)
//! - Deletion

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use crate::adapters::{
    build_create_cluster_request, build_update_cluster_request, expand_kafka_settings,
    expand_permissions, expand_topic, expand_topic_settings, expand_user, flatten_cluster,
};
use crate::api::{
    check_kafka_version, list_all_topics, list_all_users, AccessRole, CreateClusterMetadata,
    CreateTopicRequest, CreateUserRequest, Environment, UpdateTopicRequest, UpdateUserRequest,
};
use crate::changes::{changed_paths, changed_spec_fields};
use crate::diff::{diff_topics, diff_users, same_by_name};
use crate::error::{Error, Result, ResultExt};
use crate::fieldmask::{build_mask, CLUSTER_UPDATE_FIELDS, TOPIC_UPDATE_FIELDS, USER_UPDATE_FIELDS};
use crate::metrics;
use crate::operation::with_timeout;
use crate::resources::{KafkaClusterSpec, ResourceKind, ResourcesSpec};
use crate::state::{CommitLog, KafkaClusterState, ReadOutcome};

use super::{folder_moved, instrumented, validate_name, Context};

const KIND: ResourceKind = ResourceKind::KafkaCluster;

/// Declared fields whose change requires a new cluster
pub const FORCE_NEW_FIELDS: &[&str] = &[
    "network_id",
    "environment",
    "subnet_ids",
    "config.version",
    "config.assign_public_ip",
    "config.kafka.resources.disk_type_id",
    "config.zookeeper.resources.disk_type_id",
];

/// Validate the cluster spec
pub fn validate(spec: &KafkaClusterSpec) -> Result<()> {
    // Validate identity
    validate_name("cluster", &spec.name)?;
    if spec.network_id.is_empty() {
        return Err(Error::validation("network_id must be specified"));
    }
    spec.environment.parse::<Environment>()?;

    // Validate config
    check_kafka_version(&spec.config.version)?;
    if spec.config.zones.is_empty() {
        return Err(Error::validation("At least one zone must be specified"));
    }
    if spec.config.brokers_count < 1 {
        return Err(Error::validation(format!(
            "Invalid brokers_count {}: must be at least 1",
            spec.config.brokers_count
        )));
    }
    validate_resources("config.kafka.resources", &spec.config.kafka.resources)?;
    if let Some(zookeeper) = &spec.config.zookeeper {
        validate_resources("config.zookeeper.resources", &zookeeper.resources)?;
    }
    if let Some(settings) = &spec.config.kafka.kafka_config {
        expand_kafka_settings(settings)?;
    }

    // Validate topics
    let mut seen = HashSet::new();
    for topic in &spec.topics {
        validate_name("topic", &topic.name)?;
        if !seen.insert(topic.name.as_str()) {
            return Err(Error::validation(format!("Duplicate topic name '{}'", topic.name)));
        }
        if topic.partitions < 1 {
            return Err(Error::validation(format!(
                "Invalid partitions {} for topic '{}': must be at least 1",
                topic.partitions, topic.name
            )));
        }
        if topic.replication_factor < 1 {
            return Err(Error::validation(format!(
                "Invalid replication_factor {} for topic '{}': must be at least 1",
                topic.replication_factor, topic.name
            )));
        }
        if let Some(settings) = &topic.topic_config {
            expand_topic_settings(settings)?;
        }
    }

    // Validate users
    let mut seen = HashSet::new();
    for user in &spec.users {
        validate_name("user", &user.name)?;
        if !seen.insert(user.name.as_str()) {
            return Err(Error::validation(format!("Duplicate user name '{}'", user.name)));
        }
        if user.password.is_empty() {
            return Err(Error::validation(format!(
                "Password of user '{}' must not be empty",
                user.name
            )));
        }
        for permission in &user.permissions {
            if permission.topic_name.is_empty() {
                return Err(Error::validation(format!(
                    "Permission of user '{}' must name a topic",
                    user.name
                )));
            }
            permission.role.parse::<AccessRole>()?;
        }
    }

    Ok(())
}

fn validate_resources(path: &str, resources: &ResourcesSpec) -> Result<()> {
    if resources.resource_preset_id.is_empty() {
        return Err(Error::validation(format!(
            "{}.resource_preset_id must be specified",
            path
        )));
    }
    if resources.disk_size <= 0 {
        return Err(Error::validation(format!(
            "Invalid {}.disk_size {}: must be positive",
            path, resources.disk_size
        )));
    }
    if resources.disk_type_id.is_empty() {
        return Err(Error::validation(format!("{}.disk_type_id must be specified", path)));
    }
    Ok(())
}

/// Declared fields that differ from the applied state and cannot be
/// changed in place
pub fn requires_replacement(
    ctx: &Context,
    state: &KafkaClusterState,
    desired: &KafkaClusterSpec,
) -> Result<Vec<&'static str>> {
    let mut fields = changed_paths(FORCE_NEW_FIELDS, &state.spec, desired)?;
    if folder_moved(&ctx.config, desired.folder_id.as_deref(), &state.status.folder_id) {
        fields.push("folder_id");
    }
    Ok(fields)
}

/// Create the cluster and return its refreshed state.
///
/// `identity` receives the cluster ID as soon as the API assigns it, so the
/// caller can still track the cluster when waiting for it fails.
#[instrument(skip_all, fields(name = %spec.name))]
pub async fn create(
    ctx: &Context,
    spec: &KafkaClusterSpec,
    identity: &mut Option<String>,
) -> Result<KafkaClusterState> {
    instrumented(KIND, "create", async {
        validate(spec)?;
        let folder_id = ctx.config.resolve_folder_id(spec.folder_id.as_deref())?;
        let request = build_create_cluster_request(spec, &folder_id)?;
        let timeouts = ctx.config.timeouts.kafka_cluster;

        let cluster_id = with_timeout("create", timeouts.create, async {
            info!(
                folder_id = %folder_id,
                topics = request.topic_specs.len(),
                users = request.user_specs.len(),
                "Creating Kafka cluster"
            );
            let op = ctx
                .kafka
                .create_cluster(&request)
                .await
                .with_context(|| format!("creating Kafka cluster {}", spec.name))?;
            let metadata: CreateClusterMetadata = op
                .metadata_as()
                .with_context(|| format!("creating Kafka cluster {}", spec.name))?;
            *identity = Some(metadata.cluster_id.clone());
            info!(cluster_id = %metadata.cluster_id, "Kafka cluster creation started");

            ctx.operations
                .wait(op)
                .await
                .with_context(|| format!("creating Kafka cluster {}", metadata.cluster_id))?;
            Ok(metadata.cluster_id)
        })
        .await?;

        info!(cluster_id = %cluster_id, "Kafka cluster created");
        let state = KafkaClusterState::new(cluster_id.clone(), spec.clone());
        match fetch(ctx, &state).await? {
            ReadOutcome::Present(state) => Ok(state),
            ReadOutcome::Removed => Err(Error::NotFound(format!(
                "Kafka cluster {} disappeared after creation",
                cluster_id
            ))),
        }
    })
    .await
}

/// Refresh the cluster state from the API
#[instrument(skip_all, fields(cluster_id = %state.id))]
pub async fn read(ctx: &Context, state: &KafkaClusterState) -> Result<ReadOutcome<KafkaClusterState>> {
    instrumented(KIND, "read", fetch(ctx, state)).await
}

async fn fetch(ctx: &Context, state: &KafkaClusterState) -> Result<ReadOutcome<KafkaClusterState>> {
    let id = state.id.as_str();
    with_timeout("read", ctx.config.timeouts.kafka_cluster.read, async {
        let cluster = match ctx.kafka.get_cluster(id).await {
            Ok(cluster) => cluster,
            Err(e) if e.is_not_found() => {
                warn!(cluster_id = %id, "Kafka cluster not found, dropping it from state");
                metrics::RESOURCES_REMOVED
                    .with_label_values(&[KIND.as_str()])
                    .inc();
                return Ok(ReadOutcome::Removed);
            }
            Err(e) => return Err(e.context(format!("reading Kafka cluster {}", id))),
        };

        let topics = list_all_topics(ctx.kafka.as_ref(), id)
            .await
            .with_context(|| format!("listing topics of Kafka cluster {}", id))?;
        let users = list_all_users(ctx.kafka.as_ref(), id)
            .await
            .with_context(|| format!("listing users of Kafka cluster {}", id))?;

        let (spec, status) = flatten_cluster(&cluster, topics, users, &state.spec);
        debug!(
            cluster_id = %id,
            status = %status.status,
            health = %status.health,
            topics = spec.topics.len(),
            users = spec.users.len(),
            "Refreshed Kafka cluster"
        );

        Ok(ReadOutcome::Present(KafkaClusterState {
            id: id.to_string(),
            spec,
            status,
            partial: state.partial.clone(),
            tainted: state.tainted,
        }))
    })
    .await
}

/// Converge the cluster to `desired`.
///
/// Returns `false` when nothing had to change, in which case no remote call
/// was made. On failure `state` keeps the field groups already applied and
/// lists them in `state.partial`.
#[instrument(skip_all, fields(cluster_id = %state.id))]
pub async fn update(ctx: &Context, state: &mut KafkaClusterState, desired: &KafkaClusterSpec) -> Result<bool> {
    instrumented(KIND, "update", update_phases(ctx, state, desired)).await
}

async fn update_phases(
    ctx: &Context,
    state: &mut KafkaClusterState,
    desired: &KafkaClusterSpec,
) -> Result<bool> {
    validate(desired)?;

    let replaced = requires_replacement(ctx, state, desired)?;
    if !replaced.is_empty() {
        return Err(Error::validation(format!(
            "Kafka cluster {}: changing {} requires replacing the cluster",
            state.id,
            replaced.join(", ")
        )));
    }

    let changed = changed_spec_fields(CLUSTER_UPDATE_FIELDS, &state.spec, desired)?;
    let topics_changed = !same_by_name(&state.spec.topics, &desired.topics);
    let users_changed = !same_by_name(&state.spec.users, &desired.users);

    if changed.is_empty() && !topics_changed && !users_changed {
        debug!("No declared field changed");
        state.spec = desired.clone();
        return Ok(false);
    }

    let id = state.id.clone();
    with_timeout("update", ctx.config.timeouts.kafka_cluster.update, async {
        if !changed.is_empty() {
            update_params(ctx, state, desired, &changed).await?;
        }
        if topics_changed {
            update_topics(ctx, state, desired).await?;
        }
        if users_changed {
            update_users(ctx, state, desired).await?;
        }
        Ok(())
    })
    .await
    .with_context(|| format!("updating Kafka cluster {}", id))?;

    state.spec = desired.clone();
    state.partial.clear();
    match fetch(ctx, state).await? {
        ReadOutcome::Present(refreshed) => *state = refreshed,
        ReadOutcome::Removed => {
            return Err(Error::NotFound(format!(
                "Kafka cluster {} disappeared during update",
                id
            )))
        }
    }

    info!(cluster_id = %id, "Kafka cluster updated");
    Ok(true)
}

async fn update_params(
    ctx: &Context,
    state: &mut KafkaClusterState,
    desired: &KafkaClusterSpec,
    changed: &[&'static str],
) -> Result<()> {
    let mask = build_mask(CLUSTER_UPDATE_FIELDS, changed, &desired.config.version);
    let request = build_update_cluster_request(&state.id, desired, mask)?;

    let mut commits = CommitLog::new();
    for &field in changed {
        commits.defer(move |applied: &mut KafkaClusterState| applied.commit_field(field, desired));
    }

    info!(update_mask = %request.update_mask, "Updating Kafka cluster parameters");
    let op = ctx
        .kafka
        .update_cluster(&request)
        .await
        .context("updating cluster parameters")?;
    ctx.operations
        .wait(op)
        .await
        .context("updating cluster parameters")?;

    commits.commit(state)
}

async fn update_topics(ctx: &Context, state: &mut KafkaClusterState, desired: &KafkaClusterSpec) -> Result<()> {
    let version = desired.config.version.as_str();
    let mut remote = list_all_topics(ctx.kafka.as_ref(), &state.id)
        .await
        .context("listing topics")?;
    let changes = diff_topics(&mut remote, &state.spec.topics, &desired.topics, version)?;

    // Build every request before the first call
    let mut creates = Vec::with_capacity(changes.to_add.len());
    for topic in &changes.to_add {
        creates.push(CreateTopicRequest {
            cluster_id: state.id.clone(),
            topic_spec: expand_topic(topic, version)?,
        });
    }
    let mut updates = Vec::with_capacity(changes.to_modify.len());
    for modified in &changes.to_modify {
        updates.push(UpdateTopicRequest {
            cluster_id: state.id.clone(),
            topic_name: modified.spec.name.clone(),
            update_mask: build_mask(TOPIC_UPDATE_FIELDS, &modified.fields, version),
            topic_spec: expand_topic(modified.spec, version)?,
        });
    }

    info!(
        delete = changes.to_delete.len(),
        add = creates.len(),
        modify = updates.len(),
        "Reconciling topics"
    );

    for name in &changes.to_delete {
        info!(topic = %name, "Deleting topic");
        match ctx.kafka.delete_topic(&state.id, name).await {
            Ok(op) => {
                ctx.operations
                    .wait(op)
                    .await
                    .with_context(|| format!("deleting topic {}", name))?;
            }
            Err(e) if e.is_not_found() => debug!(topic = %name, "Topic already deleted"),
            Err(e) => return Err(e.context(format!("deleting topic {}", name))),
        }
    }

    for request in &creates {
        let name = &request.topic_spec.name;
        info!(topic = %name, "Creating topic");
        let op = ctx
            .kafka
            .create_topic(request)
            .await
            .with_context(|| format!("creating topic {}", name))?;
        ctx.operations
            .wait(op)
            .await
            .with_context(|| format!("creating topic {}", name))?;
    }

    for request in &updates {
        let name = &request.topic_name;
        info!(topic = %name, update_mask = %request.update_mask, "Updating topic");
        let op = ctx
            .kafka
            .update_topic(request)
            .await
            .with_context(|| format!("updating topic {}", name))?;
        ctx.operations
            .wait(op)
            .await
            .with_context(|| format!("updating topic {}", name))?;
    }

    state.commit_field("topics", desired)
}

async fn update_users(ctx: &Context, state: &mut KafkaClusterState, desired: &KafkaClusterSpec) -> Result<()> {
    let remote = list_all_users(ctx.kafka.as_ref(), &state.id)
        .await
        .context("listing users")?;
    let changes = diff_users(&remote, &state.spec.users, &desired.users);

    let mut creates = Vec::with_capacity(changes.to_add.len());
    for user in &changes.to_add {
        creates.push(CreateUserRequest {
            cluster_id: state.id.clone(),
            user_spec: expand_user(user)?,
        });
    }
    let mut updates = Vec::with_capacity(changes.to_update.len());
    for update in &changes.to_update {
        updates.push(UpdateUserRequest {
            cluster_id: state.id.clone(),
            user_name: update.spec.name.clone(),
            update_mask: build_mask(USER_UPDATE_FIELDS, &update.fields, &desired.config.version),
            password: update.spec.password.clone(),
            permissions: expand_permissions(&update.spec.permissions)?,
        });
    }

    info!(
        delete = changes.to_delete.len(),
        add = creates.len(),
        update = updates.len(),
        "Reconciling users"
    );

    for name in &changes.to_delete {
        info!(user = %name, "Deleting user");
        match ctx.kafka.delete_user(&state.id, name).await {
            Ok(op) => {
                ctx.operations
                    .wait(op)
                    .await
                    .with_context(|| format!("deleting user {}", name))?;
            }
            Err(e) if e.is_not_found() => debug!(user = %name, "User already deleted"),
            Err(e) => return Err(e.context(format!("deleting user {}", name))),
        }
    }

    for request in &creates {
        let name = &request.user_spec.name;
        info!(user = %name, "Creating user");
        let op = ctx
            .kafka
            .create_user(request)
            .await
            .with_context(|| format!("creating user {}", name))?;
        ctx.operations
            .wait(op)
            .await
            .with_context(|| format!("creating user {}", name))?;
    }

    for request in &updates {
        let name = &request.user_name;
        info!(user = %name, update_mask = %request.update_mask, "Updating user");
        let op = ctx
            .kafka
            .update_user(request)
            .await
            .with_context(|| format!("updating user {}", name))?;
        ctx.operations
            .wait(op)
            .await
            .with_context(|| format!("updating user {}", name))?;
    }

    state.commit_field("users", desired)
}

/// Delete the cluster. A cluster that is already gone counts as deleted.
#[instrument(skip_all, fields(cluster_id = %state.id))]
pub async fn delete(ctx: &Context, state: &KafkaClusterState) -> Result<()> {
    instrumented(KIND, "delete", async {
        let id = state.id.as_str();
        with_timeout("delete", ctx.config.timeouts.kafka_cluster.delete, async {
            info!(cluster_id = %id, "Deleting Kafka cluster");
            let op = match ctx.kafka.delete_cluster(id).await {
                Ok(op) => op,
                Err(e) if e.is_not_found() => {
                    info!(cluster_id = %id, "Kafka cluster already deleted");
                    return Ok(());
                }
                Err(e) => return Err(e.context(format!("deleting Kafka cluster {}", id))),
            };
            ctx.operations
                .wait(op)
                .await
                .with_context(|| format!("deleting Kafka cluster {}", id))?;
            info!(cluster_id = %id, "Kafka cluster deleted");
            Ok(())
        })
        .await
    })
    .await
}
