//! Apply driver
//!
//! Reconciles a manifest of declared resources against the state file:
//! missing resources are created, known ones are refreshed and updated,
//! force-new changes and tainted resources are replaced, and resources no
//! longer declared are deleted. The state file is saved after every change
//! so an interrupted run loses nothing that was applied.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Error, Result, ResultExt};
use crate::metrics;
use crate::reconcilers::{kafka_cluster, vpc_address, Context};
use crate::resources::{
    KafkaClusterSpec, KafkaClusterStatus, ResourceKind, VpcAddressSpec, VpcAddressStatus,
};
use crate::state::{ReadOutcome, ResourceState, StateStore, StoredResource};

#[derive(Deserialize)]
struct RawManifest {
    #[serde(default)]
    resources: Vec<RawResource>,
}

#[derive(Deserialize)]
struct RawResource {
    kind: ResourceKind,
    name: String,
    #[serde(default)]
    spec: serde_yaml::Value,
}

/// Declared spec of any supported kind
#[derive(Clone, Debug, PartialEq)]
pub enum DesiredSpec {
    KafkaCluster(KafkaClusterSpec),
    VpcAddress(VpcAddressSpec),
}

/// One declared resource
#[derive(Clone, Debug, PartialEq)]
pub struct DeclaredResource {
    pub name: String,
    pub spec: DesiredSpec,
}

impl DeclaredResource {
    pub fn kind(&self) -> ResourceKind {
        match self.spec {
            DesiredSpec::KafkaCluster(_) => ResourceKind::KafkaCluster,
            DesiredSpec::VpcAddress(_) => ResourceKind::VpcAddress,
        }
    }

    /// State file key, `kind.name`
    pub fn address(&self) -> String {
        format!("{}.{}", self.kind(), self.name)
    }
}

/// Validated list of declared resources
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Manifest {
    pub resources: Vec<DeclaredResource>,
}

impl Manifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).with_context(|| format!("loading manifest {}", path.display()))
    }

    /// Parse and validate a manifest
    pub fn from_yaml(content: &str) -> Result<Self> {
        let raw: RawManifest = serde_yaml::from_str(content)?;
        let mut seen = HashSet::new();
        let mut resources = Vec::with_capacity(raw.resources.len());

        for entry in raw.resources {
            let address = format!("{}.{}", entry.kind, entry.name);
            if entry.name.is_empty() {
                return Err(Error::validation(format!("{} resource has no name", entry.kind)));
            }
            if !seen.insert(address.clone()) {
                return Err(Error::validation(format!("Duplicate resource '{}'", address)));
            }

            let spec = match entry.kind {
                ResourceKind::KafkaCluster => {
                    let spec: KafkaClusterSpec = serde_yaml::from_value(entry.spec)?;
                    kafka_cluster::validate(&spec).context(address.clone())?;
                    DesiredSpec::KafkaCluster(spec)
                }
                ResourceKind::VpcAddress => {
                    let spec: VpcAddressSpec = serde_yaml::from_value(entry.spec)?;
                    vpc_address::validate(&spec).context(address.clone())?;
                    DesiredSpec::VpcAddress(spec)
                }
            };
            resources.push(DeclaredResource {
                name: entry.name,
                spec,
            });
        }

        Ok(Self { resources })
    }
}

/// What happened to one resource
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Created,
    Updated,
    Replaced,
    Unchanged,
    Deleted,
    /// Gone on the remote side; dropped from state
    Removed,
    Refreshed,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Created => "created",
            Action::Updated => "updated",
            Action::Replaced => "replaced",
            Action::Unchanged => "unchanged",
            Action::Deleted => "deleted",
            Action::Removed => "removed",
            Action::Refreshed => "refreshed",
        };
        f.write_str(s)
    }
}

/// Actions taken by one run, in order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
    pub entries: Vec<(String, Action)>,
}

impl Report {
    fn record(&mut self, address: impl Into<String>, action: Action) {
        let address = address.into();
        info!(resource = %address, action = %action, "Reconciled resource");
        self.entries.push((address, action));
    }

    pub fn action(&self, address: &str) -> Option<Action> {
        self.entries
            .iter()
            .find(|(a, _)| a == address)
            .map(|(_, action)| *action)
    }

    /// Number of resources per action
    pub fn summary(&self) -> BTreeMap<String, usize> {
        let mut summary = BTreeMap::new();
        for (_, action) in &self.entries {
            *summary.entry(action.to_string()).or_insert(0) += 1;
        }
        summary
    }
}

/// Lifecycle of one resource kind, as seen by the driver
#[async_trait(?Send)]
trait Lifecycle {
    type Spec: Clone;
    type Status: Default;

    fn wrap(state: ResourceState<Self::Spec, Self::Status>) -> StoredResource;

    fn unwrap(stored: &StoredResource) -> Option<&ResourceState<Self::Spec, Self::Status>>;

    fn requires_replacement(
        ctx: &Context,
        state: &ResourceState<Self::Spec, Self::Status>,
        desired: &Self::Spec,
    ) -> Result<Vec<&'static str>>;

    async fn create(
        ctx: &Context,
        spec: &Self::Spec,
        identity: &mut Option<String>,
    ) -> Result<ResourceState<Self::Spec, Self::Status>>;

    async fn read(
        ctx: &Context,
        state: &ResourceState<Self::Spec, Self::Status>,
    ) -> Result<ReadOutcome<ResourceState<Self::Spec, Self::Status>>>;

    async fn update(
        ctx: &Context,
        state: &mut ResourceState<Self::Spec, Self::Status>,
        desired: &Self::Spec,
    ) -> Result<bool>;

    async fn delete(ctx: &Context, state: &ResourceState<Self::Spec, Self::Status>) -> Result<()>;
}

struct KafkaClusters;

#[async_trait(?Send)]
impl Lifecycle for KafkaClusters {
    type Spec = KafkaClusterSpec;
    type Status = KafkaClusterStatus;

    fn wrap(state: ResourceState<Self::Spec, Self::Status>) -> StoredResource {
        StoredResource::KafkaCluster(state)
    }

    fn unwrap(stored: &StoredResource) -> Option<&ResourceState<Self::Spec, Self::Status>> {
        match stored {
            StoredResource::KafkaCluster(state) => Some(state),
            _ => None,
        }
    }

    fn requires_replacement(
        ctx: &Context,
        state: &ResourceState<Self::Spec, Self::Status>,
        desired: &Self::Spec,
    ) -> Result<Vec<&'static str>> {
        kafka_cluster::requires_replacement(ctx, state, desired)
    }

    async fn create(
        ctx: &Context,
        spec: &Self::Spec,
        identity: &mut Option<String>,
    ) -> Result<ResourceState<Self::Spec, Self::Status>> {
        kafka_cluster::create(ctx, spec, identity).await
    }

    async fn read(
        ctx: &Context,
        state: &ResourceState<Self::Spec, Self::Status>,
    ) -> Result<ReadOutcome<ResourceState<Self::Spec, Self::Status>>> {
        kafka_cluster::read(ctx, state).await
    }

    async fn update(
        ctx: &Context,
        state: &mut ResourceState<Self::Spec, Self::Status>,
        desired: &Self::Spec,
    ) -> Result<bool> {
        kafka_cluster::update(ctx, state, desired).await
    }

    async fn delete(ctx: &Context, state: &ResourceState<Self::Spec, Self::Status>) -> Result<()> {
        kafka_cluster::delete(ctx, state).await
    }
}

struct VpcAddresses;

#[async_trait(?Send)]
impl Lifecycle for VpcAddresses {
    type Spec = VpcAddressSpec;
    type Status = VpcAddressStatus;

    fn wrap(state: ResourceState<Self::Spec, Self::Status>) -> StoredResource {
        StoredResource::VpcAddress(state)
    }

    fn unwrap(stored: &StoredResource) -> Option<&ResourceState<Self::Spec, Self::Status>> {
        match stored {
            StoredResource::VpcAddress(state) => Some(state),
            _ => None,
        }
    }

    fn requires_replacement(
        ctx: &Context,
        state: &ResourceState<Self::Spec, Self::Status>,
        desired: &Self::Spec,
    ) -> Result<Vec<&'static str>> {
        vpc_address::requires_replacement(ctx, state, desired)
    }

    async fn create(
        ctx: &Context,
        spec: &Self::Spec,
        identity: &mut Option<String>,
    ) -> Result<ResourceState<Self::Spec, Self::Status>> {
        vpc_address::create(ctx, spec, identity).await
    }

    async fn read(
        ctx: &Context,
        state: &ResourceState<Self::Spec, Self::Status>,
    ) -> Result<ReadOutcome<ResourceState<Self::Spec, Self::Status>>> {
        vpc_address::read(ctx, state).await
    }

    async fn update(
        ctx: &Context,
        state: &mut ResourceState<Self::Spec, Self::Status>,
        desired: &Self::Spec,
    ) -> Result<bool> {
        vpc_address::update(ctx, state, desired).await
    }

    async fn delete(ctx: &Context, state: &ResourceState<Self::Spec, Self::Status>) -> Result<()> {
        vpc_address::delete(ctx, state).await
    }
}

/// Create a resource and store it. When creation fails after the API
/// assigned an ID, the resource is stored as tainted so the next run
/// replaces it.
async fn create_resource<L: Lifecycle>(
    ctx: &Context,
    store: &mut StateStore,
    address: &str,
    desired: &L::Spec,
) -> Result<()> {
    let mut identity = None;
    match L::create(ctx, desired, &mut identity).await {
        Ok(state) => {
            store.state.resources.insert(address.to_string(), L::wrap(state));
            store.save()
        }
        Err(e) => {
            if let Some(id) = identity {
                warn!(resource = %address, id = %id, "Creation failed, marking resource as tainted");
                let mut state = ResourceState::new(id, desired.clone());
                state.tainted = true;
                store.state.resources.insert(address.to_string(), L::wrap(state));
                store.save()?;
            }
            Err(e.context(format!("creating {}", address)))
        }
    }
}

async fn apply_resource<L: Lifecycle>(
    ctx: &Context,
    store: &mut StateStore,
    address: &str,
    desired: &L::Spec,
) -> Result<Action>
where
    ResourceState<L::Spec, L::Status>: Clone,
{
    let known = match store.state.resources.get(address) {
        Some(stored) => Some(L::unwrap(stored).cloned().ok_or_else(|| {
            Error::validation(format!("{} is stored with a different kind", address))
        })?),
        None => None,
    };

    let Some(known) = known else {
        create_resource::<L>(ctx, store, address, desired).await?;
        return Ok(Action::Created);
    };

    let mut state = match L::read(ctx, &known).await.context(address.to_string())? {
        ReadOutcome::Present(state) => state,
        ReadOutcome::Removed => {
            store.state.resources.remove(address);
            store.save()?;
            create_resource::<L>(ctx, store, address, desired).await?;
            return Ok(Action::Created);
        }
    };

    let replaced = L::requires_replacement(ctx, &state, desired)?;
    if state.tainted || !replaced.is_empty() {
        info!(resource = %address, fields = ?replaced, tainted = state.tainted, "Replacing resource");
        L::delete(ctx, &state)
            .await
            .with_context(|| format!("replacing {}", address))?;
        store.state.resources.remove(address);
        store.save()?;
        create_resource::<L>(ctx, store, address, desired).await?;
        return Ok(Action::Replaced);
    }

    let result = L::update(ctx, &mut state, desired).await;
    store.state.resources.insert(address.to_string(), L::wrap(state));
    store.save()?;

    match result.with_context(|| format!("updating {}", address))? {
        true => Ok(Action::Updated),
        false => Ok(Action::Unchanged),
    }
}

async fn delete_stored(ctx: &Context, store: &mut StateStore, address: &str) -> Result<()> {
    let Some(stored) = store.state.resources.get(address).cloned() else {
        return Ok(());
    };
    let result = match &stored {
        StoredResource::KafkaCluster(state) => kafka_cluster::delete(ctx, state).await,
        StoredResource::VpcAddress(state) => vpc_address::delete(ctx, state).await,
    };
    result.with_context(|| format!("deleting {}", address))?;

    store.state.resources.remove(address);
    store.save()
}

fn record_managed(store: &StateStore) {
    for kind in [ResourceKind::KafkaCluster, ResourceKind::VpcAddress] {
        let count = store
            .state
            .resources
            .values()
            .filter(|stored| stored_kind(stored) == kind)
            .count();
        metrics::MANAGED_RESOURCES
            .with_label_values(&[kind.as_str()])
            .set(count as f64);
    }
}

fn stored_kind(stored: &StoredResource) -> ResourceKind {
    match stored {
        StoredResource::KafkaCluster(_) => ResourceKind::KafkaCluster,
        StoredResource::VpcAddress(_) => ResourceKind::VpcAddress,
    }
}

/// Converge the remote side and the state file to `manifest`
pub async fn apply(ctx: &Context, manifest: &Manifest, store: &mut StateStore) -> Result<Report> {
    let mut report = Report::default();

    for declared in &manifest.resources {
        let address = declared.address();
        let action = match &declared.spec {
            DesiredSpec::KafkaCluster(spec) => {
                apply_resource::<KafkaClusters>(ctx, store, &address, spec).await
            }
            DesiredSpec::VpcAddress(spec) => {
                apply_resource::<VpcAddresses>(ctx, store, &address, spec).await
            }
        };
        let action = action.inspect_err(|_| record_managed(store))?;
        report.record(address, action);
    }

    let declared: HashSet<String> = manifest.resources.iter().map(DeclaredResource::address).collect();
    let orphans: Vec<String> = store
        .state
        .resources
        .keys()
        .filter(|address| !declared.contains(*address))
        .cloned()
        .collect();
    for address in orphans {
        delete_stored(ctx, store, &address).await?;
        report.record(address, Action::Deleted);
    }

    record_managed(store);
    Ok(report)
}

/// Re-read every stored resource, dropping the ones gone remotely
pub async fn refresh(ctx: &Context, store: &mut StateStore) -> Result<Report> {
    let mut report = Report::default();
    let addresses: Vec<String> = store.state.resources.keys().cloned().collect();

    for address in addresses {
        let Some(stored) = store.state.resources.get(&address).cloned() else {
            continue;
        };
        let outcome = match &stored {
            StoredResource::KafkaCluster(state) => kafka_cluster::read(ctx, state)
                .await
                .map(|o| o.present().map(StoredResource::KafkaCluster)),
            StoredResource::VpcAddress(state) => vpc_address::read(ctx, state)
                .await
                .map(|o| o.present().map(StoredResource::VpcAddress)),
        }
        .with_context(|| format!("refreshing {}", address))?;

        match outcome {
            Some(refreshed) => {
                store.state.resources.insert(address.clone(), refreshed);
                report.record(address, Action::Refreshed);
            }
            None => {
                store.state.resources.remove(&address);
                report.record(address, Action::Removed);
            }
        }
        store.save()?;
    }

    record_managed(store);
    Ok(report)
}

/// Delete every stored resource, last stored first
pub async fn destroy(ctx: &Context, store: &mut StateStore) -> Result<Report> {
    let mut report = Report::default();
    let addresses: Vec<String> = store.state.resources.keys().rev().cloned().collect();

    for address in addresses {
        delete_stored(ctx, store, &address).await?;
        report.record(address, Action::Deleted);
    }

    record_managed(store);
    Ok(report)
}
