//! Persisted resource state
//!
//! A [`ResourceState`] is what the provider remembers about one remote
//! resource between runs: its identity, the declared spec as last applied
//! and refreshed, and the computed attributes the remote reported.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::changes::apply_field;
use crate::error::Result;
use crate::resources::{KafkaClusterSpec, KafkaClusterStatus, VpcAddressSpec, VpcAddressStatus};

fn is_false(value: &bool) -> bool {
    !*value
}

/// Identity, applied spec and computed status of one resource
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResourceState<S, T> {
    /// Remote-assigned identifier, immutable once set
    pub id: String,
    /// Declared spec as last applied and refreshed from the remote
    pub spec: S,
    /// Computed attributes
    pub status: T,
    /// Field groups committed by an update that did not finish
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partial: Vec<String>,
    /// Creation did not complete; the resource must be replaced
    #[serde(default, skip_serializing_if = "is_false")]
    pub tainted: bool,
}

pub type KafkaClusterState = ResourceState<KafkaClusterSpec, KafkaClusterStatus>;
pub type VpcAddressState = ResourceState<VpcAddressSpec, VpcAddressStatus>;

impl<S, T: Default> ResourceState<S, T> {
    /// State of a freshly identified resource whose status is not known yet
    pub fn new(id: impl Into<String>, spec: S) -> Self {
        Self {
            id: id.into(),
            spec,
            status: T::default(),
            partial: Vec::new(),
            tainted: false,
        }
    }
}

impl<S, T> ResourceState<S, T>
where
    S: Serialize + DeserializeOwned,
{
    /// Record that `field` of `desired` has been applied remotely
    pub fn commit_field(&mut self, field: &str, desired: &S) -> Result<()> {
        apply_field(&mut self.spec, desired, field)?;
        if !self.partial.iter().any(|f| f == field) {
            self.partial.push(field.to_string());
        }
        debug!(id = %self.id, field = field, "Committed partial update");
        Ok(())
    }
}

/// Outcome of reading a resource
#[derive(Clone, Debug, PartialEq)]
pub enum ReadOutcome<T> {
    /// The resource exists; its refreshed state
    Present(T),
    /// The remote no longer has the resource
    Removed,
}

impl<T> ReadOutcome<T> {
    pub fn is_removed(&self) -> bool {
        matches!(self, ReadOutcome::Removed)
    }

    pub fn present(self) -> Option<T> {
        match self {
            ReadOutcome::Present(state) => Some(state),
            ReadOutcome::Removed => None,
        }
    }
}

type Completion<'a, S> = Box<dyn FnOnce(&mut S) -> Result<()> + Send + 'a>;

/// Completion callbacks collected while a phase is prepared and run only
/// once the phase's remote call has succeeded. Dropping the log discards
/// them.
pub struct CommitLog<'a, S> {
    pending: Vec<Completion<'a, S>>,
}

impl<'a, S> CommitLog<'a, S> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Queue a callback for when the phase succeeds
    pub fn defer<F>(&mut self, f: F)
    where
        F: FnOnce(&mut S) -> Result<()> + Send + 'a,
    {
        self.pending.push(Box::new(f));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Run every queued callback in order
    pub fn commit(self, target: &mut S) -> Result<()> {
        for completion in self.pending {
            completion(target)?;
        }
        Ok(())
    }
}

impl<S> Default for CommitLog<'_, S> {
    fn default() -> Self {
        Self::new()
    }
}

/// State of any supported resource kind
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoredResource {
    KafkaCluster(KafkaClusterState),
    VpcAddress(VpcAddressState),
}

impl StoredResource {
    pub fn id(&self) -> &str {
        match self {
            StoredResource::KafkaCluster(state) => &state.id,
            StoredResource::VpcAddress(state) => &state.id,
        }
    }

    pub fn is_tainted(&self) -> bool {
        match self {
            StoredResource::KafkaCluster(state) => state.tainted,
            StoredResource::VpcAddress(state) => state.tainted,
        }
    }
}

/// All resources known to the provider, keyed by `kind.name`
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct StateFile {
    #[serde(default)]
    pub resources: BTreeMap<String, StoredResource>,
}

/// State file bound to its location on disk
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    pub state: StateFile,
}

impl StateStore {
    /// Open a state file; a missing file yields an empty state
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            StateFile::default()
        };
        Ok(Self { path, state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the state next to its final location, then rename it into place
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&self.state)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
