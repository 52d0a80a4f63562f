//! Resource reconcilers
//!
//! One module per resource kind, each exposing the same four operations:
//! - `create`: build the request, wait for the operation, then read
//! - `read`: refresh state, or report the resource as removed
//! - `update`: apply changed fields with update masks, phase by phase
//! - `delete`: remove the resource, treating "not found" as done
//!
//! Every remote call is awaited in sequence and every phase runs under the
//! configured deadline for its kind.

pub mod kafka_cluster;
pub mod vpc_address;

use std::future::Future;
use std::sync::Arc;

use crate::api::{AddressService, KafkaService, OperationService, RestClient};
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::metrics;
use crate::operation::OperationWaiter;
use crate::resources::ResourceKind;

/// Shared context for all reconcilers
#[derive(Clone)]
pub struct Context {
    pub kafka: Arc<dyn KafkaService>,
    pub addresses: Arc<dyn AddressService>,
    pub operations: OperationWaiter,
    pub config: ProviderConfig,
}

impl Context {
    /// Create a context over one client implementing every service
    pub fn new<C>(client: Arc<C>, config: ProviderConfig) -> Self
    where
        C: KafkaService + AddressService + OperationService + 'static,
    {
        Self {
            kafka: client.clone(),
            addresses: client.clone(),
            operations: OperationWaiter::new(client, config.poll),
            config,
        }
    }

    /// Create a context talking to the REST endpoints of `config`
    pub fn from_config(config: ProviderConfig) -> Result<Self> {
        let client = RestClient::new(config.endpoints.clone(), config.token.clone())?;
        Ok(Self::new(Arc::new(client), config))
    }
}

/// Count and time one reconciler operation
pub(crate) async fn instrumented<T, F>(kind: ResourceKind, operation: &str, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let labels = [kind.as_str(), operation];
    let _timer = metrics::RECONCILE_DURATION
        .with_label_values(&labels)
        .start_timer();
    metrics::RECONCILIATIONS.with_label_values(&labels).inc();

    let result = future.await;
    if result.is_err() {
        metrics::RECONCILIATION_ERRORS
            .with_label_values(&labels)
            .inc();
    }
    result
}

/// Whether the folder a resource resolves to differs from the folder it
/// lives in. An unknown current folder never counts as a move.
pub(crate) fn folder_moved(config: &ProviderConfig, declared: Option<&str>, current: &str) -> bool {
    if current.is_empty() {
        return false;
    }
    match config.resolve_folder_id(declared) {
        Ok(folder_id) => folder_id != current,
        Err(_) => false,
    }
}

/// Reject names the API would refuse, before any call is made
pub(crate) fn validate_name(what: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::validation(format!("{} name must not be empty", what)));
    }
    if name.chars().all(|c| c == '.') {
        return Err(Error::validation(format!(
            "Invalid {} name '{}': must contain a letter or digit",
            what, name
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(Error::validation(format!(
            "Invalid {} name '{}': only letters, digits, '-', '_' and '.' are allowed",
            what, name
        )));
    }
    Ok(())
}
