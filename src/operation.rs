//! Long-running operation polling

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::api::{Operation, OperationService};
use crate::config::PollConfig;
use crate::error::{Error, Result};
use crate::metrics;

/// Waits for remote operations to finish
#[derive(Clone)]
pub struct OperationWaiter {
    operations: Arc<dyn OperationService>,
    poll: PollConfig,
}

impl OperationWaiter {
    pub fn new(operations: Arc<dyn OperationService>, poll: PollConfig) -> Self {
        Self { operations, poll }
    }

    /// Poll until the operation is done.
    ///
    /// The poll delay starts at `initial_interval` and doubles up to
    /// `max_interval`. A done operation carrying an error status becomes
    /// [`Error::OperationFailed`]; otherwise the final operation is returned
    /// so callers can inspect its response.
    pub async fn wait(&self, operation: Operation) -> Result<Operation> {
        let mut operation = operation;
        let mut delay = self.poll.initial_interval;

        while !operation.done {
            debug!(
                operation_id = %operation.id,
                description = %operation.description,
                delay_ms = delay.as_millis() as u64,
                "Operation in progress"
            );
            tokio::time::sleep(delay).await;
            operation = self.operations.get_operation(&operation.id).await?;
            delay = (delay * 2).min(self.poll.max_interval);
        }

        if let Some(status) = &operation.error {
            warn!(
                operation_id = %operation.id,
                code = status.code,
                message = %status.message,
                "Operation failed"
            );
            metrics::REMOTE_OPERATIONS.with_label_values(&["failed"]).inc();
            return Err(Error::OperationFailed {
                id: operation.id.clone(),
                code: status.code,
                message: status.message.clone(),
            });
        }

        metrics::REMOTE_OPERATIONS.with_label_values(&["done"]).inc();
        Ok(operation)
    }
}

/// Run one reconciliation phase under a deadline.
///
/// When the deadline passes the in-flight future is dropped, which abandons
/// any pending request or poll, and [`Error::Timeout`] is returned.
pub async fn with_timeout<T, F>(phase: &str, limit: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            phase: phase.to_string(),
            after: limit,
        }),
    }
}
