//! Worker invocation: one opaque unit of work, one hard deadline, exactly
//! one normalized outcome.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::time::timeout;

use crate::state_machine::ItemOutcome;

/// Failure surfaced by an opaque worker. Both variants are normalized to
/// `ItemOutcome::Failed` with the cause preserved for diagnostics.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The worker answered, but with something unusable (malformed payload,
    /// malformed response, non-success result).
    #[error("worker protocol error: {0}")]
    Protocol(String),

    /// The call itself failed (connection refused, storage write error).
    #[error("worker transport error: {0}")]
    Transport(String),
}

/// One opaque, possibly-failing, possibly-slow unit of work.
///
/// Implementations are injected into the engine; the scheduler shares one
/// worker across all in-flight invocations, so they must be `Send + Sync`.
pub trait Worker: Send + Sync + 'static {
    fn execute(&self, payload: Value)
    -> impl Future<Output = Result<Value, WorkerError>> + Send;
}

/// Executes a single worker call under the per-item deadline and collapses
/// every possible ending into one [`ItemOutcome`].
///
/// Cancellation on deadline is best-effort: the in-flight future is dropped,
/// but whether the underlying work observes that is the worker's business —
/// "no response by deadline" is `TimedOut` either way. The invoker never
/// retries; retry policy belongs to whoever configures the orchestrator.
pub struct WorkerInvoker<W> {
    worker: Arc<W>,
    item_timeout: Duration,
}

impl<W> Clone for WorkerInvoker<W> {
    fn clone(&self) -> Self {
        Self {
            worker: Arc::clone(&self.worker),
            item_timeout: self.item_timeout,
        }
    }
}

impl<W: Worker> WorkerInvoker<W> {
    pub fn new(worker: Arc<W>, item_timeout: Duration) -> Self {
        Self {
            worker,
            item_timeout,
        }
    }

    pub async fn invoke(&self, payload: Value) -> ItemOutcome {
        match timeout(self.item_timeout, self.worker.execute(payload)).await {
            Ok(Ok(value)) => ItemOutcome::Succeeded(value),
            Ok(Err(e)) => ItemOutcome::Failed(e.to_string()),
            Err(_) => ItemOutcome::TimedOut,
        }
    }
}
