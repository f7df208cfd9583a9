//! Concurrency-bounded mapping stage.
//!
//! Dispatches items in planner order through a counting semaphore, one
//! spawned task per item, and reassembles outcomes keyed by item index so
//! the aggregate order never depends on completion order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Semaphore;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

use crate::invoker::{Worker, WorkerInvoker};
use crate::state_machine::{Item, ItemOutcome, ItemStatus};

/// What one mapping pass did, reported back to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSummary {
    /// Items actually handed to the invoker. Less than the worklist length
    /// when dispatch halted early or the job deadline lapsed.
    pub dispatched: usize,
    /// Indices whose terminal status is `Failed` or `TimedOut`, ascending.
    pub failed: Vec<usize>,
    /// The job-wide deadline lapsed with invocations still outstanding.
    pub timed_out: bool,
}

/// Semaphore-gated dispatcher with index-addressed result aggregation.
pub struct MapScheduler {
    max_concurrency: usize,
    continue_on_item_failure: bool,
}

impl MapScheduler {
    pub fn new(max_concurrency: usize, continue_on_item_failure: bool) -> Self {
        debug_assert!(max_concurrency > 0);
        Self {
            max_concurrency: max_concurrency.max(1),
            continue_on_item_failure,
        }
    }

    /// Run every queued item through the invoker, at most `max_concurrency`
    /// in flight at once. Outcomes are written into the items in place,
    /// each into its own index slot.
    ///
    /// Dispatch order follows item order; completion order is unconstrained.
    /// With `continue_on_item_failure` unset, admission stops once a failure
    /// has been observed — items already in flight still run to completion,
    /// never-dispatched items stay `Queued`. When `deadline` lapses,
    /// outstanding invocations are aborted and outcomes that finished in
    /// time are kept.
    pub async fn run<W: Worker>(
        &self,
        items: &mut [Item],
        invoker: &WorkerInvoker<W>,
        deadline: Option<Instant>,
    ) -> MapSummary {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let halted = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::with_capacity(items.len());
        let mut timed_out = false;

        for item in items.iter_mut() {
            // Admission: one slot per in-flight invocation, bounded by the
            // job deadline.
            let acquire = Arc::clone(&semaphore).acquire_owned();
            let acquired = match deadline {
                Some(at) => match timeout_at(at, acquire).await {
                    Ok(acquired) => acquired,
                    Err(_) => {
                        warn!(index = item.index, "job deadline lapsed during dispatch");
                        timed_out = true;
                        break;
                    }
                },
                None => acquire.await,
            };
            let permit = acquired.expect("admission semaphore is never closed");

            if !self.continue_on_item_failure && halted.load(Ordering::Acquire) {
                debug!(index = item.index, "dispatch halted after item failure");
                break;
            }

            item.status = ItemStatus::Running;
            let index = item.index;
            let payload = item.payload.clone();
            let invoker = invoker.clone();
            let halted = Arc::clone(&halted);
            let continue_on_failure = self.continue_on_item_failure;
            debug!(index, "dispatching item");

            let handle = tokio::spawn(async move {
                // The permit lives for the whole invocation and is released
                // on every exit path, abort and panic included.
                let _permit = permit;
                let outcome = invoker.invoke(payload).await;
                if !continue_on_failure && !matches!(outcome, ItemOutcome::Succeeded(_)) {
                    halted.store(true, Ordering::Release);
                }
                outcome
            });
            handles.push((index, handle));
        }

        let dispatched = handles.len();

        // Fan-in, single-threaded: every outcome lands in its own item's
        // slot, keyed by index, regardless of completion order.
        let mut failed = Vec::new();
        for (index, mut handle) in handles {
            let join = if timed_out {
                // Deadline already lapsed. Invocations that made it under
                // the wire still count; the rest are aborted as they stand.
                if handle.is_finished() {
                    Some((&mut handle).await)
                } else {
                    handle.abort();
                    None
                }
            } else {
                match deadline {
                    Some(at) => match timeout_at(at, &mut handle).await {
                        Ok(join) => Some(join),
                        Err(_) => {
                            warn!(index, "job deadline lapsed, aborting outstanding items");
                            handle.abort();
                            timed_out = true;
                            None
                        }
                    },
                    None => Some((&mut handle).await),
                }
            };

            let Some(join) = join else { continue };
            let outcome = match join {
                Ok(outcome) => outcome,
                // A worker that panicked is a failed item, not a crashed job.
                Err(e) => ItemOutcome::Failed(format!("worker task failed: {e}")),
            };
            if !matches!(outcome, ItemOutcome::Succeeded(_)) {
                failed.push(index);
            }
            items[index].record(outcome);
            debug!(index, status = ?items[index].status, "item terminal");
        }

        MapSummary {
            dispatched,
            failed,
            timed_out,
        }
    }
}
