//! Planning stage: turns a job input into an ordered worklist.
//!
//! The [`Planner`] capability is injectable so the orchestration engine can
//! be exercised with deterministic fakes; [`BatchPlanner`] is the shipped
//! implementation, which chunks a download request into fixed-size batches.

use std::future::Future;

use serde_json::Value;
use thiserror::Error;

use crate::fetch::DownloadRequest;

/// Planning failure: the input could not be decomposed into a worklist.
/// Fatal to the job; no items are ever dispatched after one of these.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("malformed job input: {0}")]
    Malformed(String),

    #[error("work source unresolvable: {0}")]
    Unresolvable(String),
}

/// Decomposes a job input into an ordered sequence of item payloads.
///
/// Called exactly once per job, before any mapping begins. Must produce a
/// finite sequence; an empty sequence is valid and short-circuits the job to
/// success. The call is bounded by the orchestrator's planning deadline.
pub trait Planner: Send + Sync {
    fn plan(&self, input: &Value) -> impl Future<Output = Result<Vec<Value>, PlanError>> + Send;
}

/// Partitions a [`DownloadRequest`] into chunks of `batch_size` paths, one
/// item payload per chunk. Chunk order follows input order, so item indices
/// line up with the original path list.
pub struct BatchPlanner {
    batch_size: usize,
}

impl BatchPlanner {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }
}

impl Planner for BatchPlanner {
    async fn plan(&self, input: &Value) -> Result<Vec<Value>, PlanError> {
        let request: DownloadRequest = serde_json::from_value(input.clone())
            .map_err(|e| PlanError::Malformed(e.to_string()))?;

        let mut payloads = Vec::new();
        for chunk in request.resource_paths.chunks(self.batch_size) {
            let batch = DownloadRequest {
                base_url: request.base_url.clone(),
                resource_paths: chunk.to_vec(),
            };
            let payload = serde_json::to_value(batch)
                .map_err(|e| PlanError::Malformed(e.to_string()))?;
            payloads.push(payload);
        }
        Ok(payloads)
    }
}
