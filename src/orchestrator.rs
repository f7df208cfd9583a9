use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use serde_json::Value;
use tokio::time::{Instant, timeout};
use tracing::{info, warn};

use crate::config::MapioConfig;
use crate::invoker::{Worker, WorkerInvoker};
use crate::planner::Planner;
use crate::scheduler::MapScheduler;
use crate::state_machine::{
    FailureReason, Job, JobOutcome, JobReport, PhaseOutcome, StateMachine, Transition,
};

/// Drives jobs through the full state machine lifecycle:
/// PENDING → PLANNING → MAPPING → {SUCCEEDED | FAILED}.
///
/// The orchestrator is the single writer of job state, result, and failure
/// reason; the planner and scheduler report outcomes back to it. Submission
/// is synchronous: `run_job` returns once the job is terminal, and item-level
/// failures surface in the returned report, never as an `Err`.
pub struct JobOrchestrator<P, W> {
    planner: P,
    invoker: WorkerInvoker<W>,
    scheduler: MapScheduler,
    plan_timeout: Duration,
    job_timeout: Option<Duration>,
}

impl<P: Planner, W: Worker> JobOrchestrator<P, W> {
    pub fn new(planner: P, worker: Arc<W>, config: &MapioConfig) -> Self {
        Self {
            planner,
            invoker: WorkerInvoker::new(worker, config.item_timeout()),
            scheduler: MapScheduler::new(config.max_concurrency, config.continue_on_item_failure),
            plan_timeout: config.plan_timeout(),
            job_timeout: config.job_timeout(),
        }
    }

    /// Run a job to a terminal state, returning its report.
    ///
    /// `Err` is reserved for misuse (re-submitting a terminal job); a failed
    /// job is an `Ok` report with `failure_reason` set and every per-item
    /// outcome attached.
    pub async fn run_job(&self, job: &mut Job) -> Result<JobReport> {
        // PENDING → PLANNING
        let t = StateMachine::next(job, PhaseOutcome::Submitted);
        if !matches!(t, Transition::Next(_)) {
            bail!("job {} cannot be submitted from state {}", job.id, job.state);
        }
        info!(job_id = %job.id, "planning");

        // PLANNING: a single bounded planner call.
        let payloads = match timeout(self.plan_timeout, self.planner.plan(&job.input)).await {
            Ok(Ok(payloads)) => payloads,
            Ok(Err(e)) => return self.fail(job, FailureReason::Planning(e.to_string())),
            Err(_) => return self.fail(job, FailureReason::PlanningTimedOut),
        };
        job.set_items(payloads);

        match StateMachine::next(job, PhaseOutcome::Planned(job.items.len())) {
            Transition::Next(_) => {}
            Transition::Complete(JobOutcome::Success) => {
                // Empty plan: succeed with an empty aggregate. The scheduler
                // is never invoked.
                job.record_result(Vec::new());
                info!(job_id = %job.id, "empty plan, job succeeded");
                return Ok(JobReport::from_job(job));
            }
            other => bail!("unexpected transition after planning: {other:?}"),
        }

        // MAPPING: bounded fan-out, order-preserving fan-in.
        info!(job_id = %job.id, items = job.items.len(), "mapping");
        let deadline = self.job_timeout.map(|limit| Instant::now() + limit);
        let summary = self
            .scheduler
            .run(&mut job.items, &self.invoker, deadline)
            .await;

        if summary.timed_out {
            return self.fail(job, FailureReason::JobTimedOut);
        }
        if !summary.failed.is_empty() {
            return self.fail(
                job,
                FailureReason::ItemsFailed {
                    failed: summary.failed,
                },
            );
        }

        let t = StateMachine::next(job, PhaseOutcome::Mapped);
        if !matches!(t, Transition::Complete(JobOutcome::Success)) {
            bail!("unexpected transition after mapping: {t:?}");
        }
        let aggregate = job
            .items
            .iter()
            .map(|item| item.result.clone().unwrap_or(Value::Null))
            .collect();
        job.record_result(aggregate);
        info!(job_id = %job.id, "job succeeded");
        Ok(JobReport::from_job(job))
    }

    fn fail(&self, job: &mut Job, reason: FailureReason) -> Result<JobReport> {
        let t = StateMachine::next(job, PhaseOutcome::Failed(reason.clone()));
        if !matches!(t, Transition::Complete(JobOutcome::Failure(_))) {
            bail!("unexpected transition on failure: {t:?}");
        }
        warn!(job_id = %job.id, %reason, "job failed");
        job.record_failure(reason);
        Ok(JobReport::from_job(job))
    }
}
