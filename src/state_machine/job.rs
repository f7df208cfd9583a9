use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::state::State;

/// Job-level failure classification. Item-level detail lives on the items
/// themselves; this is the aggregate reason the job as a whole failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// The planner could not decompose the input into a worklist.
    Planning(String),
    /// The planner did not answer within the planning deadline.
    PlanningTimedOut,
    /// One or more items reached `Failed` or `TimedOut`.
    ItemsFailed { failed: Vec<usize> },
    /// The job-wide deadline lapsed with items still outstanding.
    JobTimedOut,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Planning(msg) => write!(f, "planning failed: {msg}"),
            FailureReason::PlanningTimedOut => write!(f, "planning deadline exceeded"),
            FailureReason::ItemsFailed { failed } => {
                write!(f, "{} item(s) did not succeed: {failed:?}", failed.len())
            }
            FailureReason::JobTimedOut => write!(f, "job deadline exceeded"),
        }
    }
}

/// The terminal result of running a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobOutcome {
    Success,
    Failure(FailureReason),
}

/// Lifecycle status of a single planned item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

impl ItemStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ItemStatus::Succeeded | ItemStatus::Failed | ItemStatus::TimedOut
        )
    }
}

/// Normalized result of one worker invocation. Exactly one of these is
/// produced per dispatched item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemOutcome {
    Succeeded(Value),
    Failed(String),
    TimedOut,
}

/// One unit of planned work. `index` is the ordering key: it is the item's
/// position in the planner's output and the slot its result occupies in the
/// final aggregate, no matter when the invocation completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub index: usize,
    pub payload: Value,
    pub status: ItemStatus,
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl Item {
    pub fn new(index: usize, payload: Value) -> Self {
        Self {
            index,
            payload,
            status: ItemStatus::Queued,
            result: None,
            error: None,
        }
    }

    /// Apply a normalized invocation outcome. Called exactly once per item,
    /// by the scheduler's single-threaded aggregation loop.
    pub fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Succeeded(value) => {
                self.status = ItemStatus::Succeeded;
                self.result = Some(value);
            }
            ItemOutcome::Failed(error) => {
                self.status = ItemStatus::Failed;
                self.error = Some(error);
            }
            ItemOutcome::TimedOut => {
                self.status = ItemStatus::TimedOut;
                self.error = Some("item deadline exceeded".to_string());
            }
        }
    }
}

/// One end-to-end orchestration request, from raw input to aggregate output.
///
/// Owned exclusively by the orchestrator; `result` and `failure_reason` are
/// mutually exclusive and each written at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub input: Value,
    pub items: Vec<Item>,
    pub state: State,
    pub state_history: Vec<State>,
    pub result: Option<Vec<Value>>,
    pub failure_reason: Option<FailureReason>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(input: Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            input,
            items: Vec::new(),
            state: State::Pending,
            state_history: Vec::new(),
            result: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Populate the worklist from planner output, assigning contiguous
    /// 0-based indices in planner order.
    pub fn set_items(&mut self, payloads: Vec<Value>) {
        self.items = payloads
            .into_iter()
            .enumerate()
            .map(|(index, payload)| Item::new(index, payload))
            .collect();
        self.touch();
    }

    /// Record the ordered success aggregate. Mutually exclusive with
    /// `record_failure`.
    pub fn record_result(&mut self, aggregate: Vec<Value>) {
        debug_assert!(self.result.is_none() && self.failure_reason.is_none());
        self.result = Some(aggregate);
        self.touch();
    }

    /// Record the job-level failure reason. Mutually exclusive with
    /// `record_result`.
    pub fn record_failure(&mut self, reason: FailureReason) {
        debug_assert!(self.result.is_none() && self.failure_reason.is_none());
        self.failure_reason = Some(reason);
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Per-item entry in a [`JobReport`] — the item minus its payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    pub index: usize,
    pub status: ItemStatus,
    pub result: Option<Value>,
    pub error: Option<String>,
}

/// Structured terminal summary produced once a job reaches `Succeeded` or
/// `Failed`. Carries every per-item outcome so callers can tell which items
/// failed even when the job as a whole did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: String,
    pub state: State,
    pub failure_reason: Option<FailureReason>,
    pub state_transitions: Vec<State>,
    pub items: Vec<ItemRecord>,
    pub item_count: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl JobReport {
    /// Generate a report from a job in a terminal state.
    pub fn from_job(job: &Job) -> Self {
        let now = Utc::now();
        let duration = now - job.created_at;
        let mut transitions = job.state_history.clone();
        transitions.push(job.state);

        let items: Vec<ItemRecord> = job
            .items
            .iter()
            .map(|item| ItemRecord {
                index: item.index,
                status: item.status,
                result: item.result.clone(),
                error: item.error.clone(),
            })
            .collect();

        let count = |status: ItemStatus| items.iter().filter(|i| i.status == status).count();

        Self {
            job_id: job.id.clone(),
            state: job.state,
            failure_reason: job.failure_reason.clone(),
            state_transitions: transitions,
            item_count: items.len(),
            succeeded: count(ItemStatus::Succeeded),
            failed: count(ItemStatus::Failed),
            timed_out: count(ItemStatus::TimedOut),
            items,
            started_at: job.created_at,
            completed_at: now,
            duration_ms: duration.num_milliseconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn job_creation_defaults() {
        let job = Job::new(json!({"base_url": "http://example.com"}));
        assert_eq!(job.state, State::Pending);
        assert!(job.items.is_empty());
        assert!(job.result.is_none());
        assert!(job.failure_reason.is_none());
        assert!(job.state_history.is_empty());
    }

    #[test]
    fn set_items_assigns_contiguous_indices() {
        let mut job = Job::new(json!(null));
        job.set_items(vec![json!("a"), json!("b"), json!("c")]);
        assert_eq!(job.items.len(), 3);
        for (i, item) in job.items.iter().enumerate() {
            assert_eq!(item.index, i);
            assert_eq!(item.status, ItemStatus::Queued);
        }
        assert_eq!(job.items[1].payload, json!("b"));
    }

    #[test]
    fn item_records_success() {
        let mut item = Item::new(0, json!("payload"));
        item.record(ItemOutcome::Succeeded(json!(42)));
        assert_eq!(item.status, ItemStatus::Succeeded);
        assert_eq!(item.result, Some(json!(42)));
        assert!(item.error.is_none());
    }

    #[test]
    fn item_records_failure_with_cause() {
        let mut item = Item::new(0, json!(null));
        item.record(ItemOutcome::Failed("connection refused".into()));
        assert_eq!(item.status, ItemStatus::Failed);
        assert_eq!(item.error.as_deref(), Some("connection refused"));
        assert!(item.result.is_none());
    }

    #[test]
    fn item_records_timeout() {
        let mut item = Item::new(2, json!(null));
        item.record(ItemOutcome::TimedOut);
        assert_eq!(item.status, ItemStatus::TimedOut);
        assert!(item.error.is_some());
    }

    #[test]
    fn item_status_terminality() {
        assert!(!ItemStatus::Queued.is_terminal());
        assert!(!ItemStatus::Running.is_terminal());
        assert!(ItemStatus::Succeeded.is_terminal());
        assert!(ItemStatus::Failed.is_terminal());
        assert!(ItemStatus::TimedOut.is_terminal());
    }

    #[test]
    fn report_counts_outcomes_per_status() {
        let mut job = Job::new(json!(null));
        job.set_items(vec![json!(0), json!(1), json!(2), json!(3)]);
        job.items[0].record(ItemOutcome::Succeeded(json!("ok")));
        job.items[1].record(ItemOutcome::Failed("boom".into()));
        job.items[2].record(ItemOutcome::TimedOut);
        job.items[3].record(ItemOutcome::Succeeded(json!("ok")));

        let report = JobReport::from_job(&job);
        assert_eq!(report.item_count, 4);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.timed_out, 1);
        assert_eq!(report.items[2].status, ItemStatus::TimedOut);
    }

    #[test]
    fn report_preserves_item_order() {
        let mut job = Job::new(json!(null));
        job.set_items((0..5).map(|i| json!(i)).collect());
        let report = JobReport::from_job(&job);
        let indices: Vec<usize> = report.items.iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn failure_reason_display() {
        assert_eq!(
            FailureReason::Planning("bad input".into()).to_string(),
            "planning failed: bad input"
        );
        assert_eq!(
            FailureReason::PlanningTimedOut.to_string(),
            "planning deadline exceeded"
        );
        assert_eq!(
            FailureReason::ItemsFailed { failed: vec![1, 3] }.to_string(),
            "2 item(s) did not succeed: [1, 3]"
        );
        assert_eq!(FailureReason::JobTimedOut.to_string(), "job deadline exceeded");
    }

    #[test]
    fn job_serialization_roundtrip() {
        let mut job = Job::new(json!({"k": "v"}));
        job.set_items(vec![json!("x")]);
        let json = serde_json::to_string(&job).unwrap();
        let back: Job = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, job.id);
        assert_eq!(back.state, State::Pending);
        assert_eq!(back.items.len(), 1);
    }
}
