mod job;
mod state;

pub use job::{
    FailureReason, Item, ItemOutcome, ItemRecord, ItemStatus, Job, JobOutcome, JobReport,
};
pub use state::{PhaseOutcome, State, StateMachine, Transition};
