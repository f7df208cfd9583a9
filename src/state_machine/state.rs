use std::fmt;

use serde::{Deserialize, Serialize};

use super::job::{FailureReason, Job, JobOutcome};

/// The states of the mapio job state machine.
///
/// Each job flows through: PENDING → PLANNING → MAPPING → {SUCCEEDED | FAILED},
/// with PLANNING → SUCCEEDED as the short-circuit for an empty plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    Pending,
    Planning,
    Mapping,
    Succeeded,
    Failed,
}

impl State {
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Succeeded | State::Failed)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Pending => write!(f, "PENDING"),
            State::Planning => write!(f, "PLANNING"),
            State::Mapping => write!(f, "MAPPING"),
            State::Succeeded => write!(f, "SUCCEEDED"),
            State::Failed => write!(f, "FAILED"),
        }
    }
}

/// What a completed phase reports back to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseOutcome {
    /// The job was submitted; begin planning.
    Submitted,
    /// Planning produced a worklist of this many items.
    Planned(usize),
    /// Every item reached `Succeeded`.
    Mapped,
    /// The current phase failed with a job-level reason.
    Failed(FailureReason),
}

/// The result of evaluating a state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Advance to the next state.
    Next(State),
    /// The job has completed (successfully or with a terminal failure).
    Complete(JobOutcome),
    /// The (state, outcome) pairing is not a legal transition; nothing changed.
    Rejected { state: State },
}

/// Drives a `Job` through the state machine.
pub struct StateMachine;

impl StateMachine {
    /// Compute the next transition for the given job from its current state
    /// and the reported phase outcome, then apply it.
    ///
    /// - `Pending` accepts only `Submitted` and advances to `Planning`.
    /// - `Planning` advances to `Mapping` on a non-empty plan, completes
    ///   successfully on an empty one, and completes with failure on
    ///   `Failed`.
    /// - `Mapping` completes successfully on `Mapped`, with failure on
    ///   `Failed`.
    /// - `Succeeded` and `Failed` are terminal; every outcome is rejected.
    pub fn next(job: &mut Job, outcome: PhaseOutcome) -> Transition {
        let transition = match (job.state, outcome) {
            (State::Pending, PhaseOutcome::Submitted) => Transition::Next(State::Planning),
            (State::Planning, PhaseOutcome::Planned(0)) => {
                Transition::Complete(JobOutcome::Success)
            }
            (State::Planning, PhaseOutcome::Planned(_)) => Transition::Next(State::Mapping),
            (State::Mapping, PhaseOutcome::Mapped) => Transition::Complete(JobOutcome::Success),
            (state, PhaseOutcome::Failed(reason)) if !state.is_terminal() => {
                Transition::Complete(JobOutcome::Failure(reason))
            }
            (state, _) => Transition::Rejected { state },
        };

        // Apply the transition to the job.
        match &transition {
            Transition::Next(next_state) => {
                job.state_history.push(job.state);
                job.state = *next_state;
                job.touch();
            }
            Transition::Complete(outcome) => {
                job.state_history.push(job.state);
                job.state = match outcome {
                    JobOutcome::Success => State::Succeeded,
                    JobOutcome::Failure(_) => State::Failed,
                };
                job.touch();
            }
            Transition::Rejected { .. } => {}
        }

        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_job() -> Job {
        Job::new(json!({"resource_paths": ["a", "b"]}))
    }

    #[test]
    fn happy_path_walks_all_states() {
        let mut job = make_job();
        assert_eq!(job.state, State::Pending);

        let t = StateMachine::next(&mut job, PhaseOutcome::Submitted);
        assert_eq!(t, Transition::Next(State::Planning));
        assert_eq!(job.state, State::Planning);

        let t = StateMachine::next(&mut job, PhaseOutcome::Planned(2));
        assert_eq!(t, Transition::Next(State::Mapping));
        assert_eq!(job.state, State::Mapping);

        let t = StateMachine::next(&mut job, PhaseOutcome::Mapped);
        assert_eq!(t, Transition::Complete(JobOutcome::Success));
        assert_eq!(job.state, State::Succeeded);
    }

    #[test]
    fn empty_plan_short_circuits_to_succeeded() {
        let mut job = make_job();
        StateMachine::next(&mut job, PhaseOutcome::Submitted);

        let t = StateMachine::next(&mut job, PhaseOutcome::Planned(0));
        assert_eq!(t, Transition::Complete(JobOutcome::Success));
        assert_eq!(job.state, State::Succeeded);
        // Mapping never entered.
        assert_eq!(job.state_history, vec![State::Pending, State::Planning]);
    }

    #[test]
    fn planning_failure_is_terminal() {
        let mut job = make_job();
        StateMachine::next(&mut job, PhaseOutcome::Submitted);

        let reason = FailureReason::Planning("malformed input".into());
        let t = StateMachine::next(&mut job, PhaseOutcome::Failed(reason.clone()));
        assert_eq!(t, Transition::Complete(JobOutcome::Failure(reason)));
        assert_eq!(job.state, State::Failed);
    }

    #[test]
    fn mapping_failure_is_terminal() {
        let mut job = make_job();
        StateMachine::next(&mut job, PhaseOutcome::Submitted);
        StateMachine::next(&mut job, PhaseOutcome::Planned(3));

        let reason = FailureReason::ItemsFailed { failed: vec![1] };
        let t = StateMachine::next(&mut job, PhaseOutcome::Failed(reason.clone()));
        assert_eq!(t, Transition::Complete(JobOutcome::Failure(reason)));
        assert_eq!(job.state, State::Failed);
    }

    #[test]
    fn terminal_states_reject_everything() {
        let mut job = make_job();
        StateMachine::next(&mut job, PhaseOutcome::Submitted);
        StateMachine::next(&mut job, PhaseOutcome::Planned(0));
        assert_eq!(job.state, State::Succeeded);

        let t = StateMachine::next(&mut job, PhaseOutcome::Mapped);
        assert_eq!(t, Transition::Rejected { state: State::Succeeded });
        assert_eq!(job.state, State::Succeeded);

        let t = StateMachine::next(
            &mut job,
            PhaseOutcome::Failed(FailureReason::JobTimedOut),
        );
        assert_eq!(t, Transition::Rejected { state: State::Succeeded });
    }

    #[test]
    fn out_of_phase_outcomes_are_rejected() {
        let mut job = make_job();

        // Pending only accepts Submitted.
        let t = StateMachine::next(&mut job, PhaseOutcome::Mapped);
        assert_eq!(t, Transition::Rejected { state: State::Pending });
        assert_eq!(job.state, State::Pending);
        assert!(job.state_history.is_empty());

        StateMachine::next(&mut job, PhaseOutcome::Submitted);
        let t = StateMachine::next(&mut job, PhaseOutcome::Mapped);
        assert_eq!(t, Transition::Rejected { state: State::Planning });
    }

    #[test]
    fn state_history_is_recorded() {
        let mut job = make_job();
        StateMachine::next(&mut job, PhaseOutcome::Submitted);
        StateMachine::next(&mut job, PhaseOutcome::Planned(1));
        StateMachine::next(&mut job, PhaseOutcome::Mapped);

        assert_eq!(
            job.state_history,
            vec![State::Pending, State::Planning, State::Mapping]
        );
        assert_eq!(job.state, State::Succeeded);
    }

    #[test]
    fn state_display() {
        assert_eq!(State::Pending.to_string(), "PENDING");
        assert_eq!(State::Planning.to_string(), "PLANNING");
        assert_eq!(State::Mapping.to_string(), "MAPPING");
        assert_eq!(State::Succeeded.to_string(), "SUCCEEDED");
        assert_eq!(State::Failed.to_string(), "FAILED");
    }
}
