//! Bounded-concurrency plan/map job orchestrator.
//!
//! A job flows through two stages: a single planning call decomposes its
//! input into an ordered worklist, then a semaphore-gated mapping stage runs
//! every item through an opaque worker under a per-item deadline and
//! reassembles the results in planner order. Planner and worker are
//! injectable capabilities, so the engine runs unchanged against real
//! collaborators or deterministic fakes.

pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod fetch;
pub mod invoker;
pub mod orchestrator;
pub mod planner;
pub mod scheduler;
pub mod state_machine;
pub mod ui;

pub use config::MapioConfig;
pub use error::MapioError;
pub use orchestrator::JobOrchestrator;
pub use state_machine::{Job, JobReport};
