use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use serde_json::{Value, json};
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

use mapio::cli::{Cli, Command};
use mapio::config::MapioConfig;
use mapio::download::{DirStore, DownloadWorker};
use mapio::fetch::{DownloadRequest, FetchClient};
use mapio::invoker::{Worker, WorkerError};
use mapio::orchestrator::JobOrchestrator;
use mapio::planner::BatchPlanner;
use mapio::state_machine::{Job, JobOutcome, JobReport};
use mapio::ui::JobProgress;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = MapioConfig::load()?;
    if let Some(n) = cli.max_concurrency
        && n > 0
    {
        config.max_concurrency = n;
    }

    match cli.command {
        Command::Run {
            base_url,
            paths,
            out_dir,
        } => run_download(&config, base_url, paths, out_dir).await,
        Command::Demo => run_demo(&config).await,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "mapio=debug" } else { "mapio=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .init();
}

async fn run_download(
    config: &MapioConfig,
    base_url: String,
    paths: Vec<String>,
    out_dir: String,
) -> Result<()> {
    let request = DownloadRequest {
        base_url,
        resource_paths: paths,
    };
    let label = format!(
        "{} resource(s) from {}",
        request.resource_paths.len(),
        request.base_url
    );
    let input = serde_json::to_value(&request)?;

    // One knob drives both the partition size and the mapping width, like
    // the original deployment.
    let planner = BatchPlanner::new(config.max_concurrency);
    let worker = DownloadWorker::new(FetchClient::new(), DirStore::new(&out_dir));
    let orchestrator = JobOrchestrator::new(planner, Arc::new(worker), config);

    let mut job = Job::new(input);
    let progress = JobProgress::start(&label);
    let report = orchestrator.run_job(&mut job).await?;
    finish(&progress, &job, &report)
}

/// Worker used by `mapio demo`: sleeps proportionally to its chunk size and
/// echoes the paths it would have downloaded.
struct SimulatedWorker;

impl Worker for SimulatedWorker {
    async fn execute(&self, payload: Value) -> Result<Value, WorkerError> {
        let request: DownloadRequest =
            serde_json::from_value(payload).map_err(|e| WorkerError::Protocol(e.to_string()))?;
        sleep(Duration::from_millis(
            120 * request.resource_paths.len() as u64,
        ))
        .await;
        Ok(json!({"downloaded": request.resource_paths}))
    }
}

async fn run_demo(config: &MapioConfig) -> Result<()> {
    let request = DownloadRequest {
        base_url: "http://files.example.com".into(),
        resource_paths: (1..=8).map(|i| format!("images/photo-{i}.png")).collect(),
    };
    let input = serde_json::to_value(&request)?;

    let planner = BatchPlanner::new(2);
    let orchestrator = JobOrchestrator::new(planner, Arc::new(SimulatedWorker), config);

    let mut job = Job::new(input);
    let progress = JobProgress::start("demo: 8 simulated downloads");
    let report = orchestrator.run_job(&mut job).await?;
    finish(&progress, &job, &report)
}

fn finish(progress: &JobProgress, job: &Job, report: &JobReport) -> Result<()> {
    match &job.failure_reason {
        None => {
            progress.complete(&JobOutcome::Success);
            progress.print_report(report);
            Ok(())
        }
        Some(reason) => {
            progress.complete(&JobOutcome::Failure(reason.clone()));
            progress.print_report(report);
            anyhow::bail!("job {} failed: {reason}", job.id)
        }
    }
}
