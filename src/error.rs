use thiserror::Error;

use crate::fetch::FetchError;
use crate::invoker::WorkerError;
use crate::planner::PlanError;

#[derive(Debug, Error)]
pub enum MapioError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
