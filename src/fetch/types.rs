//! Payload types exchanged between the download planner and worker.

use serde::{Deserialize, Serialize};

/// A request to download a set of resource paths from one base URL.
///
/// Used both as the job input (the full path list) and as the per-item
/// payload (one planned chunk of that list) — the planner carries the base
/// URL into every chunk so each item is self-contained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// URL every resource path is resolved against.
    pub base_url: String,
    /// Paths to fetch, in order.
    pub resource_paths: Vec<String>,
}
