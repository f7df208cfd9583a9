//! The shipped worker collaborator: fetch every resource in a planned chunk
//! and store the bodies. The engine only ever sees it through the [`Worker`]
//! contract.

use std::future::Future;
use std::path::PathBuf;

use serde_json::Value;

use crate::fetch::{DownloadRequest, FetchClient, FetchError};
use crate::invoker::{Worker, WorkerError};

/// Where downloaded bodies end up, addressed by opaque keys. The engine
/// never interprets the keys; workers and callers exchange them as-is.
pub trait ObjectStore: Send + Sync + 'static {
    fn put(&self, key: &str, bytes: &[u8]) -> impl Future<Output = std::io::Result<()>> + Send;
}

/// Stores objects as files under a root directory, creating intermediate
/// directories as needed.
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ObjectStore for DirStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> std::io::Result<()> {
        let path = self.root.join(key.trim_start_matches('/'));
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await
    }
}

/// Downloads every resource path in its chunk payload and stores each body
/// under the path as key. Returns the stored keys, in chunk order, as the
/// item result. Any failed fetch or store fails the whole item.
pub struct DownloadWorker<S> {
    client: FetchClient,
    store: S,
}

impl<S: ObjectStore> DownloadWorker<S> {
    pub fn new(client: FetchClient, store: S) -> Self {
        Self { client, store }
    }
}

impl<S: ObjectStore> Worker for DownloadWorker<S> {
    async fn execute(&self, payload: Value) -> Result<Value, WorkerError> {
        let request: DownloadRequest = serde_json::from_value(payload)
            .map_err(|e| WorkerError::Protocol(format!("bad item payload: {e}")))?;

        let mut stored = Vec::with_capacity(request.resource_paths.len());
        for path in &request.resource_paths {
            let bytes = self
                .client
                .get(&request.base_url, path)
                .await
                .map_err(|e| match e {
                    FetchError::Status { .. } => WorkerError::Protocol(e.to_string()),
                    FetchError::Transport(_) => WorkerError::Transport(e.to_string()),
                })?;
            self.store
                .put(path, &bytes)
                .await
                .map_err(|e| WorkerError::Transport(format!("store {path}: {e}")))?;
            stored.push(path.clone());
        }

        serde_json::to_value(stored).map_err(|e| WorkerError::Protocol(e.to_string()))
    }
}
