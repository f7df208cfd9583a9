use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("server returned status {status} for {path}")]
    Status { status: u16, path: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
