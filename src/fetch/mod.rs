pub mod client;
pub mod error;
pub mod types;

pub use client::FetchClient;
pub use error::FetchError;
pub use types::DownloadRequest;
