use std::time::Duration;

use reqwest::Client;

use super::error::FetchError;

/// Thin HTTP client for pulling resource bodies.
///
/// The base URL travels in each item payload rather than in the client, so
/// one client serves every job (and tests can point a job at a mock server
/// through its input alone).
pub struct FetchClient {
    client: Client,
}

impl Default for FetchClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }

    /// GET one resource path relative to a base URL, returning the body.
    /// Non-success statuses are normalized to [`FetchError::Status`].
    pub async fn get(&self, base_url: &str, path: &str) -> Result<Vec<u8>, FetchError> {
        let url = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
