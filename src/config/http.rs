use crate::domain::ports::Storage;
use crate::utils::error::LoadError;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Fetches artifacts from an http(s) URL, e.g. a model registry.
#[derive(Debug, Clone)]
pub struct HttpStorage {
    client: Client,
    timeout: Option<Duration>,
}

impl HttpStorage {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for HttpStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for HttpStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, LoadError> {
        let unavailable = |reason: String| LoadError::Unavailable {
            location: path.to_string(),
            reason,
        };

        let mut request = self.client.get(path);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        tracing::debug!("Fetching artifact from: {}", path);
        let response = request.send().await.map_err(|e| unavailable(e.to_string()))?;
        tracing::debug!("Artifact response status: {}", response.status());

        match response.status() {
            StatusCode::NOT_FOUND => Err(LoadError::NotFound {
                location: path.to_string(),
            }),
            status if status.is_success() => response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| unavailable(e.to_string())),
            status => Err(unavailable(format!("HTTP {}", status))),
        }
    }
}
