//! Host bridge over HTTP.
//!
//! The host answers `GET {base}/query?request=<request string>` with the
//! document for a dataset key, or acknowledges a host command.

use async_trait::async_trait;
use reqwest::Client;

use super::{DatasetKey, FeatureSource, HostCommand};
use crate::error::FetchError;

#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
    client: Client,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn query(&self, key: &str, request: &str) -> Result<String, FetchError> {
        let url = format!("{}/query", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("request", request)])
            .send()
            .await
            .map_err(|e| FetchError::new(key, FetchError::TRANSPORT, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::new(key, FetchError::TRANSPORT, e.to_string()))?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(FetchError::new(key, i32::from(status.as_u16()), body))
        }
    }
}

#[async_trait]
impl FeatureSource for HttpSource {
    async fn fetch(&self, key: DatasetKey) -> Result<String, FetchError> {
        tracing::debug!("Fetching {} from {}", key, self.base_url);
        self.query(key.as_str(), key.as_str()).await
    }

    async fn dispatch(&self, command: &HostCommand) -> Result<(), FetchError> {
        let request = command.request_string();
        let key = request.split(',').next().unwrap_or_default().to_string();
        self.query(&key, &request).await.map(|_| ())
    }
}
