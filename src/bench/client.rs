//! Batch endpoint the load controller drives.

use crate::error::Web2MdError;
use crate::output::{BatchRequest, BatchResponse, ConversionResult};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// A service that converts a batch of URLs in one call.
///
/// The controller only needs this one operation, so tests can substitute a
/// scripted endpoint for a running server.
pub trait BatchEndpoint: Send + Sync {
    fn convert_batch(
        &self,
        urls: &[String],
    ) -> impl Future<Output = Result<Vec<ConversionResult>, Web2MdError>> + Send;
}

/// `POST {base}/convert/batch` over HTTP.
pub struct HttpBatchEndpoint {
    client: reqwest::Client,
    batch_url: String,
}

impl HttpBatchEndpoint {
    /// `base_url` is the service root, e.g. `http://localhost:8000`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Web2MdError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Web2MdError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            batch_url: format!("{}/convert/batch", base_url.trim_end_matches('/')),
        })
    }

    /// Endpoint for a service listening on `localhost:port`.
    pub fn for_port(port: u16, timeout: Duration) -> Result<Self, Web2MdError> {
        Self::new(&format!("http://localhost:{port}"), timeout)
    }

    pub fn batch_url(&self) -> &str {
        &self.batch_url
    }

    async fn post(&self, urls: &[String]) -> Result<Vec<ConversionResult>, Web2MdError> {
        let body = BatchRequest {
            urls: urls.to_vec(),
        };
        let response = self
            .client
            .post(&self.batch_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Web2MdError::BenchmarkRequest {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Web2MdError::BenchmarkRequest {
                reason: format!("{} returned HTTP {}", self.batch_url, status.as_u16()),
            });
        }

        let parsed: BatchResponse = response.json().await.map_err(|e| {
            Web2MdError::BenchmarkRequest {
                reason: format!("invalid batch response: {e}"),
            }
        })?;
        debug!("Batch of {} → {} succeeded", urls.len(), parsed.succeeded());
        Ok(parsed.results)
    }
}

impl BatchEndpoint for HttpBatchEndpoint {
    fn convert_batch(
        &self,
        urls: &[String],
    ) -> impl Future<Output = Result<Vec<ConversionResult>, Web2MdError>> + Send {
        self.post(urls)
    }
}
