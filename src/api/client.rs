//! Metrics API Client
//!
//! Thin `reqwest` client for the metrics backend. Responses are JSON envelopes
//! of the form `{ "body": ... }`.

use crate::api::MetricsApi;
use crate::api::error::ApiError;
use crate::api::payload::{FetchBody, RequestParams};
use reqwest::{Client, ClientBuilder, Response};
use serde_json::Value;
use std::time::Duration;

// Build timestamp in milliseconds since epoch
const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP", "Build timestamp not available");

// User-Agent string with CLI version
const USER_AGENT: &str = concat!("metrics-dashboard/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct MetricsClient {
    client: Client,
    api_root: String,
}

impl MetricsClient {
    pub fn new(api_root: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            client: ClientBuilder::new()
                .connect_timeout(Duration::from_secs(10))
                .timeout(timeout)
                .build()?,
            api_root: api_root.into(),
        })
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.api_root.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    async fn handle_response_status(response: Response) -> Result<Response, ApiError> {
        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }
        Ok(response)
    }

    async fn get_request(&self, endpoint: &str, params: &RequestParams) -> Result<Value, ApiError> {
        let url = self.build_url(endpoint);
        let response = self
            .client
            .get(&url)
            .query(params.as_pairs())
            .header("User-Agent", USER_AGENT)
            .header("X-Build-Timestamp", BUILD_TIMESTAMP)
            .header("X-Request-Id", uuid::Uuid::new_v4().to_string())
            .send()
            .await?;

        let response = Self::handle_response_status(response).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait::async_trait]
impl MetricsApi for MetricsClient {
    async fn fetch(
        &self,
        endpoint: &str,
        params: &RequestParams,
    ) -> Result<FetchBody, ApiError> {
        let envelope = self.get_request(endpoint, params).await?;
        Ok(FetchBody::from_json(&envelope))
    }
}

#[cfg(test)]
/// These are ignored by default since they require a live metrics backend.
mod live_backend_tests {
    use crate::api::MetricsApi;
    use crate::api::payload::RequestParams;
    use crate::environment::Environment;
    use std::time::Duration;

    #[tokio::test]
    #[ignore] // This test requires a live metrics backend.
    /// Should return grid rows for a VP.
    async fn test_fetch_grid() {
        let client = super::MetricsClient::new(
            Environment::Local.api_root(),
            Duration::from_secs(10),
        )
        .unwrap();
        let params = RequestParams::new().with("vp", "VP1");
        match client.fetch("v1/metrics/grid", &params).await {
            Ok(body) => println!("Got {} rows", body.rows.len()),
            Err(e) => panic!("Failed to fetch grid: {}", e),
        }
    }
}
