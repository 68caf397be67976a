//! Network client with built-in retry and error handling

use super::error_handler::ErrorHandler;
use crate::api::MetricsApi;
use crate::api::error::ApiError;
use crate::api::payload::{FetchBody, RequestParams};
use crate::consts::dashboard_consts::fetching;
use crate::logging::LogLevel;
use log::{debug, log};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Retrying decorator around any [`MetricsApi`].
pub struct NetworkClient {
    inner: Arc<dyn MetricsApi>,
    error_handler: ErrorHandler,
    max_retries: u32,
    backoff: Duration,
}

impl NetworkClient {
    pub fn new(inner: Arc<dyn MetricsApi>, max_retries: u32) -> Self {
        Self {
            inner,
            error_handler: ErrorHandler::new(),
            max_retries: max_retries.max(1),
            backoff: fetching::retry_backoff(),
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Get error classification for logging
    pub fn classify_error(&self, error: &ApiError) -> LogLevel {
        self.error_handler.classify_error(error)
    }
}

#[async_trait::async_trait]
impl MetricsApi for NetworkClient {
    /// Fetch with automatic retry on transient failures
    async fn fetch(
        &self,
        endpoint: &str,
        params: &RequestParams,
    ) -> Result<FetchBody, ApiError> {
        let mut attempts = 0;

        loop {
            match self.inner.fetch(endpoint, params).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempts += 1;

                    // Check if we should retry
                    if attempts >= self.max_retries || !self.error_handler.should_retry(&e) {
                        log!(
                            log::Level::from(self.classify_error(&e)),
                            "Giving up on {} after {} attempt(s): {}",
                            endpoint,
                            attempts,
                            e
                        );
                        return Err(e);
                    }
                    debug!(
                        "Fetch of {} failed (attempt {}/{}): {}",
                        endpoint, attempts, self.max_retries, e
                    );
                    sleep(self.backoff).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockMetricsApi;
    use crate::api::payload::RawMetricRow;

    fn unavailable() -> ApiError {
        ApiError::Http {
            status: 503,
            message: "Service Unavailable".to_string(),
        }
    }

    #[tokio::test]
    // Should retry server errors until a success comes back.
    async fn test_retries_until_success() {
        let mut mock = MockMetricsApi::new();
        let mut calls = 0;
        mock.expect_fetch().times(3).returning(move |_, _| {
            calls += 1;
            if calls < 3 {
                Err(unavailable())
            } else {
                Ok(FetchBody::from_rows(vec![RawMetricRow::new("Lead Time")]))
            }
        });

        let client = NetworkClient::new(Arc::new(mock), 3).with_backoff(Duration::ZERO);
        let body = client
            .fetch("v1/metrics/grid", &RequestParams::new())
            .await
            .unwrap();
        assert_eq!(body.rows[0].kpi, "Lead Time");
    }

    #[tokio::test]
    // Should give up after max_retries attempts.
    async fn test_gives_up_after_max_retries() {
        let mut mock = MockMetricsApi::new();
        mock.expect_fetch()
            .times(2)
            .returning(|_, _| Err(unavailable()));

        let client = NetworkClient::new(Arc::new(mock), 2).with_backoff(Duration::ZERO);
        let result = client.fetch("v1/metrics/grid", &RequestParams::new()).await;
        assert!(matches!(result, Err(ApiError::Http { status: 503, .. })));
    }

    #[tokio::test]
    // Client errors are returned immediately.
    async fn test_client_errors_are_not_retried() {
        let mut mock = MockMetricsApi::new();
        mock.expect_fetch().times(1).returning(|_, _| {
            Err(ApiError::Http {
                status: 404,
                message: "Not Found".to_string(),
            })
        });

        let client = NetworkClient::new(Arc::new(mock), 5).with_backoff(Duration::ZERO);
        let result = client.fetch("v1/metrics/grid", &RequestParams::new()).await;
        assert!(result.is_err());
        assert_eq!(client.classify_error(&result.unwrap_err()), LogLevel::Warn);
    }
}
