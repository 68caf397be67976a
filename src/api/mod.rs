use crate::api::error::ApiError;

pub(crate) mod client;
pub use client::MetricsClient;
pub mod error;
pub mod payload;

pub use payload::{FetchBody, MetricValue, RawMetricRow, RequestParams};

#[cfg(test)]
use mockall::{automock, predicate::*};

/// The data-fetch collaborator. Every dashboard request goes through it.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait MetricsApi: Send + Sync {
    /// Fetch `endpoint` (relative to the API root) with the given query
    /// parameters and coerce the envelope into a [`FetchBody`].
    async fn fetch(&self, endpoint: &str, params: &RequestParams)
    -> Result<FetchBody, ApiError>;
}
