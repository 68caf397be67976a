pub mod coordinator;

pub use coordinator::{
    FetchCoordinator, FetchKey, FetchRequestState, FetchStatus, RequestHandle,
    StaleResponseDiscarded,
};

use crate::api::error::ApiError;
use std::sync::Arc;
use thiserror::Error;

/// A failed fetch, tagged with the data source it was issued for.
#[derive(Debug, Clone, Error)]
#[error("{key} fetch failed: {source}")]
pub struct FetchError {
    pub key: FetchKey,
    #[source]
    pub source: Arc<ApiError>,
}

impl FetchError {
    pub fn new(key: FetchKey, source: Arc<ApiError>) -> Self {
        Self { key, source }
    }
}
