//! Per-key request bookkeeping.
//!
//! Every request gets a generation number. Only the newest generation of a
//! key may settle it; anything older is reported as
//! [`StaleResponseDiscarded`] and leaves state untouched. Results are
//! therefore applied in issuance order, whatever order they arrive in.

use crate::api::error::ApiError;
use crate::api::payload::{FetchBody, RequestParams};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use thiserror::Error;

/// Logical data source tracked by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FetchKey {
    Grid,
    MonthlyGraph,
    /// Export payload of a single KPI row.
    MetricExport(String),
}

impl FetchKey {
    /// Whether the key feeds the visible grid/graph (as opposed to a row export).
    pub fn is_view_data(&self) -> bool {
        matches!(self, FetchKey::Grid | FetchKey::MonthlyGraph)
    }
}

impl Display for FetchKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchKey::Grid => write!(f, "grid"),
            FetchKey::MonthlyGraph => write!(f, "monthly-graph"),
            FetchKey::MetricExport(kpi) => write!(f, "metric-export[{}]", kpi),
        }
    }
}

/// Identifies one issued request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestHandle {
    key: FetchKey,
    generation: u64,
}

impl RequestHandle {
    pub fn key(&self) -> &FetchKey {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// State of one key. `data` holds the last successful body: it survives a
/// new request and a failure so a refresh never blanks a working view.
#[derive(Debug, Clone, Default)]
pub struct FetchRequestState {
    pub status: FetchStatus,
    pub data: Option<FetchBody>,
    pub error: Option<Arc<ApiError>>,
    generation: u64,
}

impl FetchRequestState {
    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("discarded stale response for {key} (generation {generation})")]
pub struct StaleResponseDiscarded {
    pub key: FetchKey,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct FetchCoordinator {
    states: HashMap<FetchKey, FetchRequestState>,
    // Shared across keys so a handle is never reused, even after `cancel`.
    next_generation: u64,
}

impl FetchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a request for `key`, superseding any request still in flight.
    pub fn request(&mut self, key: FetchKey, params: RequestParams) -> RequestHandle {
        self.next_generation += 1;
        let generation = self.next_generation;

        let state = self.states.entry(key.clone()).or_default();
        state.status = FetchStatus::Loading;
        state.error = None;
        state.generation = generation;

        RequestHandle { key, generation }
    }

    /// Apply the result of `handle`. Outdated handles are no-ops.
    pub fn resolve(
        &mut self,
        handle: &RequestHandle,
        result: Result<FetchBody, ApiError>,
    ) -> Result<&FetchRequestState, StaleResponseDiscarded> {
        let stale = || StaleResponseDiscarded {
            key: handle.key.clone(),
            generation: handle.generation,
        };

        let state = self.states.get_mut(&handle.key).ok_or_else(stale)?;
        if state.generation != handle.generation || state.status != FetchStatus::Loading {
            return Err(stale());
        }

        match result {
            Ok(body) => {
                state.status = FetchStatus::Succeeded;
                state.data = Some(body);
                state.error = None;
            }
            Err(e) => {
                state.status = FetchStatus::Failed;
                state.error = Some(Arc::new(e));
            }
        }
        Ok(state)
    }

    /// Drop everything known about `key`; in-flight results become stale.
    pub fn cancel(&mut self, key: &FetchKey) {
        self.states.remove(key);
    }

    pub fn status(&self, key: &FetchKey) -> FetchRequestState {
        self.states.get(key).cloned().unwrap_or_default()
    }

    pub fn is_loading(&self, key: &FetchKey) -> bool {
        self.states.get(key).is_some_and(FetchRequestState::is_loading)
    }

    pub fn is_any_loading(&self) -> bool {
        self.is_loading_where(|_| true)
    }

    pub fn is_loading_where(&self, mut filter: impl FnMut(&FetchKey) -> bool) -> bool {
        self.states
            .iter()
            .any(|(key, state)| state.is_loading() && filter(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::payload::RawMetricRow;

    fn body(kpi: &str) -> FetchBody {
        FetchBody::from_rows(vec![RawMetricRow::new(kpi)])
    }

    fn server_error() -> ApiError {
        ApiError::Http {
            status: 500,
            message: "Internal Server Error".to_string(),
        }
    }

    fn params(vp: &str) -> RequestParams {
        RequestParams::new().with("vp", vp)
    }

    #[test]
    fn test_newer_request_wins_when_older_resolves_last() {
        let mut coordinator = FetchCoordinator::new();
        let first = coordinator.request(FetchKey::Grid, params("VP1"));
        let second = coordinator.request(FetchKey::Grid, params("VP2"));

        assert!(coordinator.resolve(&second, Ok(body("second"))).is_ok());
        let stale = coordinator.resolve(&first, Ok(body("first"))).unwrap_err();
        assert_eq!(stale.key, FetchKey::Grid);

        let state = coordinator.status(&FetchKey::Grid);
        assert_eq!(state.status, FetchStatus::Succeeded);
        assert_eq!(state.data.unwrap().rows[0].kpi, "second");
    }

    #[test]
    fn test_newer_request_wins_when_older_resolves_first() {
        let mut coordinator = FetchCoordinator::new();
        let first = coordinator.request(FetchKey::Grid, params("VP1"));
        let second = coordinator.request(FetchKey::Grid, params("VP2"));

        assert!(coordinator.resolve(&first, Ok(body("first"))).is_err());
        // The superseded result must not have ended the loading state
        assert!(coordinator.is_loading(&FetchKey::Grid));

        coordinator.resolve(&second, Ok(body("second"))).unwrap();
        let state = coordinator.status(&FetchKey::Grid);
        assert_eq!(state.data.unwrap().rows[0].kpi, "second");
    }

    #[test]
    fn test_a_handle_settles_only_once() {
        let mut coordinator = FetchCoordinator::new();
        let handle = coordinator.request(FetchKey::Grid, params("VP1"));
        coordinator.resolve(&handle, Ok(body("a"))).unwrap();
        assert!(coordinator.resolve(&handle, Err(server_error())).is_err());
        assert_eq!(
            coordinator.status(&FetchKey::Grid).status,
            FetchStatus::Succeeded
        );
    }

    #[test]
    fn test_failure_keeps_last_good_data() {
        let mut coordinator = FetchCoordinator::new();
        let ok = coordinator.request(FetchKey::Grid, params("VP1"));
        coordinator.resolve(&ok, Ok(body("kept"))).unwrap();

        let failing = coordinator.request(FetchKey::Grid, params("VP2"));
        let state = coordinator.resolve(&failing, Err(server_error())).unwrap();
        assert_eq!(state.status, FetchStatus::Failed);
        assert!(state.error.is_some());
        assert_eq!(state.data.as_ref().unwrap().rows[0].kpi, "kept");
    }

    #[test]
    fn test_failure_does_not_touch_siblings() {
        let mut coordinator = FetchCoordinator::new();
        let grid = coordinator.request(FetchKey::Grid, params("VP1"));
        let graph = coordinator.request(FetchKey::MonthlyGraph, params("VP1"));
        assert!(coordinator.is_any_loading());

        coordinator.resolve(&grid, Err(server_error())).unwrap();
        assert!(coordinator.is_loading(&FetchKey::MonthlyGraph));
        assert!(coordinator.is_any_loading());

        coordinator.resolve(&graph, Ok(body("trend"))).unwrap();
        assert!(!coordinator.is_any_loading());
        assert_eq!(
            coordinator.status(&FetchKey::MonthlyGraph).status,
            FetchStatus::Succeeded
        );
    }

    #[test]
    fn test_cancel_turns_in_flight_result_stale() {
        let mut coordinator = FetchCoordinator::new();
        let handle = coordinator.request(FetchKey::MonthlyGraph, params("VP1"));
        coordinator.cancel(&FetchKey::MonthlyGraph);
        assert!(coordinator.resolve(&handle, Ok(body("late"))).is_err());
        assert_eq!(
            coordinator.status(&FetchKey::MonthlyGraph).status,
            FetchStatus::Idle
        );

        // A fresh request after cancel never collides with the old handle
        let fresh = coordinator.request(FetchKey::MonthlyGraph, params("VP1"));
        assert_ne!(fresh.generation(), handle.generation());
    }

    #[test]
    fn test_loading_filter_excludes_row_exports() {
        let mut coordinator = FetchCoordinator::new();
        coordinator.request(FetchKey::MetricExport("Lead Time".into()), params("VP1"));
        assert!(coordinator.is_any_loading());
        assert!(!coordinator.is_loading_where(FetchKey::is_view_data));
    }

    #[test]
    fn test_unknown_key_is_idle() {
        let coordinator = FetchCoordinator::new();
        let state = coordinator.status(&FetchKey::Grid);
        assert_eq!(state.status, FetchStatus::Idle);
        assert!(state.data.is_none());
    }
}
