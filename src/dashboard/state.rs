//! Dashboard state management
//!
//! Contains the controller struct and its phase enums

use super::commands::{Command, Completion};
use crate::api::payload::LastRefresh;
use crate::config::Config;
use crate::consts::dashboard_consts::MAX_ACTIVITY_LOGS;
use crate::error_classifier::ErrorClassifier;
use crate::events::Event;
use crate::export::{EndpointResolver, ExportController, ExportNotice, JobId};
use crate::fetch::{FetchCoordinator, FetchError, FetchKey};
use crate::filter::{FilterSelection, FilterState, RequiredLevel};
use crate::notifier::Notifier;
use crate::series::{GraphSeries, SeriesMode, TableView};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, strum::Display)]
pub enum GridPhase {
    #[default]
    Idle,
    FetchingGrid,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, strum::Display)]
pub enum GraphPhase {
    #[default]
    Closed,
    FetchingGraph,
    GraphReady,
    GraphFailed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, strum::Display)]
pub enum ExportPhase {
    #[default]
    Idle,
    Exporting,
    ExportDone,
    ExportError,
}

/// Static knobs of one dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSettings {
    pub required_level: RequiredLevel,
    pub grid_endpoint: String,
    pub monthly_trend_endpoint: String,
    pub grid_export_filename: String,
}

impl DashboardSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            required_level: config.required_level(),
            grid_endpoint: config.endpoints.grid.clone(),
            monthly_trend_endpoint: config.endpoints.monthly_trend.clone(),
            grid_export_filename: config.grid_export_filename.clone(),
        }
    }
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// The monthly graph popup while it is open.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenGraph {
    pub kpi: String,
    pub mode: SeriesMode,
    /// Last successfully built series, kept across failed refreshes.
    pub series: Option<GraphSeries>,
}

/// Orchestrates filters, fetches, derived data and exports for one dashboard.
///
/// Plain state machine: handlers mutate state and queue [`Command`]s,
/// [`Completion`]s are queued with [`add_completion`](Self::add_completion)
/// and applied by [`update`](Self::update).
pub struct DashboardController {
    pub(super) settings: DashboardSettings,
    pub(super) filter: FilterState,
    pub(super) fetches: FetchCoordinator,
    pub(super) exports: ExportController,
    pub(super) endpoint_resolver: Arc<dyn EndpointResolver>,
    pub(super) notifier: Arc<dyn Notifier>,
    pub(super) classifier: ErrorClassifier,

    pub(super) mounted: bool,
    pub(super) grid_phase: GridPhase,
    pub(super) graph_phase: GraphPhase,

    /// Table of the last successful grid fetch.
    pub(super) table: TableView,
    /// Selection that produced `table`.
    pub(super) grid_scope: Option<FilterSelection>,
    /// Selection of the grid request in flight.
    pub(super) grid_request_scope: Option<FilterSelection>,
    pub(super) last_refresh: Option<LastRefresh>,
    pub(super) grid_error: Option<FetchError>,

    pub(super) graph: Option<OpenGraph>,
    pub(super) graph_error: Option<FetchError>,

    /// Row export jobs waiting on their payload fetch, by fetch generation.
    pub(super) metric_fetches: HashMap<u64, JobId>,
    /// A filter change arrived while the grid export was running.
    pub(super) refetch_deferred: bool,

    /// Number of user actions applied so far.
    pub(super) actions_applied: u64,

    /// Queue of completions waiting to be processed
    pub(super) pending_completions: VecDeque<Completion>,
    /// Commands waiting to be picked up by the runtime
    pub(super) outbox: VecDeque<Command>,
    /// Activity logs for display
    pub(super) activity_logs: VecDeque<Event>,
}

impl DashboardController {
    pub fn new(
        settings: DashboardSettings,
        endpoint_resolver: Arc<dyn EndpointResolver>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            settings,
            filter: FilterState::new(),
            fetches: FetchCoordinator::new(),
            exports: ExportController::new(),
            endpoint_resolver,
            notifier,
            classifier: ErrorClassifier::new(),
            mounted: false,
            grid_phase: GridPhase::Idle,
            graph_phase: GraphPhase::Closed,
            table: TableView::default(),
            grid_scope: None,
            grid_request_scope: None,
            last_refresh: None,
            grid_error: None,
            graph: None,
            graph_error: None,
            metric_fetches: HashMap::new(),
            refetch_deferred: false,
            actions_applied: 0,
            pending_completions: VecDeque::new(),
            outbox: VecDeque::new(),
            activity_logs: VecDeque::new(),
        }
    }

    pub fn selection(&self) -> &FilterSelection {
        self.filter.selection()
    }

    pub fn grid_phase(&self) -> GridPhase {
        self.grid_phase
    }

    pub fn graph_phase(&self) -> GraphPhase {
        self.graph_phase
    }

    pub fn export_phase(&self) -> ExportPhase {
        if self.exports.is_downloading() || self.exports.is_metric_downloading() {
            return ExportPhase::Exporting;
        }
        match self.exports.notice() {
            Some(ExportNotice::Complete { .. }) => ExportPhase::ExportDone,
            Some(ExportNotice::Error { .. }) => ExportPhase::ExportError,
            None => ExportPhase::Idle,
        }
    }

    pub fn table(&self) -> &TableView {
        &self.table
    }

    pub fn fetches(&self) -> &FetchCoordinator {
        &self.fetches
    }

    pub fn exports(&self) -> &ExportController {
        &self.exports
    }

    pub fn activity_logs(&self) -> &VecDeque<Event> {
        &self.activity_logs
    }

    pub fn is_refetch_deferred(&self) -> bool {
        self.refetch_deferred
    }

    /// Grid or graph data is loading. Row export payloads do not count.
    pub fn is_view_loading(&self) -> bool {
        self.fetches.is_loading_where(FetchKey::is_view_data)
    }

    /// Add an event to activity logs with size limit
    pub fn add_to_activity_log(&mut self, event: Event) {
        if self.activity_logs.len() >= MAX_ACTIVITY_LOGS {
            self.activity_logs.pop_front();
        }
        self.activity_logs.push_back(event);
    }

    /// Add a completion to the processing queue
    pub fn add_completion(&mut self, completion: Completion) {
        self.pending_completions.push_back(completion);
    }

    /// Hand queued side effects to the caller.
    pub fn take_commands(&mut self) -> Vec<Command> {
        self.outbox.drain(..).collect()
    }
}
