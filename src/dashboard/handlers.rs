//! User action handlers
//!
//! Every handler mutates the controller synchronously and queues the
//! commands it needs; nothing here awaits.

use super::commands::{Action, Command, FetchCommand};
use super::state::{DashboardController, GraphPhase, GridPhase, OpenGraph};
use crate::events::{Event, EventType, Source};
use crate::export::{ExportError, ExportGate, ExportRefused, JobId};
use crate::fetch::FetchKey;
use crate::filter::{FilterSelection, ValidationError};
use crate::logging::LogLevel;
use crate::notifier::{BannerEvent, BannerKind};
use crate::series::{GraphPayload, SeriesMode};
use log::debug;
use thiserror::Error;

/// Why an action had no effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Export(#[from] ExportRefused),
}

impl DashboardController {
    /// Reset the shell banners and load the baseline grid. Runs once.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        for kind in BannerKind::ALL {
            self.notifier.notify(BannerEvent::hide(kind));
        }
        self.refresh();
    }

    /// Dispatch a user action. Rejections are logged here and returned for
    /// callers that care; they never change state.
    pub fn apply(&mut self, action: Action) -> Result<(), ActionError> {
        self.actions_applied += 1;
        let result = match action {
            Action::SetVp(vp) => self.set_vp(vp).map_err(ActionError::from),
            Action::SetDirector(director) => self.set_director(director).map_err(ActionError::from),
            Action::SetTeam(team) => self.set_team(team).map_err(ActionError::from),
            Action::SetMonthly(monthly) => {
                self.set_monthly(monthly);
                Ok(())
            }
            Action::Reset => {
                self.reset();
                Ok(())
            }
            Action::ExportGrid => self.export_grid().map(|_| ()).map_err(ActionError::from),
            Action::ExportMetricRow(kpi) => self
                .export_metric_row(&kpi)
                .map(|_| ())
                .map_err(ActionError::from),
            Action::OpenGraph { kpi, mode } => {
                self.open_graph(kpi, mode);
                Ok(())
            }
            Action::SetGraphMode(mode) => {
                self.set_graph_mode(mode);
                Ok(())
            }
            Action::CloseGraph => {
                self.close_graph();
                Ok(())
            }
            Action::DismissNotice => {
                self.dismiss_notice();
                Ok(())
            }
        };

        if let Err(e) = &result {
            let (source, level) = match e {
                ActionError::Invalid(_) => (Source::Filter, LogLevel::Debug),
                ActionError::Export(ExportRefused::EndpointNotFound(kpi)) => {
                    let error = ExportError::EndpointNotFound(kpi.clone());
                    (
                        Source::MetricExport(kpi.clone()),
                        self.classifier.classify_export_error(&error),
                    )
                }
                ActionError::Export(_) => (Source::GridExport, LogLevel::Debug),
            };
            debug!("Ignoring action: {}", e);
            self.add_to_activity_log(Event::error(source, format!("Ignored: {}", e), level));
        }
        result
    }

    pub fn set_vp(&mut self, vp: impl Into<String>) -> Result<(), ValidationError> {
        self.filter.set_vp(vp)?;
        self.filter_changed();
        Ok(())
    }

    pub fn set_director(&mut self, director: Option<String>) -> Result<(), ValidationError> {
        self.filter.set_director(director)?;
        self.filter_changed();
        Ok(())
    }

    pub fn set_team(&mut self, team: Option<String>) -> Result<(), ValidationError> {
        self.filter.set_team(team)?;
        self.filter_changed();
        Ok(())
    }

    pub fn set_monthly(&mut self, monthly: bool) {
        if self.filter.selection().monthly == monthly {
            return;
        }
        self.filter.set_monthly_toggle(monthly);
        self.filter_changed();
    }

    pub fn reset(&mut self) {
        self.filter.reset();
        self.filter_changed();
    }

    /// Export the visible grid rows. Ignored unless the export button is
    /// enabled and no grid export is running.
    pub fn export_grid(&mut self) -> Result<JobId, ExportRefused> {
        let selection = self.filter.selection().clone();
        let gate = ExportGate {
            loading: self.is_view_loading(),
            selection: &selection,
            required: self.settings.required_level,
            has_rows: !self.table.is_empty(),
        };
        // The rows on screen belong to the selection that fetched them
        let scope = self.grid_scope.clone().unwrap_or_else(|| selection.clone());
        let command = self.exports.export_grid(
            &gate,
            &scope,
            &self.table,
            &self.settings.grid_export_filename,
        )?;

        let job_id = command.job_id;
        self.add_to_activity_log(Event::new(
            Source::GridExport,
            format!("Exporting {} rows to {}", command.table.len(), command.filename),
            EventType::Refresh,
            LogLevel::Info,
        ));
        self.outbox.push_back(Command::Export(command));
        Ok(job_id)
    }

    /// Export one KPI row through its dedicated endpoint.
    pub fn export_metric_row(&mut self, kpi: &str) -> Result<JobId, ExportRefused> {
        let selection = self.filter.selection().clone();
        let plan =
            self.exports
                .export_metric_row(kpi, &selection, self.endpoint_resolver.as_ref())?;

        let handle = self.fetches.request(
            FetchKey::MetricExport(plan.kpi.clone()),
            plan.params.clone(),
        );
        self.metric_fetches.insert(handle.generation(), plan.job_id);
        self.add_to_activity_log(Event::new(
            Source::MetricExport(plan.kpi.clone()),
            format!("Fetching export data from {}", plan.endpoint),
            EventType::Refresh,
            LogLevel::Info,
        ));
        self.outbox.push_back(Command::Fetch(FetchCommand {
            handle,
            endpoint: plan.endpoint,
            params: plan.params,
        }));
        Ok(plan.job_id)
    }

    /// Open the monthly trend popup for `kpi`. Independent of the grid.
    pub fn open_graph(&mut self, kpi: impl Into<String>, mode: SeriesMode) {
        let kpi = kpi.into();
        self.graph = Some(OpenGraph {
            kpi: kpi.clone(),
            mode,
            series: None,
        });
        self.graph_error = None;
        self.issue_graph_fetch(&kpi);
    }

    pub fn set_graph_mode(&mut self, mode: SeriesMode) {
        if let Some(graph) = self.graph.as_mut() {
            graph.mode = mode;
            if let Some(series) = graph.series.as_mut() {
                series.mode = mode;
            }
        }
    }

    /// Close the popup. Whatever the popup held, the owner gets the reset
    /// payload and any in-flight monthly fetch becomes stale.
    pub fn close_graph(&mut self) -> GraphPayload {
        self.fetches.cancel(&FetchKey::MonthlyGraph);
        self.graph = None;
        self.graph_error = None;
        self.graph_phase = GraphPhase::Closed;
        GraphPayload::closed()
    }

    pub fn dismiss_notice(&mut self) {
        self.exports.dismiss_notice();
        self.notifier
            .notify(BannerEvent::hide(BannerKind::DownloadSuccess));
        self.notifier
            .notify(BannerEvent::hide(BannerKind::DownloadError));
    }

    fn filter_changed(&mut self) {
        let selection = self.filter.selection().clone();
        self.add_to_activity_log(Event::state_change(
            Source::Filter,
            describe_selection(&selection),
        ));

        if self.exports.is_downloading() {
            self.refetch_deferred = true;
            self.add_to_activity_log(Event::new(
                Source::Filter,
                "Refresh deferred until the running export finishes",
                EventType::Waiting,
                LogLevel::Info,
            ));
            return;
        }
        self.refresh();
    }

    /// Refetch everything on screen for the current selection.
    pub(super) fn refresh(&mut self) {
        self.issue_grid_fetch();
        if let Some(kpi) = self.graph.as_ref().map(|graph| graph.kpi.clone()) {
            self.issue_graph_fetch(&kpi);
        }
    }

    fn issue_grid_fetch(&mut self) {
        let selection = self.filter.selection().clone();
        let params = selection.to_params();
        let handle = self.fetches.request(FetchKey::Grid, params.clone());

        self.grid_request_scope = Some(selection);
        self.grid_phase = GridPhase::FetchingGrid;
        self.add_to_activity_log(Event::refresh(
            Source::Grid,
            format!("Fetching grid data (generation {})", handle.generation()),
        ));
        self.outbox.push_back(Command::Fetch(FetchCommand {
            handle,
            endpoint: self.settings.grid_endpoint.clone(),
            params,
        }));
    }

    fn issue_graph_fetch(&mut self, kpi: &str) {
        let mut params = self.filter.selection().to_params();
        params.push("kpi", kpi);
        let handle = self.fetches.request(FetchKey::MonthlyGraph, params.clone());

        self.graph_phase = GraphPhase::FetchingGraph;
        self.add_to_activity_log(Event::refresh(
            Source::MonthlyGraph,
            format!("Fetching monthly trend for {}", kpi),
        ));
        self.outbox.push_back(Command::Fetch(FetchCommand {
            handle,
            endpoint: self.settings.monthly_trend_endpoint.clone(),
            params,
        }));
    }
}

fn describe_selection(selection: &FilterSelection) -> String {
    if selection.is_baseline() {
        return "Filters reset".to_string();
    }
    let levels = [
        ("vp", &selection.vp),
        ("director", &selection.director),
        ("team", &selection.team),
    ];
    let mut parts: Vec<String> = levels
        .iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| format!("{}={}", name, v)))
        .collect();
    if selection.monthly {
        parts.push("monthly".to_string());
    }
    format!("Filters changed: {}", parts.join(", "))
}
