//! Dashboard state update logic
//!
//! Contains all methods for applying worker completions to the controller

use super::commands::{Command, Completion};
use super::state::{DashboardController, GraphPhase, GridPhase};
use crate::api::error::ApiError;
use crate::api::payload::FetchBody;
use crate::events::{Event, EventType, Source};
use crate::export::{ExportError, ExportNotice, ExportScope, JobId};
use crate::fetch::{FetchError, FetchKey, FetchStatus, RequestHandle};
use crate::logging::LogLevel;
use crate::notifier::{BannerEvent, BannerKind};
use crate::series::{build_series, build_table};
use log::{debug, log};
use std::path::PathBuf;
use std::sync::Arc;

impl DashboardController {
    /// Apply every queued completion in arrival order. Ordering between
    /// requests of one key is enforced by the coordinator, not by arrival.
    pub fn update(&mut self) {
        while let Some(completion) = self.pending_completions.pop_front() {
            match completion {
                Completion::Fetch { handle, result } => self.apply_fetch(handle, result),
                Completion::Export { job_id, result } => self.settle_export(job_id, result),
            }
        }
    }

    fn apply_fetch(&mut self, handle: RequestHandle, result: Result<FetchBody, ApiError>) {
        let outcome = match self.fetches.resolve(&handle, result) {
            Ok(state) => match (state.status, &state.error) {
                (FetchStatus::Failed, Some(error)) => {
                    Err(FetchError::new(handle.key().clone(), Arc::clone(error)))
                }
                _ => Ok(state.data.clone().unwrap_or_default()),
            },
            Err(stale) => {
                debug!("{}", stale);
                self.metric_fetches.remove(&handle.generation());
                return;
            }
        };

        if let Err(error) = &outcome {
            let level = self.classifier.classify_fetch_error(&error.source);
            log!(log::Level::from(level), "{}", error);
        }

        match handle.key() {
            FetchKey::Grid => self.apply_grid(outcome),
            FetchKey::MonthlyGraph => self.apply_graph(outcome),
            FetchKey::MetricExport(kpi) => {
                let kpi = kpi.clone();
                self.apply_metric_payload(handle.generation(), kpi, outcome)
            }
        }
    }

    fn apply_grid(&mut self, outcome: Result<FetchBody, FetchError>) {
        match outcome {
            Ok(body) => {
                self.table = build_table(&body.rows);
                self.grid_scope = self.grid_request_scope.take();
                self.last_refresh = body.last_refresh;
                self.grid_error = None;
                self.grid_phase = GridPhase::Ready;

                let msg = if self.table.is_empty() {
                    "No data for the selected filters".to_string()
                } else {
                    format!("Loaded {} rows", self.table.rows.len())
                };
                self.add_to_activity_log(Event::success(Source::Grid, msg));
            }
            Err(error) => {
                // Prior rows and their scope stay on screen
                let level = self.classifier.classify_fetch_error(&error.source);
                self.add_to_activity_log(Event::error(Source::Grid, error.to_string(), level));
                self.grid_request_scope = None;
                self.grid_error = Some(error);
                self.grid_phase = GridPhase::Failed;
            }
        }
    }

    fn apply_graph(&mut self, outcome: Result<FetchBody, FetchError>) {
        let Some(graph) = self.graph.as_mut() else {
            debug!("Monthly data arrived after the graph closed");
            return;
        };

        let event = match outcome {
            Ok(body) => {
                let series = build_series(&body.rows, graph.mode);
                let event = Event::success(
                    Source::MonthlyGraph,
                    format!(
                        "Built {} and {} series for {}",
                        series.monthly[0].name, series.monthly[1].name, graph.kpi
                    ),
                );
                graph.series = Some(series);
                self.graph_error = None;
                self.graph_phase = GraphPhase::GraphReady;
                event
            }
            Err(error) => {
                let level = self.classifier.classify_fetch_error(&error.source);
                let event = Event::error(Source::MonthlyGraph, error.to_string(), level);
                self.graph_error = Some(error);
                self.graph_phase = GraphPhase::GraphFailed;
                event
            }
        };
        self.add_to_activity_log(event);
    }

    fn apply_metric_payload(
        &mut self,
        generation: u64,
        kpi: String,
        outcome: Result<FetchBody, FetchError>,
    ) {
        let Some(job_id) = self.metric_fetches.remove(&generation) else {
            debug!("No export job waiting for {} payload", kpi);
            return;
        };

        match outcome {
            Ok(body) => match self.exports.metric_payload_ready(job_id, &body) {
                Some(command) => {
                    self.add_to_activity_log(Event::new(
                        Source::MetricExport(kpi),
                        format!("Writing {} rows to {}", command.table.len(), command.filename),
                        EventType::Refresh,
                        LogLevel::Info,
                    ));
                    self.outbox.push_back(Command::Export(command));
                }
                None => debug!("Export job {} no longer running", job_id),
            },
            Err(error) => self.settle_export(job_id, Err(ExportError::Fetch(error.source))),
        }
    }

    fn settle_export(&mut self, job_id: JobId, result: Result<PathBuf, ExportError>) {
        let Some(job) = self.exports.job(job_id) else {
            debug!("Export {} is unknown", job_id);
            return;
        };
        let was_grid = job.scope.is_grid();
        let source = match &job.scope {
            ExportScope::Grid(_) => Source::GridExport,
            ExportScope::Metric { kpi, .. } => Source::MetricExport(kpi.clone()),
        };
        let event = match &result {
            Ok(path) => Event::success(source, format!("Saved {}", path.display())),
            Err(e) => Event::error(
                source,
                format!("Export failed: {}", e),
                self.classifier.classify_export_error(e),
            ),
        };

        if self.exports.settle(job_id, result).is_none() {
            debug!("Export {} already settled", job_id);
            return;
        }
        self.add_to_activity_log(event);

        let banners = match self.exports.notice() {
            Some(ExportNotice::Complete { .. }) => {
                Some((BannerKind::DownloadSuccess, BannerKind::DownloadError))
            }
            Some(ExportNotice::Error { .. }) => {
                Some((BannerKind::DownloadError, BannerKind::DownloadSuccess))
            }
            None => None,
        };
        if let Some((shown, hidden)) = banners {
            self.notifier.notify(BannerEvent::hide(hidden));
            self.notifier.notify(BannerEvent::show(shown));
        }

        if was_grid && self.refetch_deferred && !self.exports.is_downloading() {
            self.refetch_deferred = false;
            self.add_to_activity_log(Event::refresh(
                Source::Filter,
                "Applying filter change deferred by the export",
            ));
            self.refresh();
        }
    }
}
