//! Single-flight export bookkeeping.
//!
//! # Job lifecycle
//! ```text
//! trigger → Running ─┬─ CSV written   → Done   (notice: Complete)
//!                    └─ fetch/io fail → Failed (notice: Error)
//! ```
//! A scope with a Running job refuses further triggers. Settled jobs leave
//! the running set at once, so a retry is always possible afterwards.

use super::csv_writer::CsvTable;
use super::resolver::EndpointResolver;
use super::{ExportError, ExportJob, ExportNotice, ExportScope, ExportStatus, JobId};
use crate::api::payload::{FetchBody, RequestParams};
use crate::filter::{FilterSelection, RequiredLevel, ValidationError};
use crate::series::TableView;
use log::{debug, info};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportRefused {
    #[error(transparent)]
    Disabled(#[from] ValidationError),

    #[error("an export for this scope is already running ({0})")]
    AlreadyRunning(JobId),

    #[error("no export endpoint for KPI '{0}'")]
    EndpointNotFound(String),
}

/// Everything the grid export button depends on.
#[derive(Debug, Clone, Copy)]
pub struct ExportGate<'a> {
    pub loading: bool,
    pub selection: &'a FilterSelection,
    pub required: RequiredLevel,
    pub has_rows: bool,
}

impl ExportGate<'_> {
    /// `Ok` exactly when the grid export trigger is enabled.
    pub fn check(&self) -> Result<(), ValidationError> {
        if self.loading {
            return Err(ValidationError::ExportDisabled("data is loading"));
        }
        if self.selection.is_baseline() {
            return Err(ValidationError::ExportDisabled("no filter selected"));
        }
        if !self.selection.has_level(self.required) {
            return Err(ValidationError::ExportDisabled("required filter missing"));
        }
        if !self.has_rows {
            return Err(ValidationError::ExportDisabled("nothing to export"));
        }
        Ok(())
    }
}

/// A CSV write to perform off the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportCommand {
    pub job_id: JobId,
    pub table: CsvTable,
    pub filename: String,
}

/// First step of a row export: fetch the KPI's export payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricExportPlan {
    pub job_id: JobId,
    pub kpi: String,
    pub endpoint: String,
    pub params: RequestParams,
}

#[derive(Debug, Default)]
pub struct ExportController {
    running: HashMap<ExportScope, ExportJob>,
    last_settled: Option<ExportJob>,
    notice: Option<ExportNotice>,
}

impl ExportController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a grid export of `rows`, scoped to `scope` (the selection that
    /// produced the rows).
    pub fn export_grid(
        &mut self,
        gate: &ExportGate<'_>,
        scope: &FilterSelection,
        rows: &TableView,
        filename: &str,
    ) -> Result<ExportCommand, ExportRefused> {
        gate.check()?;
        let scope = ExportScope::Grid(scope.clone());
        let job_id = self.start(scope, filename)?;

        Ok(ExportCommand {
            job_id,
            table: CsvTable::from_table(rows),
            filename: filename.to_string(),
        })
    }

    /// Start the export of a single KPI row. Independent of the grid export.
    /// One row export per KPI, whatever selection the running one was
    /// started under: both would share the KPI's payload fetch.
    pub fn export_metric_row(
        &mut self,
        kpi: &str,
        selection: &FilterSelection,
        endpoint_resolver: &dyn EndpointResolver,
    ) -> Result<MetricExportPlan, ExportRefused> {
        let endpoint = endpoint_resolver
            .find_metric_endpoint(kpi)
            .ok_or_else(|| ExportRefused::EndpointNotFound(kpi.to_string()))?;
        if let Some(job) = self.running_metric_job(kpi) {
            debug!("Ignoring export of {}, job {} still running", kpi, job.id);
            return Err(ExportRefused::AlreadyRunning(job.id));
        }

        let scope = ExportScope::Metric {
            kpi: kpi.to_string(),
            selection: selection.clone(),
        };
        let job_id = self.start(scope, &metric_filename(kpi))?;

        let mut params = selection.to_params();
        params.push("kpi", kpi);
        Ok(MetricExportPlan {
            job_id,
            kpi: kpi.to_string(),
            endpoint,
            params,
        })
    }

    /// The payload of a row export arrived; turn it into a CSV write.
    pub fn metric_payload_ready(&self, job_id: JobId, body: &FetchBody) -> Option<ExportCommand> {
        let job = self.running_job(job_id)?;
        Some(ExportCommand {
            job_id,
            table: CsvTable::from_rows(&body.rows),
            filename: job.filename.clone(),
        })
    }

    /// Settle a running job. Unknown ids (already settled) return `None`.
    pub fn settle(
        &mut self,
        job_id: JobId,
        result: Result<PathBuf, ExportError>,
    ) -> Option<&ExportJob> {
        let scope = self
            .running
            .iter()
            .find(|(_, job)| job.id == job_id)
            .map(|(scope, _)| scope.clone())?;
        let mut job = self.running.remove(&scope)?;

        match result {
            Ok(path) => {
                info!("Export {} written to {}", job.id, path.display());
                job.status = ExportStatus::Done;
                self.notice = Some(ExportNotice::Complete {
                    filename: job.filename.clone(),
                });
            }
            Err(e) => {
                job.status = ExportStatus::Failed;
                self.notice = Some(ExportNotice::Error {
                    message: e.to_string(),
                });
            }
        }
        self.last_settled = Some(job);
        self.last_settled.as_ref()
    }

    fn start(&mut self, scope: ExportScope, filename: &str) -> Result<JobId, ExportRefused> {
        if let Some(job) = self.running.get(&scope) {
            debug!("Ignoring export trigger, job {} still running", job.id);
            return Err(ExportRefused::AlreadyRunning(job.id));
        }

        let job = ExportJob {
            id: JobId::new(),
            scope: scope.clone(),
            status: ExportStatus::Running,
            filename: filename.to_string(),
        };
        let id = job.id;
        self.running.insert(scope, job);
        // A new job replaces whatever the previous one reported
        self.notice = None;
        Ok(id)
    }

    fn running_job(&self, job_id: JobId) -> Option<&ExportJob> {
        self.running.values().find(|job| job.id == job_id)
    }

    pub fn job(&self, job_id: JobId) -> Option<&ExportJob> {
        self.running_job(job_id).or_else(|| {
            self.last_settled
                .as_ref()
                .filter(|job| job.id == job_id)
        })
    }

    pub fn is_running(&self, scope: &ExportScope) -> bool {
        self.running.contains_key(scope)
    }

    /// A grid export is running.
    pub fn is_downloading(&self) -> bool {
        self.running.keys().any(ExportScope::is_grid)
    }

    /// A row export is running.
    pub fn is_metric_downloading(&self) -> bool {
        self.running.keys().any(|scope| !scope.is_grid())
    }

    pub fn is_metric_running(&self, kpi: &str) -> bool {
        self.running_metric_job(kpi).is_some()
    }

    fn running_metric_job(&self, kpi: &str) -> Option<&ExportJob> {
        self.running.iter().find_map(|(scope, job)| match scope {
            ExportScope::Metric { kpi: running, .. } if running == kpi => Some(job),
            _ => None,
        })
    }

    /// Terminal notice, hidden while any export runs.
    pub fn notice(&self) -> Option<&ExportNotice> {
        if self.running.is_empty() {
            self.notice.as_ref()
        } else {
            None
        }
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}

fn metric_filename(kpi: &str) -> String {
    let slug: String = kpi
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_metric.csv", slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::payload::RawMetricRow;
    use crate::export::resolver::MockEndpointResolver;
    use crate::series::build_table;

    fn vp(name: &str) -> FilterSelection {
        FilterSelection {
            vp: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn rows() -> TableView {
        build_table(&[RawMetricRow::new("Lead Time").with_value("value", "2d")])
    }

    fn open_gate(selection: &FilterSelection) -> ExportGate<'_> {
        ExportGate {
            loading: false,
            selection,
            required: RequiredLevel::Vp,
            has_rows: true,
        }
    }

    fn resolver() -> MockEndpointResolver {
        let mut resolver = MockEndpointResolver::new();
        resolver
            .expect_find_metric_endpoint()
            .returning(|kpi| Some(format!("/export/{}", kpi)));
        resolver
    }

    #[test]
    fn test_gate_disables_on_each_condition() {
        let baseline = FilterSelection::default();
        let selected = vp("VP1");

        assert!(open_gate(&selected).check().is_ok());
        assert!(open_gate(&baseline).check().is_err());
        assert!(
            ExportGate {
                loading: true,
                ..open_gate(&selected)
            }
            .check()
            .is_err()
        );
        assert!(
            ExportGate {
                required: RequiredLevel::Director,
                ..open_gate(&selected)
            }
            .check()
            .is_err()
        );
        assert!(
            ExportGate {
                has_rows: false,
                ..open_gate(&selected)
            }
            .check()
            .is_err()
        );
    }

    #[test]
    fn test_grid_export_is_single_flight() {
        let selection = vp("VP1");
        let mut exports = ExportController::new();

        let command = exports
            .export_grid(&open_gate(&selection), &selection, &rows(), "grid.csv")
            .unwrap();
        assert!(exports.is_downloading());
        assert_eq!(command.table.len(), 1);

        let second = exports.export_grid(&open_gate(&selection), &selection, &rows(), "grid.csv");
        assert_eq!(second, Err(ExportRefused::AlreadyRunning(command.job_id)));

        exports.settle(command.job_id, Ok(PathBuf::from("grid.csv")));
        assert!(!exports.is_downloading());
        assert!(
            exports
                .export_grid(&open_gate(&selection), &selection, &rows(), "grid.csv")
                .is_ok()
        );
    }

    #[test]
    fn test_disabled_gate_starts_nothing() {
        let baseline = FilterSelection::default();
        let mut exports = ExportController::new();
        let refused = exports.export_grid(&open_gate(&baseline), &baseline, &rows(), "grid.csv");
        assert!(matches!(refused, Err(ExportRefused::Disabled(_))));
        assert!(!exports.is_downloading());
    }

    #[test]
    fn test_notices_are_exclusive_and_hidden_while_running() {
        let selection = vp("VP1");
        let mut exports = ExportController::new();

        let first = exports
            .export_grid(&open_gate(&selection), &selection, &rows(), "grid.csv")
            .unwrap();
        assert_eq!(exports.notice(), None);
        let settled = exports
            .settle(first.job_id, Err(ExportError::Io(std::io::Error::other("disk full"))))
            .unwrap();
        assert_eq!(settled.status, ExportStatus::Failed);
        assert!(matches!(exports.notice(), Some(ExportNotice::Error { .. })));

        let retry = exports
            .export_grid(&open_gate(&selection), &selection, &rows(), "grid.csv")
            .unwrap();
        assert_eq!(exports.notice(), None);
        exports.settle(retry.job_id, Ok(PathBuf::from("grid.csv")));
        assert_eq!(
            exports.notice(),
            Some(&ExportNotice::Complete {
                filename: "grid.csv".to_string()
            })
        );

        exports.dismiss_notice();
        assert_eq!(exports.notice(), None);
    }

    #[test]
    fn test_settling_twice_is_ignored() {
        let selection = vp("VP1");
        let mut exports = ExportController::new();
        let command = exports
            .export_grid(&open_gate(&selection), &selection, &rows(), "grid.csv")
            .unwrap();
        assert!(exports.settle(command.job_id, Ok(PathBuf::from("a"))).is_some());
        assert!(exports.settle(command.job_id, Ok(PathBuf::from("a"))).is_none());
    }

    #[test]
    fn test_row_export_is_independent_of_grid_export() {
        let selection = vp("VP1");
        let mut exports = ExportController::new();

        let grid = exports
            .export_grid(&open_gate(&selection), &selection, &rows(), "grid.csv")
            .unwrap();
        let plan = exports
            .export_metric_row("Lead Time", &selection, &resolver())
            .unwrap();
        assert_eq!(plan.endpoint, "/export/Lead Time");
        assert_eq!(plan.params.get("kpi"), Some("Lead Time"));
        assert_eq!(plan.params.get("vp"), Some("VP1"));
        assert!(exports.is_downloading());
        assert!(exports.is_metric_downloading());

        // Same row again is refused, a different row is not
        assert!(matches!(
            exports.export_metric_row("Lead Time", &selection, &resolver()),
            Err(ExportRefused::AlreadyRunning(_))
        ));
        assert!(
            exports
                .export_metric_row("Deployment Frequency", &selection, &resolver())
                .is_ok()
        );

        exports.settle(grid.job_id, Ok(PathBuf::from("grid.csv")));
        assert!(!exports.is_downloading());
        assert!(exports.is_metric_running("Lead Time"));
    }

    #[test]
    fn test_row_export_is_single_flight_across_selections() {
        let mut exports = ExportController::new();
        let first = exports
            .export_metric_row("Lead Time", &vp("VP1"), &resolver())
            .unwrap();

        assert_eq!(
            exports.export_metric_row("Lead Time", &vp("VP2"), &resolver()),
            Err(ExportRefused::AlreadyRunning(first.job_id))
        );

        exports.settle(first.job_id, Ok(PathBuf::from("lead_time_metric.csv")));
        let second = exports
            .export_metric_row("Lead Time", &vp("VP2"), &resolver())
            .unwrap();
        assert_eq!(second.params.get("vp"), Some("VP2"));
    }

    #[test]
    fn test_row_export_payload_becomes_csv_command() {
        let selection = vp("VP1");
        let mut exports = ExportController::new();
        let plan = exports
            .export_metric_row("Change Failure Rate", &selection, &resolver())
            .unwrap();

        let body = FetchBody::from_rows(vec![
            RawMetricRow::new("Change Failure Rate").with_value("jan", "3"),
        ]);
        let command = exports.metric_payload_ready(plan.job_id, &body).unwrap();
        assert_eq!(command.filename, "change_failure_rate_metric.csv");
        assert_eq!(command.table.headers, vec!["KPI", "jan"]);
    }

    #[test]
    fn test_unknown_kpi_is_refused() {
        let mut resolver = MockEndpointResolver::new();
        resolver.expect_find_metric_endpoint().returning(|_| None);
        let mut exports = ExportController::new();
        let refused = exports.export_metric_row("Mystery", &vp("VP1"), &resolver);
        assert_eq!(
            refused,
            Err(ExportRefused::EndpointNotFound("Mystery".to_string()))
        );
        assert!(!exports.is_metric_downloading());
    }
}
