//! CSV export of the visible grid and of single KPI rows.

pub mod controller;
pub mod csv_writer;
pub mod resolver;

pub use controller::{ExportCommand, ExportController, ExportGate, ExportRefused, MetricExportPlan};
pub use csv_writer::{CsvExporter, CsvTable, FileCsvExporter};
pub use resolver::{EndpointResolver, StaticEndpointResolver};

use crate::api::error::ApiError;
use crate::filter::FilterSelection;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The export payload of a KPI could not be fetched.
    #[error("Export fetch failed: {0}")]
    Fetch(Arc<ApiError>),

    #[error("No export endpoint for KPI '{0}'")]
    EndpointNotFound(String),

    /// The blocking writer task panicked or was cancelled.
    #[error("Export worker failed: {0}")]
    Worker(String),
}

/// What an export covers. Captured when the export is triggered and never
/// changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExportScope {
    Grid(FilterSelection),
    Metric {
        kpi: String,
        selection: FilterSelection,
    },
}

impl ExportScope {
    pub fn is_grid(&self) -> bool {
        matches!(self, ExportScope::Grid(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(uuid::Uuid);

impl JobId {
    fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
pub enum ExportStatus {
    #[default]
    Idle,
    Running,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJob {
    pub id: JobId,
    pub scope: ExportScope,
    pub status: ExportStatus,
    pub filename: String,
}

/// Terminal notice of the latest settled export. Only one can exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportNotice {
    Complete { filename: String },
    Error { message: String },
}
