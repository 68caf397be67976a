//! Messages flowing in and out of the controller.

use crate::api::error::ApiError;
use crate::api::payload::{FetchBody, RequestParams};
use crate::export::{ExportCommand, ExportError, JobId};
use crate::fetch::RequestHandle;
use crate::series::SeriesMode;
use std::path::PathBuf;

/// Side effects requested by the controller, carried out by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Fetch(FetchCommand),
    Export(ExportCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCommand {
    pub handle: RequestHandle,
    pub endpoint: String,
    pub params: RequestParams,
}

/// Outcome of a worker, fed back into the controller.
#[derive(Debug)]
pub enum Completion {
    Fetch {
        handle: RequestHandle,
        result: Result<FetchBody, ApiError>,
    },
    Export {
        job_id: JobId,
        result: Result<PathBuf, ExportError>,
    },
}

/// User intents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetVp(String),
    SetDirector(Option<String>),
    SetTeam(Option<String>),
    SetMonthly(bool),
    Reset,
    ExportGrid,
    ExportMetricRow(String),
    OpenGraph { kpi: String, mode: SeriesMode },
    SetGraphMode(SeriesMode),
    CloseGraph,
    DismissNotice,
}
