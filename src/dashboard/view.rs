//! View model derivation.
//!
//! [`compute_view_model`] is a pure function of the controller. The runtime
//! calls it after every transition and publishes the result; nothing in the
//! view model is stored anywhere else.

use super::state::{DashboardController, ExportPhase, GraphPhase, GridPhase};
use crate::consts::dashboard_consts::text;
use crate::export::{ExportGate, ExportNotice};
use crate::filter::FilterSelection;
use crate::series::{ChartSeries, GraphPayload, SeriesMode, TableView};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    /// Number of user actions the controller had applied.
    pub actions_applied: u64,
    pub selection: FilterSelection,
    pub grid_phase: GridPhase,
    pub graph_phase: GraphPhase,
    pub export_phase: ExportPhase,
    #[serde(rename = "btnExport")]
    pub btn_export: ButtonView,
    #[serde(rename = "loader-circle")]
    pub loader_visible: bool,
    /// Asks for the missing required filter level.
    pub prompt: Option<String>,
    pub table: TableView,
    /// One export trigger per top-level row.
    #[serde(rename = "btnSpan")]
    pub row_exports: Vec<RowExportView>,
    #[serde(rename = "smallScreenModal")]
    pub graph: Option<GraphPopupView>,
    pub download_message: Option<String>,
    pub notice: Option<NoticeView>,
    pub error_banner: Option<String>,
    pub last_updated: String,
}

impl ViewModel {
    /// The dashboard has mounted and has nothing in flight.
    pub fn is_settled(&self) -> bool {
        self.grid_phase != GridPhase::Idle
            && !self.loader_visible
            && self.export_phase != ExportPhase::Exporting
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ButtonView {
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowExportView {
    pub kpi: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPopupView {
    pub title: String,
    pub kpi: String,
    pub mode: SeriesMode,
    pub loading: bool,
    pub error: Option<String>,
    /// The two series of the active chart, prior year first.
    pub active: Vec<ChartSeries>,
    pub payload: Option<GraphPayload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Complete,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoticeView {
    pub kind: NoticeKind,
    pub message: String,
    pub detail: String,
}

pub fn compute_view_model(dashboard: &DashboardController) -> ViewModel {
    let selection = dashboard.filter.selection();
    let required = dashboard.settings.required_level;
    let loading = dashboard.is_view_loading();

    let gate = ExportGate {
        loading,
        selection,
        required,
        has_rows: !dashboard.table.is_empty(),
    };

    let row_exports = dashboard
        .table
        .rows
        .iter()
        .map(|row| RowExportView {
            kpi: row.kpi.clone(),
            disabled: dashboard.exports.is_metric_running(&row.kpi)
                || dashboard
                    .endpoint_resolver
                    .find_metric_endpoint(&row.kpi)
                    .is_none(),
        })
        .collect();

    let graph = dashboard.graph.as_ref().map(|graph| GraphPopupView {
        title: text::GRAPH_TITLE.to_string(),
        kpi: graph.kpi.clone(),
        mode: graph.mode,
        loading: dashboard.graph_phase == GraphPhase::FetchingGraph,
        error: dashboard.graph_error.as_ref().map(ToString::to_string),
        active: graph
            .series
            .as_ref()
            .map(|series| series.active().to_vec())
            .unwrap_or_default(),
        payload: graph.series.as_ref().map(|series| series.to_payload()),
    });

    let download_message = if dashboard.exports.is_downloading() {
        Some(text::GRID_DOWNLOADING.to_string())
    } else if dashboard.exports.is_metric_downloading() {
        Some(text::METRIC_DOWNLOADING.to_string())
    } else {
        None
    };

    let notice = dashboard.exports.notice().map(|notice| match notice {
        ExportNotice::Complete { filename } => NoticeView {
            kind: NoticeKind::Complete,
            message: text::DOWNLOAD_COMPLETE.to_string(),
            detail: filename.clone(),
        },
        ExportNotice::Error { message } => NoticeView {
            kind: NoticeKind::Error,
            message: text::DOWNLOAD_ERROR.to_string(),
            detail: message.clone(),
        },
    });

    ViewModel {
        actions_applied: dashboard.actions_applied,
        selection: selection.clone(),
        grid_phase: dashboard.grid_phase,
        graph_phase: dashboard.graph_phase,
        export_phase: dashboard.export_phase(),
        btn_export: ButtonView {
            disabled: gate.check().is_err(),
        },
        loader_visible: loading,
        prompt: (!selection.has_level(required)).then(|| required.prompt().to_string()),
        table: dashboard.table.clone(),
        row_exports,
        graph,
        download_message,
        notice,
        error_banner: dashboard.grid_error.as_ref().map(ToString::to_string),
        last_updated: dashboard
            .last_refresh
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| text::LAST_UPDATED_UNKNOWN.to_string()),
    }
}
