//! CSV export worker

use super::core::CompletionSender;
use crate::export::{CsvExporter, ExportCommand, ExportError};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Write one export off the async threads.
pub fn spawn_export(
    exporter: Arc<dyn CsvExporter>,
    command: ExportCommand,
    completions: CompletionSender,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let ExportCommand {
            job_id,
            table,
            filename,
        } = command;
        let result = tokio::task::spawn_blocking(move || exporter.export_to_csv(&table, &filename))
            .await
            .unwrap_or_else(|e| Err(ExportError::Worker(e.to_string())));
        completions.send_export_result(job_id, result).await;
    })
}
