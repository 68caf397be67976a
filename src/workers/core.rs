//! Core worker utilities

use crate::api::error::ApiError;
use crate::api::payload::FetchBody;
use crate::dashboard::commands::Completion;
use crate::export::{ExportError, JobId};
use crate::fetch::RequestHandle;
use log::debug;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Reports worker outcomes back to the runtime.
#[derive(Clone)]
pub struct CompletionSender {
    sender: mpsc::Sender<Completion>,
}

impl CompletionSender {
    pub fn new(sender: mpsc::Sender<Completion>) -> Self {
        Self { sender }
    }

    /// Send a generic completion
    pub async fn send_completion(&self, completion: Completion) {
        if self.sender.send(completion).await.is_err() {
            // Runtime is gone; nobody is waiting for this result anymore
            debug!("Dropping completion, runtime stopped");
        }
    }

    pub async fn send_fetch_result(
        &self,
        handle: RequestHandle,
        result: Result<FetchBody, ApiError>,
    ) {
        self.send_completion(Completion::Fetch { handle, result })
            .await;
    }

    pub async fn send_export_result(&self, job_id: JobId, result: Result<PathBuf, ExportError>) {
        self.send_completion(Completion::Export { job_id, result })
            .await;
    }
}
