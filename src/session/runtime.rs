//! Runtime driving one dashboard controller
//!
//! The runtime owns the controller and is the only task that touches it.
//! Workers are spawned per command and report back over the completion
//! channel; the view model is republished after every transition.

use crate::api::MetricsApi;
use crate::consts::dashboard_consts::COMPLETION_QUEUE_SIZE;
use crate::dashboard::{
    Action, Command, Completion, DashboardController, ViewModel, compute_view_model,
};
use crate::export::CsvExporter;
use crate::workers::{CompletionSender, spawn_export, spawn_fetch};
use log::debug;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

pub struct DashboardRuntime {
    controller: DashboardController,
    api: Arc<dyn MetricsApi>,
    exporter: Arc<dyn CsvExporter>,
    completion_sender: CompletionSender,
    completion_receiver: mpsc::Receiver<Completion>,
    view_sender: watch::Sender<ViewModel>,
    workers: Vec<JoinHandle<()>>,
}

impl DashboardRuntime {
    /// Returns the runtime and the receiving end of its view channel.
    pub fn new(
        controller: DashboardController,
        api: Arc<dyn MetricsApi>,
        exporter: Arc<dyn CsvExporter>,
    ) -> (Self, watch::Receiver<ViewModel>) {
        let (sender, completion_receiver) = mpsc::channel(COMPLETION_QUEUE_SIZE);
        let (view_sender, view_receiver) = watch::channel(compute_view_model(&controller));
        let runtime = Self {
            controller,
            api,
            exporter,
            completion_sender: CompletionSender::new(sender),
            completion_receiver,
            view_sender,
            workers: Vec::new(),
        };
        (runtime, view_receiver)
    }

    /// Mount the dashboard and process actions and completions until
    /// shutdown or until every action sender is gone. Returns the controller
    /// so callers can inspect its final state.
    pub async fn run(
        mut self,
        mut actions: mpsc::Receiver<Action>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> DashboardController {
        self.controller.mount();
        self.flush();

        loop {
            tokio::select! {
                Some(completion) = self.completion_receiver.recv() => {
                    self.controller.add_completion(completion);
                    self.controller.update();
                }
                action = actions.recv() => {
                    match action {
                        Some(action) => {
                            // Rejections are already recorded by the controller
                            let _ = self.controller.apply(action);
                        }
                        None => break,
                    }
                }
                _ = shutdown.recv() => {
                    break;
                }
            }
            self.flush();
        }

        debug!("Dashboard runtime stopping");
        // Superseded or unfinished workers are abandoned; their results
        // would be discarded anyway
        for worker in self.workers.drain(..) {
            worker.abort();
        }
        self.controller
    }

    /// Start queued commands and publish the current view.
    fn flush(&mut self) {
        self.workers.retain(|worker| !worker.is_finished());
        for command in self.controller.take_commands() {
            let worker = match command {
                Command::Fetch(fetch) => spawn_fetch(
                    Arc::clone(&self.api),
                    fetch,
                    self.completion_sender.clone(),
                ),
                Command::Export(export) => spawn_export(
                    Arc::clone(&self.exporter),
                    export,
                    self.completion_sender.clone(),
                ),
            };
            self.workers.push(worker);
        }
        self.view_sender
            .send_replace(compute_view_model(&self.controller));
    }
}
