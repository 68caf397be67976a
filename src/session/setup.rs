//! Session setup and initialization

use super::runtime::DashboardRuntime;
use crate::api::MetricsClient;
use crate::api::error::ApiError;
use crate::config::Config;
use crate::consts::dashboard_consts::{ACTION_QUEUE_SIZE, fetching};
use crate::dashboard::{Action, DashboardController, DashboardSettings, ViewModel};
use crate::environment::Environment;
use crate::export::{FileCsvExporter, StaticEndpointResolver};
use crate::network::NetworkClient;
use crate::notifier::LogNotifier;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

/// Handles to a running dashboard session
pub struct SessionData {
    /// User actions for the controller
    pub action_sender: mpsc::Sender<Action>,
    /// Latest view model, republished after every transition
    pub view_receiver: watch::Receiver<ViewModel>,
    /// Shutdown sender to stop the runtime
    pub shutdown_sender: broadcast::Sender<()>,
    /// Resolves to the controller once the runtime stops
    pub join_handle: JoinHandle<DashboardController>,
    /// API root the session talks to (for display purposes)
    pub api_root: String,
    /// Longest a single action may take to settle
    pub settle_timeout: Duration,
}

/// Sets up a dashboard session
///
/// 1. Builds the HTTP client and wraps it with retries
/// 2. Builds the CSV exporter and the metric endpoint table
/// 3. Starts the runtime with a freshly mounted controller
///
/// # Arguments
/// * `config` - Validated configuration
/// * `env` - Environment whose API root is used unless the config overrides it
pub fn setup_session(config: &Config, env: Environment) -> Result<SessionData, ApiError> {
    let api_root = config.api_root(env);
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let client = MetricsClient::new(api_root.clone(), timeout)?;
    let api = Arc::new(NetworkClient::new(Arc::new(client), config.max_retries));

    let controller = DashboardController::new(
        DashboardSettings::from_config(config),
        Arc::new(StaticEndpointResolver::with_defaults(
            config.endpoints.metric_export_prefix.clone(),
        )),
        Arc::new(LogNotifier),
    );
    let exporter = Arc::new(FileCsvExporter::new(config.export_dir.clone()));
    let (runtime, view_receiver) = DashboardRuntime::new(controller, api, exporter);

    let (action_sender, action_receiver) = mpsc::channel(ACTION_QUEUE_SIZE);
    let (shutdown_sender, _) = broadcast::channel(1);
    let join_handle = tokio::spawn(runtime.run(action_receiver, shutdown_sender.subscribe()));

    Ok(SessionData {
        action_sender,
        view_receiver,
        shutdown_sender,
        join_handle,
        api_root,
        settle_timeout: settle_timeout(config),
    })
}

/// Worst case for one fetch: every attempt times out, with a backoff in
/// between. A metric export runs a fetch and then a write.
fn settle_timeout(config: &Config) -> Duration {
    let attempts = config.max_retries.max(1);
    let per_attempt = Duration::from_secs(config.request_timeout_secs) + fetching::retry_backoff();
    per_attempt * attempts * 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Source;

    #[test]
    fn test_settle_timeout_covers_every_attempt() {
        let mut config = Config::default();
        config.max_retries = 2;
        config.request_timeout_secs = 10;
        assert_eq!(settle_timeout(&config), Duration::from_millis(42_000));

        config.max_retries = 0;
        assert_eq!(settle_timeout(&config), Duration::from_millis(21_000));
    }

    #[tokio::test]
    async fn test_setup_session_publishes_mounted_view() {
        let mut config = Config::default();
        config.api_root = Some("http://127.0.0.1:9/api".to_string());
        config.max_retries = 1;
        config.request_timeout_secs = 1;

        let session = setup_session(&config, Environment::Local).unwrap();
        assert_eq!(session.api_root, "http://127.0.0.1:9/api");

        let _ = session.shutdown_sender.send(());
        let controller = session.join_handle.await.unwrap();
        assert!(
            controller
                .activity_logs()
                .iter()
                .any(|event| event.source == Source::Grid)
        );
    }
}
