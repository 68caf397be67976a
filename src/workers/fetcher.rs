//! Fetch worker

use super::core::CompletionSender;
use crate::api::MetricsApi;
use crate::dashboard::commands::FetchCommand;
use log::debug;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Run one fetch in the background. Retries live in the API client; the
/// worker reports whatever the client finally returns.
pub fn spawn_fetch(
    api: Arc<dyn MetricsApi>,
    command: FetchCommand,
    completions: CompletionSender,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let FetchCommand {
            handle,
            endpoint,
            params,
        } = command;
        debug!(
            "Fetching {} (generation {}) from {}",
            handle.key(),
            handle.generation(),
            endpoint
        );
        let result = api.fetch(&endpoint, &params).await;
        completions.send_fetch_result(handle, result).await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockMetricsApi;
    use crate::api::error::ApiError;
    use crate::api::payload::{FetchBody, RawMetricRow, RequestParams};
    use crate::dashboard::commands::Completion;
    use crate::fetch::{FetchCoordinator, FetchKey};
    use mockall::predicate::eq;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_fetch_result_is_reported_with_its_handle() {
        let mut api = MockMetricsApi::new();
        api.expect_fetch()
            .with(eq("v1/metrics/grid"), eq(RequestParams::new().with("vp", "VP1")))
            .times(1)
            .returning(|_, _| Ok(FetchBody::from_rows(vec![RawMetricRow::new("Lead Time")])));

        let mut coordinator = FetchCoordinator::new();
        let params = RequestParams::new().with("vp", "VP1");
        let handle = coordinator.request(FetchKey::Grid, params.clone());

        let (sender, mut receiver) = mpsc::channel(4);
        spawn_fetch(
            Arc::new(api),
            FetchCommand {
                handle: handle.clone(),
                endpoint: "v1/metrics/grid".to_string(),
                params,
            },
            CompletionSender::new(sender),
        )
        .await
        .unwrap();

        match receiver.recv().await {
            Some(Completion::Fetch {
                handle: reported,
                result: Ok(body),
            }) => {
                assert_eq!(reported, handle);
                assert_eq!(body.rows.len(), 1);
            }
            other => panic!("unexpected completion: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_error_is_reported() {
        let mut api = MockMetricsApi::new();
        api.expect_fetch().returning(|_, _| {
            Err(ApiError::Http {
                status: 500,
                message: "down".to_string(),
            })
        });

        let mut coordinator = FetchCoordinator::new();
        let handle = coordinator.request(FetchKey::MonthlyGraph, RequestParams::new());
        let (sender, mut receiver) = mpsc::channel(4);
        spawn_fetch(
            Arc::new(api),
            FetchCommand {
                handle,
                endpoint: "v1/metrics/monthly".to_string(),
                params: RequestParams::new(),
            },
            CompletionSender::new(sender),
        )
        .await
        .unwrap();

        assert!(matches!(
            receiver.recv().await,
            Some(Completion::Fetch { result: Err(_), .. })
        ));
    }
}
