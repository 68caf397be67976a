//! Headless mode execution
//!
//! Replays a fixed list of actions against a running session, waiting for
//! the dashboard to settle after each one.

use super::{
    SessionData,
    messages::{print_session_exit_success, print_session_shutdown, print_session_starting},
};
use crate::dashboard::{Action, ViewModel};
use crate::events::Event;
use log::debug;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinError;

#[derive(Debug, Error)]
pub enum HeadlessError {
    #[error("Interrupted")]
    Interrupted,

    #[error("Dashboard runtime stopped before the session finished")]
    RuntimeStopped,

    #[error("Dashboard did not settle within {0:?}")]
    Timeout(Duration),

    #[error("Dashboard runtime failed: {0}")]
    Join(#[from] JoinError),
}

/// Final view and the activity worth showing.
#[derive(Debug)]
pub struct HeadlessOutcome {
    pub view: ViewModel,
    pub activity: Vec<Event>,
}

/// Runs the application in headless mode
///
/// Waits for the mount fetch, then applies `script` one action at a time.
/// Ctrl+C stops the session. The activity log is printed whether or not
/// the script completed.
pub async fn run_headless_mode(
    mut session: SessionData,
    script: Vec<Action>,
) -> Result<HeadlessOutcome, HeadlessError> {
    print_session_starting(&session.api_root);

    // Trigger shutdown on Ctrl+C
    let shutdown_sender_clone = session.shutdown_sender.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_sender_clone.send(());
        }
    });

    let mut shutdown_receiver = session.shutdown_sender.subscribe();
    let result = replay(&mut session, &mut shutdown_receiver, script).await;
    ctrl_c.abort();

    print_session_shutdown();
    let _ = session.shutdown_sender.send(());
    let controller = session.join_handle.await?;

    let activity: Vec<Event> = controller
        .activity_logs()
        .iter()
        .filter(|event| event.should_display())
        .cloned()
        .collect();
    for event in &activity {
        println!("{}", event);
    }

    let view = result?;
    print_session_exit_success();
    Ok(HeadlessOutcome { view, activity })
}

async fn replay(
    session: &mut SessionData,
    shutdown: &mut broadcast::Receiver<()>,
    script: Vec<Action>,
) -> Result<ViewModel, HeadlessError> {
    let timeout = session.settle_timeout;
    let mut view = wait_settled(&mut session.view_receiver, shutdown, 0, timeout).await?;

    for action in script {
        let expected = view.actions_applied + 1;
        debug!("Applying {:?}", action);
        session
            .action_sender
            .send(action)
            .await
            .map_err(|_| HeadlessError::RuntimeStopped)?;
        view = wait_settled(&mut session.view_receiver, shutdown, expected, timeout).await?;
    }
    Ok(view)
}

async fn wait_settled(
    view: &mut watch::Receiver<ViewModel>,
    shutdown: &mut broadcast::Receiver<()>,
    actions: u64,
    timeout: Duration,
) -> Result<ViewModel, HeadlessError> {
    tokio::select! {
        biased;
        _ = shutdown.recv() => Err(HeadlessError::Interrupted),
        settled = tokio::time::timeout(
            timeout,
            view.wait_for(|vm| vm.actions_applied >= actions && vm.is_settled()),
        ) => match settled {
            Ok(Ok(vm)) => Ok(vm.clone()),
            Ok(Err(_)) => Err(HeadlessError::RuntimeStopped),
            Err(_) => Err(HeadlessError::Timeout(timeout)),
        },
    }
}
