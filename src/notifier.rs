//! Banner events dispatched to the surrounding shell.

use log::info;
use std::fmt::{Display, Formatter};

#[cfg(test)]
use mockall::automock;

/// Banners owned by the shell, toggled by action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BannerKind {
    Feedback,
    DownloadSuccess,
    DownloadError,
}

impl BannerKind {
    pub const ALL: [BannerKind; 3] = [
        BannerKind::Feedback,
        BannerKind::DownloadSuccess,
        BannerKind::DownloadError,
    ];

    pub fn action_type(&self) -> &'static str {
        match self {
            BannerKind::Feedback => "SET_SHOW_FEEDBACK",
            BannerKind::DownloadSuccess => "SET_SHOW_FEEDBACK_DOWNLOAD_SUCCESS_MSG",
            BannerKind::DownloadError => "SET_SHOW_API_DOWNLOAD_ERROR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BannerEvent {
    pub kind: BannerKind,
    pub payload: bool,
}

impl BannerEvent {
    pub fn show(kind: BannerKind) -> Self {
        Self {
            kind,
            payload: true,
        }
    }

    pub fn hide(kind: BannerKind) -> Self {
        Self {
            kind,
            payload: false,
        }
    }
}

impl Display for BannerEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.kind.action_type(), self.payload)
    }
}

#[cfg_attr(test, automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, event: BannerEvent);
}

/// Default notifier for headless sessions: banners go to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: BannerEvent) {
        info!("Banner event {}", event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_types_are_fixed() {
        let types: Vec<_> = BannerKind::ALL.iter().map(BannerKind::action_type).collect();
        assert_eq!(
            types,
            vec![
                "SET_SHOW_FEEDBACK",
                "SET_SHOW_FEEDBACK_DOWNLOAD_SUCCESS_MSG",
                "SET_SHOW_API_DOWNLOAD_ERROR"
            ]
        );
        assert_eq!(
            BannerEvent::hide(BannerKind::Feedback).to_string(),
            "SET_SHOW_FEEDBACK(false)"
        );
    }
}
