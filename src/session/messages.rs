//! Unified messaging system for session operations

// ANSI Color Codes for session messages
pub const COLOR_INFO: &str = "\x1b[1;36m"; // Bold Cyan
pub const COLOR_SUCCESS: &str = "\x1b[1;32m"; // Bold Green
pub const COLOR_RESET: &str = "\x1b[0m";

/// Session-specific message types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMessage {
    /// Normal session start/shutdown messages
    Info(String),
    /// Success messages for completed sessions
    Success(String),
}

impl SessionMessage {
    pub fn info(msg: impl Into<String>) -> Self {
        Self::Info(msg.into())
    }

    pub fn success(msg: impl Into<String>) -> Self {
        Self::Success(msg.into())
    }

    fn render(&self) -> String {
        match self {
            Self::Info(msg) => format!("{}[INFO]{} {}", COLOR_INFO, COLOR_RESET, msg),
            Self::Success(msg) => format!("{}[SUCCESS]{} {}", COLOR_SUCCESS, COLOR_RESET, msg),
        }
    }

    pub fn print(&self) {
        println!("{}", self.render());
    }
}

pub fn print_session_starting(api_root: &str) {
    SessionMessage::info(format!("Loading dashboard from {}", api_root)).print();
}

pub fn print_session_shutdown() {
    SessionMessage::info("Shutting down...").print();
}

pub fn print_session_exit_success() {
    SessionMessage::success("metrics-dashboard exited successfully").print();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_wraps_tag_in_color() {
        assert_eq!(
            SessionMessage::info("hello").render(),
            "\x1b[1;36m[INFO]\x1b[0m hello"
        );
        assert_eq!(
            SessionMessage::success("done").render(),
            "\x1b[1;32m[SUCCESS]\x1b[0m done"
        );
    }
}
