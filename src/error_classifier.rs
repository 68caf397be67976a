use crate::api::error::ApiError;
use crate::export::ExportError;
use crate::logging::LogLevel;

#[derive(Debug, Clone)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify_fetch_error(&self, error: &ApiError) -> LogLevel {
        match error {
            // Non-critical: Temporary server issues
            ApiError::Http { status, .. } if *status == 429 => LogLevel::Debug,
            ApiError::Http { status, .. } if (500..=599).contains(status) => LogLevel::Warn,

            // Critical: Auth, malformed responses
            ApiError::Http { status, .. } if *status == 401 => LogLevel::Error,
            ApiError::Http { status, .. } if *status == 403 => LogLevel::Error,
            ApiError::Decode(_) => LogLevel::Error,

            // Network issues - usually temporary
            _ => LogLevel::Warn,
        }
    }

    pub fn classify_export_error(&self, error: &ExportError) -> LogLevel {
        match error {
            // The fetch behind a row export already went through classify_fetch_error
            ExportError::Fetch(_) => LogLevel::Warn,
            ExportError::EndpointNotFound(_) => LogLevel::Warn,
            ExportError::Io(_) | ExportError::Csv(_) => LogLevel::Error,
            ExportError::Worker(_) => LogLevel::Error,
        }
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}
