//! Centralized retry and severity decisions for API errors

use crate::api::error::ApiError;
use crate::error_classifier::ErrorClassifier;
use crate::logging::LogLevel;

/// Centralized error handler for all network operations
#[derive(Debug, Clone)]
pub struct ErrorHandler {
    classifier: ErrorClassifier,
}

impl ErrorHandler {
    pub fn new() -> Self {
        Self {
            classifier: ErrorClassifier::new(),
        }
    }

    /// Classify error and determine appropriate log level
    pub fn classify_error(&self, error: &ApiError) -> LogLevel {
        self.classifier.classify_fetch_error(error)
    }

    /// Determine if an error should trigger retry logic
    pub fn should_retry(&self, error: &ApiError) -> bool {
        match error {
            // Retry on network/connection errors
            ApiError::Reqwest(_) => true,
            ApiError::Decode(_) => true,

            // HTTP errors - check status code
            ApiError::Http { status, .. } => match *status {
                // Rate limiting - don't hammer the backend
                429 => false,
                // Client errors won't change on retry
                400..=499 => false,
                // Retry server errors
                500..=599 => true,
                _ => false,
            },
        }
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> ApiError {
        ApiError::Http {
            status,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_should_retry_server_errors_only() {
        let handler = ErrorHandler::new();
        assert!(handler.should_retry(&http(500)));
        assert!(handler.should_retry(&http(503)));
        assert!(!handler.should_retry(&http(404)));
        assert!(!handler.should_retry(&http(429)));
        assert!(!handler.should_retry(&http(302)));
    }

    #[test]
    fn test_decode_errors_are_retried() {
        let handler = ErrorHandler::new();
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(handler.should_retry(&ApiError::Decode(err)));
    }
}
