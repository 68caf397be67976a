pub mod dashboard_consts {
    //! Dashboard Configuration Constants
    //!
    //! Constants shared by the controller, the workers and the CLI, grouped by
    //! functional area.

    // =============================================================================
    // QUEUE CONFIGURATION
    // =============================================================================

    /// The maximum number of events to keep in the activity logs.
    pub const MAX_ACTIVITY_LOGS: usize = 100;

    /// Buffer size of the worker completion channel.
    pub const COMPLETION_QUEUE_SIZE: usize = 64;

    /// Buffer size of the user action channel.
    pub const ACTION_QUEUE_SIZE: usize = 32;

    // =============================================================================
    // NETWORK CONFIGURATION
    // =============================================================================

    /// Metric fetch retry configuration
    pub mod fetching {
        use std::time::Duration;

        /// Delay between two attempts of the same fetch (milliseconds)
        pub const RETRY_BACKOFF_MS: u64 = 500;

        /// Default number of attempts for a single fetch
        pub const MAX_RETRIES: u32 = 3;

        /// Default per-request timeout (seconds)
        pub const REQUEST_TIMEOUT_SECS: u64 = 30;

        /// Helper function to get the retry backoff
        pub const fn retry_backoff() -> Duration {
            Duration::from_millis(RETRY_BACKOFF_MS)
        }
    }

    // =============================================================================
    // ENDPOINTS
    // =============================================================================

    /// Default backend endpoints, relative to the API root
    pub mod endpoints {
        /// Grid metrics for the selected hierarchy
        pub const GRID: &str = "v1/metrics/grid";

        /// Monthly trend data backing the commit graph popup
        pub const MONTHLY_TREND: &str = "v1/metrics/monthly";

        /// Prefix under which per-KPI export endpoints live
        pub const METRIC_EXPORT_PREFIX: &str = "v1/metrics/export";
    }

    // =============================================================================
    // VIEW TEXT
    // =============================================================================

    /// Literal strings surfaced in the view model
    pub mod text {
        pub const LAST_UPDATED_UNKNOWN: &str = "NA";
        pub const GRID_DOWNLOADING: &str = "Downloading";
        pub const METRIC_DOWNLOADING: &str = "Metric data downloading";
        pub const DOWNLOAD_COMPLETE: &str = "Download complete";
        pub const DOWNLOAD_ERROR: &str = "Download failed, please try again";
        pub const GRAPH_TITLE: &str = "Commits Monthly & Cumulative trends";
        pub const DEFAULT_GRID_EXPORT_FILENAME: &str = "engineering_metrics.csv";
    }
}
