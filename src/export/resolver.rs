//! Per-KPI export endpoint lookup.

use crate::consts::dashboard_consts::endpoints;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
pub trait EndpointResolver: Send + Sync {
    /// Endpoint (relative to the API root) serving the export payload of `kpi`.
    fn find_metric_endpoint(&self, kpi: &str) -> Option<String>;
}

/// Name-based lookup table. KPI names match case-insensitively.
#[derive(Debug, Clone)]
pub struct StaticEndpointResolver {
    prefix: String,
    entries: Vec<(String, String)>,
}

impl StaticEndpointResolver {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            entries: Vec::new(),
        }
    }

    /// Resolver preloaded with the DORA and non-functional KPIs.
    pub fn with_defaults(prefix: impl Into<String>) -> Self {
        Self::new(prefix)
            .with_entry("Deployment Frequency", "deployment-frequency")
            .with_entry("Lead Time for Changes", "lead-time")
            .with_entry("Lead Time", "lead-time")
            .with_entry("Change Failure Rate", "change-failure-rate")
            .with_entry("Mean Time to Restore", "mttr")
            .with_entry("Time to Restore Service", "mttr")
            .with_entry("Availability", "availability")
            .with_entry("Commits", "commits")
    }

    pub fn with_entry(mut self, kpi: impl Into<String>, path: impl Into<String>) -> Self {
        let kpi = kpi.into();
        let path = path.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&kpi))
        {
            Some(entry) => entry.1 = path,
            None => self.entries.push((kpi, path)),
        }
        self
    }
}

impl Default for StaticEndpointResolver {
    fn default() -> Self {
        Self::with_defaults(endpoints::METRIC_EXPORT_PREFIX)
    }
}

impl EndpointResolver for StaticEndpointResolver {
    fn find_metric_endpoint(&self, kpi: &str) -> Option<String> {
        let kpi = kpi.trim();
        self.entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(kpi))
            .map(|(_, path)| {
                format!(
                    "{}/{}",
                    self.prefix.trim_end_matches('/'),
                    path.trim_start_matches('/')
                )
            })
    }
}
