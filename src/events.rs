//! Event System
//!
//! Activity events recorded by the dashboard controller

use crate::logging::{LogLevel, should_log_with_env};
use chrono::Local;
use std::fmt::Display;

/// Where an activity event originated.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Source {
    /// The filter hierarchy (selection changes, rejected mutations).
    Filter,
    /// Grid data fetches.
    Grid,
    /// Monthly trend fetches behind the graph popup.
    MonthlyGraph,
    /// CSV export of the visible grid.
    GridExport,
    /// CSV export of one KPI row.
    MetricExport(String),
}

impl Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Filter => write!(f, "filter"),
            Source::Grid => write!(f, "grid"),
            Source::MonthlyGraph => write!(f, "graph"),
            Source::GridExport => write!(f, "export"),
            Source::MetricExport(kpi) => write!(f, "export[{}]", kpi),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, strum::Display)]
pub enum EventType {
    Success,
    Error,
    Refresh,
    Waiting,
    StateChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub source: Source,
    pub msg: String,
    pub timestamp: String,
    pub event_type: EventType,
    pub log_level: LogLevel,
}

impl Event {
    pub fn new(
        source: Source,
        msg: impl Into<String>,
        event_type: EventType,
        log_level: LogLevel,
    ) -> Self {
        Self {
            source,
            msg: msg.into(),
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            event_type,
            log_level,
        }
    }

    pub fn success(source: Source, msg: impl Into<String>) -> Self {
        Self::new(source, msg, EventType::Success, LogLevel::Info)
    }

    pub fn refresh(source: Source, msg: impl Into<String>) -> Self {
        Self::new(source, msg, EventType::Refresh, LogLevel::Debug)
    }

    pub fn error(source: Source, msg: impl Into<String>, log_level: LogLevel) -> Self {
        Self::new(source, msg, EventType::Error, log_level)
    }

    pub fn state_change(source: Source, msg: impl Into<String>) -> Self {
        Self::new(source, msg, EventType::StateChange, LogLevel::Debug)
    }

    pub fn should_display(&self) -> bool {
        // Always show success events and info level events
        if self.event_type == EventType::Success || self.log_level >= LogLevel::Info {
            return true;
        }
        // State changes only feed the controller, not the log view
        if self.event_type == EventType::StateChange {
            return false;
        }
        should_log_with_env(self.log_level)
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.event_type, self.timestamp, self.source, self.msg
        )
    }
}
