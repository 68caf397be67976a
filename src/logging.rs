use std::env;

/// Severity attached to dashboard events, ordered from least to most severe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::Level::Trace,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

pub fn get_rust_log_level() -> LogLevel {
    let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    parse_rust_log_level(&rust_log)
}

/// Level for this crate from a `RUST_LOG` value. A `metrics_dashboard=<level>`
/// directive wins over a bare `<level>`; directives for other crates are
/// ignored and anything unparsable means `Info`.
pub fn parse_rust_log_level(rust_log: &str) -> LogLevel {
    let mut bare = None;
    for directive in rust_log.split(',').map(str::trim) {
        match directive.split_once('=') {
            Some((target, level)) if target == env!("CARGO_CRATE_NAME") => {
                if let Some(level) = level_from_str(level) {
                    return level;
                }
            }
            Some(_) => {}
            None if bare.is_none() => bare = level_from_str(directive),
            None => {}
        }
    }
    bare.unwrap_or(LogLevel::Info)
}

fn level_from_str(level: &str) -> Option<LogLevel> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Some(LogLevel::Trace),
        "debug" => Some(LogLevel::Debug),
        "info" => Some(LogLevel::Info),
        "warn" | "warning" => Some(LogLevel::Warn),
        "error" => Some(LogLevel::Error),
        _ => None,
    }
}

pub fn should_log(event_level: LogLevel, threshold: LogLevel) -> bool {
    event_level >= threshold
}

pub fn should_log_with_env(event_level: LogLevel) -> bool {
    let threshold = get_rust_log_level();
    should_log(event_level, threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rust_log_level() {
        assert_eq!(parse_rust_log_level("debug"), LogLevel::Debug);
        assert_eq!(parse_rust_log_level("info"), LogLevel::Info);
        assert_eq!(parse_rust_log_level("warn"), LogLevel::Warn);
        assert_eq!(parse_rust_log_level("error"), LogLevel::Error);
        assert_eq!(parse_rust_log_level("trace"), LogLevel::Trace);

        // Module-specific formats
        assert_eq!(
            parse_rust_log_level("metrics_dashboard=debug"),
            LogLevel::Debug
        );
        assert_eq!(
            parse_rust_log_level("reqwest=info,metrics_dashboard=warn"),
            LogLevel::Warn
        );
        assert_eq!(
            parse_rust_log_level("info, metrics_dashboard=debug"),
            LogLevel::Debug
        );
        // Other crates' directives say nothing about this one
        assert_eq!(parse_rust_log_level("hyper=trace"), LogLevel::Info);

        assert_eq!(parse_rust_log_level("invalid"), LogLevel::Info);
    }

    #[test]
    fn test_should_log() {
        assert!(should_log(LogLevel::Error, LogLevel::Debug));
        assert!(should_log(LogLevel::Warn, LogLevel::Warn));
        assert!(!should_log(LogLevel::Debug, LogLevel::Error));
        assert!(!should_log(LogLevel::Info, LogLevel::Error));
    }

    #[test]
    fn test_level_conversion_preserves_order() {
        assert_eq!(log::Level::from(LogLevel::Warn), log::Level::Warn);
        assert!(log::Level::from(LogLevel::Trace) > log::Level::from(LogLevel::Error));
    }
}
