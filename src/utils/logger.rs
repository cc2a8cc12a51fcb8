//! Tracing setup

use tracing_subscriber::EnvFilter;

/// Verbosity the probe was started with
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Filter directive scoped to this crate
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "market_probe=trace",
            LogLevel::Debug => "market_probe=debug",
            LogLevel::Info => "market_probe=info",
            LogLevel::Warn => "market_probe=warn",
            LogLevel::Error => "market_probe=error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Install the global subscriber. An explicit RUST_LOG wins over the level
/// derived from the command line.
pub fn init_logger(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!(LogLevel::from_str("WARN"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str("loud"), None);
    }

    #[test]
    fn directives_stay_crate_scoped() {
        assert_eq!(LogLevel::Debug.directive(), "market_probe=debug");
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }
}
