//! Log level configuration for the lifecycle logger's own diagnostics.
//!
//! This module defines the `LogLevel` enum and provides parsing from strings (case-insensitive)
//! and deserialization from config files and environment variables.
//!
//! # Log Levels
//!
//! Five levels are supported, ordered from least to most verbose:
//! - **ERROR**: Failures that drop events
//! - **WARN**: Recoverable problems such as skipped input lines (default)
//! - **INFO**: Pipeline start and stop
//! - **DEBUG**: Truncation decisions and token discovery
//! - **TRACE**: Everything else
//!
//! # Configuration
//!
//! - **Environment variable**: `LIFECYCLE_LOGGER_LOG_LEVEL=debug`
//! - **YAML config**: `log_level: debug`
//!
//! Invalid values fall back to **WARN**.

use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// Verbosity of the crate's own diagnostics.
///
/// ```
/// use lifecycle_logger::config::log_level::LogLevel;
/// use std::str::FromStr;
///
/// assert_eq!(LogLevel::from_str("DeBuG").unwrap(), LogLevel::Debug);
/// assert!(LogLevel::from_str("verbose").is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl AsRef<str> for LogLevel {
    fn as_ref(&self) -> &str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

impl LogLevel {
    /// Converts this `LogLevel` to the `tracing` level filter installed by the binary.
    #[must_use]
    pub fn as_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Invalid log level: '{s}'. Valid levels are: error, warn, info, debug, trace",
            )),
        }
    }
}

/// Lenient deserialization: invalid or non-string values are logged and become `Warn`.
impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;

        if let Value::String(s) = value {
            match LogLevel::from_str(&s) {
                Ok(level) => Ok(level),
                Err(e) => {
                    error!("{}", e);
                    Ok(LogLevel::Warn)
                }
            }
        } else {
            error!("Expected a string for log level, got {:?}", value);
            Ok(LogLevel::Warn)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!(LogLevel::from_str("ERROR").unwrap(), LogLevel::Error);
        assert_eq!(LogLevel::from_str(" trace ").unwrap(), LogLevel::Trace);
        assert_eq!(LogLevel::from_str("Warning").unwrap(), LogLevel::Warn);
    }

    #[test]
    fn test_invalid_values_default_to_warn() {
        let level: LogLevel = serde_json::from_value(json!("loud")).unwrap();
        assert_eq!(level, LogLevel::Warn);

        let level: LogLevel = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(level, LogLevel::Warn);
    }

    #[test]
    fn test_level_filter_and_display() {
        assert_eq!(LogLevel::Debug.as_level_filter(), LevelFilter::DEBUG);
        assert_eq!(LogLevel::Info.as_ref(), "INFO");
    }
}
