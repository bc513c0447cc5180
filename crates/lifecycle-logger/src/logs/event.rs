//! Log event handed to the formatter.
//!
//! Events are built per call and owned by the caller. The context is an arbitrary
//! string-keyed JSON mapping, the level is opaque to the formatter.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Rendering of structured timestamps: microsecond precision with a literal UTC marker.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Event timestamp, either structured or already formatted by the producer.
///
/// Deserializing always yields [`Timestamp::Formatted`], so timestamps read from a
/// producer reach the sink untouched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Timestamp {
    DateTime(DateTime<Utc>),
    Formatted(String),
}

impl Timestamp {
    #[must_use]
    pub fn now() -> Self {
        Timestamp::DateTime(Utc::now())
    }

    /// Renders the timestamp for the output document.
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use lifecycle_logger::logs::event::Timestamp;
    ///
    /// let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
    /// assert_eq!(Timestamp::from(at).render(), "2024-03-09T07:05:01.000000Z");
    /// assert_eq!(Timestamp::from("yesterday".to_string()).render(), "yesterday");
    /// ```
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Timestamp::DateTime(at) => at.format(TIMESTAMP_FORMAT).to_string(),
            Timestamp::Formatted(formatted) => formatted.clone(),
        }
    }
}

impl From<String> for Timestamp {
    fn from(formatted: String) -> Self {
        Timestamp::Formatted(formatted)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Timestamp::DateTime(at)
    }
}

/// A structured log event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogEvent {
    #[serde(default = "Timestamp::now")]
    pub timestamp: Timestamp,
    pub level: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub context: Map<String, Value>,
    /// Producer supplied metadata kept next to the context, e.g. request identifiers.
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl LogEvent {
    /// Creates an event stamped with the current time and an empty context.
    #[must_use]
    pub fn new(level: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Timestamp::now(),
            level: level.into(),
            message: message.into(),
            context: Map::new(),
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<Timestamp>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    #[must_use]
    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_render_keeps_microseconds() {
        let at = Utc
            .with_ymd_and_hms(2021, 12, 31, 23, 59, 58)
            .unwrap()
            .checked_add_signed(chrono::Duration::microseconds(123_456))
            .unwrap();
        assert_eq!(
            Timestamp::from(at).render(),
            "2021-12-31T23:59:58.123456Z"
        );
    }

    #[test]
    fn test_deserialize_defaults() {
        let event: LogEvent = serde_json::from_value(json!({
            "timestamp": "2024-01-01 00:00:00",
            "level": "info",
        }))
        .unwrap();

        assert_eq!(
            event.timestamp,
            Timestamp::Formatted("2024-01-01 00:00:00".to_string())
        );
        assert_eq!(event.message, "");
        assert!(event.context.is_empty());
        assert!(event.extra.is_empty());
    }

    #[test]
    fn test_missing_timestamp_is_now() {
        let event: LogEvent = serde_json::from_value(json!({"level": "error"})).unwrap();
        assert!(matches!(event.timestamp, Timestamp::DateTime(_)));
    }
}
