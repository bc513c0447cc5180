//! Metric-only projection of log events.
//!
//! Metric events carry their payload in the context: `value` is the measurement and
//! `info` an optional annotation. Everything else about the event is discarded.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::logs::event::LogEvent;

/// A single metric sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    /// `context.value`, or `null` when absent.
    pub value: Value,
    /// Unix seconds (UTC) at formatting time.
    pub timestamp: i64,
    /// `context.info`, omitted when absent or `null`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricFormatter;

impl MetricFormatter {
    #[must_use]
    pub fn format(&self, event: &LogEvent) -> MetricRecord {
        self.format_at(event, Utc::now())
    }

    /// Same as [`MetricFormatter::format`] with an explicit clock.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn format_at(&self, event: &LogEvent, now: DateTime<Utc>) -> MetricRecord {
        MetricRecord {
            value: event.context.get("value").cloned().unwrap_or(Value::Null),
            timestamp: now.timestamp(),
            info: event.context.get("info").filter(|info| !info.is_null()).cloned(),
        }
    }
}
