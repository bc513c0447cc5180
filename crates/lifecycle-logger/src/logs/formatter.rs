//! Bounded JSON formatting of log events.
//!
//! [`LogStashFormatter`] turns a [`LogEvent`] into a single JSON document whose message and
//! context together stay within a configured byte budget.
//!
//! # Document Layout
//!
//! ```json
//! {
//!   "timestamp": "2024-01-01T00:00:00.000000Z",
//!   "level": "error",
//!   "message": "payment declined",
//!   "context": "{\"order\":42}",
//!   "extra": {"request_id": "r-1"},
//!   "_index_name": "checkout-logs"
//! }
//! ```
//!
//! `context` is embedded as a JSON string. `extra` is only present when the event carries
//! any. With a [`ColumnMap`] configured the document is remapped before serialization.
//!
//! # Budget
//!
//! The context may use `max_size - message.len()` bytes. An oversized context is handed to
//! the [`Truncate`] strategy. When the message alone leaves no room for even `{}`, the
//! message is cut to `max_size` bytes instead and the context is replaced by `{}`.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::logs::column_map::ColumnMap;
use crate::logs::constants::{DEFAULT_MAX_SIZE, EMPTY_CONTEXT, INDEX_NAME_FIELD, INDEX_NAME_KEY};
use crate::logs::event::LogEvent;
use crate::logs::truncator::{truncate_str, JsonTruncator, Truncate, TruncateError};

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Failed to truncate context: {0}")]
    Truncate(#[from] TruncateError),
    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Formats events for a size-constrained, index-based log store.
#[derive(Debug, Clone)]
pub struct LogStashFormatter<T: Truncate = JsonTruncator> {
    index: String,
    max_size: usize,
    column_map: Option<ColumnMap>,
    truncator: T,
}

impl LogStashFormatter {
    /// Creates a formatter writing to `index` with the default budget and truncator.
    #[must_use]
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            max_size: DEFAULT_MAX_SIZE,
            column_map: None,
            truncator: JsonTruncator::new(),
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            index: config.index_name.clone(),
            max_size: config.max_size,
            column_map: config.column_map.clone(),
            truncator: JsonTruncator::new(),
        }
    }
}

impl<T: Truncate> LogStashFormatter<T> {
    /// Replaces the truncation strategy.
    #[must_use]
    pub fn with_truncator<U: Truncate>(self, truncator: U) -> LogStashFormatter<U> {
        LogStashFormatter {
            index: self.index,
            max_size: self.max_size,
            column_map: self.column_map,
            truncator,
        }
    }

    #[must_use]
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    #[must_use]
    pub fn with_column_map(mut self, column_map: ColumnMap) -> Self {
        self.column_map = Some(column_map);
        self
    }

    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Formats `event` into a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Truncate`] when the truncator fails for any reason other than
    /// an invalid budget, and [`FormatError::Serialize`] if the document cannot be encoded.
    pub fn format(&self, event: LogEvent) -> Result<String, FormatError> {
        let LogEvent {
            timestamp,
            level,
            mut message,
            mut context,
            extra,
        } = event;

        let index = self.resolve_index(&mut context);

        let budget = i64::try_from(self.max_size)
            .unwrap_or(i64::MAX)
            .saturating_sub(i64::try_from(message.len()).unwrap_or(i64::MAX));
        let serialized = serde_json::to_string(&context)?;

        let context = if i64::try_from(serialized.len()).is_ok_and(|len| len <= budget) {
            serialized
        } else {
            match self.truncator.truncate(&serialized, budget) {
                Ok(truncated) => {
                    debug!(
                        budget,
                        original = serialized.len(),
                        truncated = truncated.len(),
                        "Context truncated"
                    );
                    truncated
                }
                Err(TruncateError::InvalidBudget { .. }) => {
                    warn!(
                        message_len = message.len(),
                        max_size = self.max_size,
                        "Message exhausts the budget, truncating message and dropping context"
                    );
                    message = truncate_str(&message, self.max_size).to_string();
                    EMPTY_CONTEXT.to_string()
                }
                Err(e) => return Err(e.into()),
            }
        };

        let mut document = Map::new();
        document.insert("timestamp".to_string(), Value::String(timestamp.render()));
        document.insert("level".to_string(), Value::String(level));
        document.insert("message".to_string(), Value::String(message));
        document.insert("context".to_string(), Value::String(context));
        if !extra.is_empty() {
            document.insert("extra".to_string(), Value::Object(extra));
        }
        document.insert(INDEX_NAME_FIELD.to_string(), Value::String(index));

        match &self.column_map {
            Some(column_map) => Ok(serde_json::to_string(&column_map.apply(&document))?),
            None => Ok(serde_json::to_string(&document)?),
        }
    }

    /// Takes the reserved index key out of the context and returns the destination index.
    ///
    /// Non-empty scalars override the index and are rendered as strings. `null`, `""`,
    /// `false`, zero and containers fall back to the formatter's index.
    fn resolve_index(&self, context: &mut Map<String, Value>) -> String {
        match context.shift_remove(INDEX_NAME_KEY) {
            Some(Value::String(index)) if !index.is_empty() => index,
            Some(Value::Number(n)) if n.as_f64().is_some_and(|f| f.abs() > 0.0) => n.to_string(),
            Some(Value::Bool(true)) => "true".to_string(),
            Some(other) => {
                debug!(value = %other, "Ignoring unusable {INDEX_NAME_KEY}");
                self.index.clone()
            }
            None => self.index.clone(),
        }
    }
}
