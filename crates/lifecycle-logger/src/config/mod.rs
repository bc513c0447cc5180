//! Configuration Module
//!
//! This module handles all configuration for the lifecycle logger, including parsing from
//! environment variables, YAML files, and providing sensible defaults.
//!
//! ## Configuration Priority
//!
//! Configuration sources are applied in the following order (later sources override earlier):
//!
//! 1. **Defaults** - Hard-coded defaults in the code
//! 2. **YAML file** - Configuration from `lifecycle-logger.yaml` (if present)
//! 3. **Environment variables** - `LIFECYCLE_LOGGER_*` environment variables (highest priority)
//!
//! ## Edge Cases and Behaviors
//!
//! ### Budget
//!
//! - **Default**: the sink-wide document limit minus the envelope reservation
//! - **Too small**: `validate` rejects budgets that cannot hold an empty JSON object
//! - **Unparseable**: logged and ignored, the previous value is kept
//!
//! ### Levels
//!
//! - **`accepted_levels` empty**: every event is accepted
//! - **Comma separated or list**: both `"error,warn"` and `[error, warn]` work
//!
//! ### Whitespace Handling
//!
//! String values are trimmed before use. Empty strings after trimming are ignored.

pub mod env;
pub mod log_level;
pub mod protocol;
pub mod yaml;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use std::path::{Path, PathBuf};
use tracing::{debug, error};

use crate::config::{
    env::EnvConfigSource, log_level::LogLevel, protocol::Protocol, yaml::YamlConfigSource,
};
use crate::logs::{column_map::ColumnMap, constants::DEFAULT_MAX_SIZE, truncator::MIN_JSON_SIZE};

/// Name of the YAML configuration file looked up in the configuration directory.
pub const CONFIG_FILE_NAME: &str = "lifecycle-logger.yaml";

/// Prefix shared by every environment variable read by [`env::EnvConfigSource`].
pub const ENV_PREFIX: &str = "LIFECYCLE_LOGGER_";

/// Index used when an event does not name one itself.
pub const DEFAULT_INDEX_NAME: &str = "logs";

/// Helper macro to merge Option<String> fields to String fields
///
/// Providing one field argument will merge the value from the source config field into the config
/// field.
///
/// Providing two field arguments will merge the value from the source config field into the config
/// field if the value is not empty.
#[macro_export]
macro_rules! merge_string {
    ($config:expr, $config_field:ident, $source:expr, $source_field:ident) => {
        if let Some(value) = &$source.$source_field {
            $config.$config_field.clone_from(value);
        }
    };
    ($config:expr, $source:expr, $field:ident) => {
        if let Some(value) = &$source.$field {
            $config.$field.clone_from(value);
        }
    };
}

/// Helper macro to merge Option<T> fields where T implements Clone
#[macro_export]
macro_rules! merge_option {
    ($config:expr, $config_field:ident, $source:expr, $source_field:ident) => {
        if $source.$source_field.is_some() {
            $config.$config_field.clone_from(&$source.$source_field);
        }
    };
    ($config:expr, $source:expr, $field:ident) => {
        if $source.$field.is_some() {
            $config.$field.clone_from(&$source.$field);
        }
    };
}

/// Helper macro to merge Option<T> fields to T fields when Option<T> is Some
#[macro_export]
macro_rules! merge_option_to_value {
    ($config:expr, $config_field:ident, $source:expr, $source_field:ident) => {
        if let Some(value) = &$source.$source_field {
            $config.$config_field = value.clone();
        }
    };
    ($config:expr, $source:expr, $field:ident) => {
        if let Some(value) = &$source.$field {
            $config.$field = value.clone();
        }
    };
}

/// Helper macro to merge `Vec` fields when `Vec` is not empty
#[macro_export]
macro_rules! merge_vec {
    ($config:expr, $config_field:ident, $source:expr, $source_field:ident) => {
        if !$source.$source_field.is_empty() {
            $config.$config_field.clone_from(&$source.$source_field);
        }
    };
    ($config:expr, $source:expr, $field:ident) => {
        if !$source.$field.is_empty() {
            $config.$field.clone_from(&$source.$field);
        }
    };
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    ParseError(String),
}

pub trait ConfigSource {
    fn load(&self, config: &mut Config) -> Result<(), ConfigError>;
}

#[derive(Default)]
pub struct ConfigBuilder {
    sources: Vec<Box<dyn ConfigSource>>,
    config: Config,
}

impl ConfigBuilder {
    #[must_use]
    pub fn add_source(mut self, source: Box<dyn ConfigSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn build(&mut self) -> Config {
        let mut failed_sources = 0;
        for source in &self.sources {
            match source.load(&mut self.config) {
                Ok(()) => (),
                Err(e) => {
                    error!("Failed to load config: {:?}", e);
                    failed_sources += 1;
                }
            }
        }

        if !self.sources.is_empty() && failed_sources == self.sources.len() {
            debug!("All sources failed to load config, using default config.");
        }

        let index_name = self.config.index_name.trim().to_string();
        self.config.index_name = if index_name.is_empty() {
            DEFAULT_INDEX_NAME.to_string()
        } else {
            index_name
        };

        self.config.clone()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Config {
    /// Verbosity of the crate's own diagnostics.
    pub log_level: LogLevel,
    /// Destination index used when the event context does not carry `es_index_name`.
    pub index_name: String,
    /// Byte budget shared by message and context.
    pub max_size: usize,
    /// Optional remapping of event fields to storage columns.
    pub column_map: Option<ColumnMap>,
    /// Levels let through by the level filter. Empty accepts everything.
    pub accepted_levels: Vec<String>,
    /// Transport selected for the sink.
    pub transport_protocol: Protocol,
    /// Base directory for per-token audit records. `None` disables them.
    pub lifecycle_token_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            index_name: DEFAULT_INDEX_NAME.to_string(),
            max_size: DEFAULT_MAX_SIZE,
            column_map: None,
            accepted_levels: Vec::new(),
            transport_protocol: Protocol::default(),
            lifecycle_token_dir: None,
        }
    }
}

impl Config {
    /// Validates the configuration for consistency.
    ///
    /// The byte budget must at least hold an empty JSON object, otherwise every
    /// event would take the message truncation fallback.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_size < MIN_JSON_SIZE {
            return Err(format!(
                "Invalid configuration: max_size is {} bytes, at least {MIN_JSON_SIZE} bytes are required",
                self.max_size
            ));
        }
        if let Some(column_map) = &self.column_map {
            if column_map.is_empty() {
                return Err(
                    "Invalid configuration: column_map is set but maps no fields".to_string(),
                );
            }
        }
        Ok(())
    }
}

/// Load configuration from the YAML file in `config_directory` and environment variables.
///
/// This loads configuration in priority order:
/// 1. Defaults
/// 2. YAML file (`lifecycle-logger.yaml`)
/// 3. Environment variables (highest priority)
#[inline]
#[must_use]
pub fn get_config(config_directory: &Path) -> Config {
    let path: PathBuf = config_directory.join(CONFIG_FILE_NAME);
    ConfigBuilder::default()
        .add_source(Box::new(YamlConfigSource { path }))
        .add_source(Box::new(EnvConfigSource))
        .build()
}

pub fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        other => {
            error!(
                "Failed to parse value, expected a string, got: {}, ignoring",
                other
            );
            Ok(None)
        }
    }
}

pub fn deserialize_option_lossless<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match Option::<T>::deserialize(deserializer) {
        Ok(value) => Ok(value),
        Err(e) => {
            error!("Failed to deserialize optional value: {}, ignoring", e);
            Ok(None)
        }
    }
}

/// Deserializes a list of strings given either as `"a,b"` or as a sequence.
pub fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::String(s) => s.split(',').map(str::to_string).collect::<Vec<_>>(),
        Value::Array(values) => values
            .into_iter()
            .filter_map(|value| match value {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                other => {
                    error!("Failed to parse list item {}, ignoring", other);
                    None
                }
            })
            .collect(),
        other => {
            error!(
                "Failed to parse value, expected a list or a comma separated string, got: {}, ignoring",
                other
            );
            Vec::new()
        }
    };

    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub mod tests {
    use super::*;

    #[test]
    fn test_parse_default() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            let config = get_config(Path::new(""));
            assert_eq!(config, Config::default());
            assert_eq!(config.max_size, 32_765 - 350);
            assert_eq!(config.index_name, "logs");
            Ok(())
        });
    }

    #[test]
    fn test_precedence() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                CONFIG_FILE_NAME,
                r"
                index_name: yaml-index
                max_size: 2048
            ",
            )?;
            jail.set_env("LIFECYCLE_LOGGER_INDEX_NAME", "env-index");
            let config = get_config(Path::new(""));
            assert_eq!(config.index_name, "env-index");
            assert_eq!(config.max_size, 2048);
            Ok(())
        });
    }

    #[test]
    fn test_parse_env() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("LIFECYCLE_LOGGER_LOG_LEVEL", "DEBUG");
            jail.set_env("LIFECYCLE_LOGGER_MAX_SIZE", "1000");
            jail.set_env("LIFECYCLE_LOGGER_ACCEPTED_LEVELS", "error, warn");
            jail.set_env("LIFECYCLE_LOGGER_TRANSPORT_PROTOCOL", "udp");
            jail.set_env("LIFECYCLE_LOGGER_LIFECYCLE_TOKEN_DIR", "/tmp/tokens");
            let config = get_config(Path::new(""));
            assert_eq!(config.log_level, LogLevel::Debug);
            assert_eq!(config.max_size, 1000);
            assert_eq!(config.accepted_levels, vec!["error", "warn"]);
            assert_eq!(config.transport_protocol, Protocol::Udp);
            assert_eq!(
                config.lifecycle_token_dir,
                Some(PathBuf::from("/tmp/tokens"))
            );
            Ok(())
        });
    }

    #[test]
    fn test_blank_index_name_uses_default() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("LIFECYCLE_LOGGER_INDEX_NAME", "   ");
            let config = get_config(Path::new(""));
            assert_eq!(config.index_name, DEFAULT_INDEX_NAME);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_max_size_is_ignored() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("LIFECYCLE_LOGGER_MAX_SIZE", "lots");
            let config = get_config(Path::new(""));
            assert_eq!(config.max_size, DEFAULT_MAX_SIZE);
            Ok(())
        });
    }

    #[test]
    fn test_validate_rejects_tiny_budget() {
        let config = Config {
            max_size: 1,
            ..Config::default()
        };
        assert!(config.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_deserialize_string_list() {
        #[derive(Deserialize)]
        struct Levels {
            #[serde(deserialize_with = "deserialize_string_list")]
            levels: Vec<String>,
        }

        let from_string: Levels =
            serde_json::from_value(serde_json::json!({"levels": "error,,warn "})).unwrap();
        assert_eq!(from_string.levels, vec!["error", "warn"]);

        let from_list: Levels =
            serde_json::from_value(serde_json::json!({"levels": ["info", 3, null]})).unwrap();
        assert_eq!(from_list.levels, vec!["info", "3"]);

        let from_other: Levels =
            serde_json::from_value(serde_json::json!({"levels": true})).unwrap();
        assert!(from_other.levels.is_empty());
    }
}
