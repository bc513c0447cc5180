//! YAML file-based configuration.
//!
//! The YAML file is the only place where a column map can be configured, since it is a
//! nested structure.
//!
//! # Example Configuration
//!
//! ```yaml
//! log_level: info
//! index_name: checkout-logs
//! max_size: 16000
//! accepted_levels: [error, warn]
//! transport_protocol: udp
//! lifecycle_token_dir: /var/run/lifecycle
//! column_map:
//!   timestamp: ts
//!   level: severity
//!   message: msg
//!   context: ctx
//!   _index_name: index
//!   extra:
//!     request_id: request
//! ```

use std::path::PathBuf;

use crate::{
    config::{
        deserialize_option_lossless, deserialize_optional_string, deserialize_string_list,
        log_level::LogLevel, protocol::Protocol, Config, ConfigError, ConfigSource,
    },
    logs::column_map::ColumnMap,
    merge_option, merge_option_to_value, merge_string, merge_vec,
};

use figment::{
    providers::{Format, Yaml},
    Figment,
};
use serde::Deserialize;

/// `YamlConfig` represents the fields of `lifecycle-logger.yaml`.
///
/// It is deserialized from the file and then merged into [`Config`].
#[derive(Debug, PartialEq, Deserialize, Clone, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub log_level: Option<LogLevel>,
    #[serde(deserialize_with = "deserialize_optional_string")]
    pub index_name: Option<String>,
    #[serde(deserialize_with = "deserialize_option_lossless")]
    pub max_size: Option<usize>,
    #[serde(deserialize_with = "deserialize_option_lossless")]
    pub column_map: Option<ColumnMap>,
    #[serde(deserialize_with = "deserialize_string_list")]
    pub accepted_levels: Vec<String>,
    pub transport_protocol: Option<Protocol>,
    #[serde(deserialize_with = "deserialize_optional_string")]
    pub lifecycle_token_dir: Option<String>,
}

fn merge_config(config: &mut Config, yaml_config: &YamlConfig) {
    merge_option_to_value!(config, yaml_config, log_level);
    merge_string!(config, yaml_config, index_name);
    merge_option_to_value!(config, yaml_config, max_size);
    merge_option!(config, yaml_config, column_map);
    merge_vec!(config, yaml_config, accepted_levels);
    merge_option_to_value!(config, yaml_config, transport_protocol);

    if let Some(dir) = &yaml_config.lifecycle_token_dir {
        config.lifecycle_token_dir = Some(PathBuf::from(dir));
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct YamlConfigSource {
    pub path: PathBuf,
}

impl ConfigSource for YamlConfigSource {
    fn load(&self, config: &mut Config) -> Result<(), ConfigError> {
        let figment = Figment::new().merge(Yaml::file(self.path.clone()));

        match figment.extract::<YamlConfig>() {
            Ok(yaml_config) => merge_config(config, &yaml_config),
            Err(e) => {
                return Err(ConfigError::ParseError(format!(
                    "Failed to parse config from yaml file: {e}, using default config."
                )));
            }
        }

        Ok(())
    }
}
