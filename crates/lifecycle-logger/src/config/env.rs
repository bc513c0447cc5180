//! Environment variable configuration source.
//!
//! Every `LIFECYCLE_LOGGER_*` variable maps onto the field of the same name with the
//! prefix stripped and the remainder lowercased, e.g. `LIFECYCLE_LOGGER_MAX_SIZE`
//! sets `max_size`.
//!
//! | Variable | Example |
//! |----------|---------|
//! | `LIFECYCLE_LOGGER_LOG_LEVEL` | `debug` |
//! | `LIFECYCLE_LOGGER_INDEX_NAME` | `checkout-logs` |
//! | `LIFECYCLE_LOGGER_MAX_SIZE` | `16000` |
//! | `LIFECYCLE_LOGGER_ACCEPTED_LEVELS` | `error,warn` |
//! | `LIFECYCLE_LOGGER_TRANSPORT_PROTOCOL` | `udp` |
//! | `LIFECYCLE_LOGGER_LIFECYCLE_TOKEN_DIR` | `/var/run/lifecycle` |
//!
//! Column maps are nested and only read from the YAML file.

use std::path::PathBuf;

use figment::{providers::Env, Figment};
use serde::Deserialize;

use crate::{
    config::{
        deserialize_option_lossless, deserialize_optional_string, deserialize_string_list,
        log_level::LogLevel, protocol::Protocol, Config, ConfigError, ConfigSource, ENV_PREFIX,
    },
    merge_option_to_value, merge_string, merge_vec,
};

/// Fields read from the environment.
#[derive(Debug, PartialEq, Deserialize, Clone, Default)]
#[serde(default)]
pub struct EnvConfig {
    pub log_level: Option<LogLevel>,
    #[serde(deserialize_with = "deserialize_optional_string")]
    pub index_name: Option<String>,
    #[serde(deserialize_with = "deserialize_option_lossless")]
    pub max_size: Option<usize>,
    #[serde(deserialize_with = "deserialize_string_list")]
    pub accepted_levels: Vec<String>,
    pub transport_protocol: Option<Protocol>,
    #[serde(deserialize_with = "deserialize_optional_string")]
    pub lifecycle_token_dir: Option<String>,
}

fn merge_config(config: &mut Config, env_config: &EnvConfig) {
    merge_option_to_value!(config, env_config, log_level);
    merge_string!(config, env_config, index_name);
    merge_option_to_value!(config, env_config, max_size);
    merge_vec!(config, env_config, accepted_levels);
    merge_option_to_value!(config, env_config, transport_protocol);

    if let Some(dir) = &env_config.lifecycle_token_dir {
        config.lifecycle_token_dir = Some(PathBuf::from(dir));
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnvConfigSource;

impl ConfigSource for EnvConfigSource {
    fn load(&self, config: &mut Config) -> Result<(), ConfigError> {
        let figment = Figment::new().merge(Env::prefixed(ENV_PREFIX));

        match figment.extract::<EnvConfig>() {
            Ok(env_config) => merge_config(config, &env_config),
            Err(e) => {
                return Err(ConfigError::ParseError(format!(
                    "Failed to parse config from environment variables: {e}, using default config."
                )));
            }
        }

        Ok(())
    }
}
