//! Transport protocol selection for the log sink.
//!
//! Only the selector lives here. Opening sockets is left to whatever writer the caller
//! plugs in.
//!
//! # Configuration
//!
//! - **Environment variable**: `LIFECYCLE_LOGGER_TRANSPORT_PROTOCOL=udp`
//! - **YAML config**: `transport_protocol: udp`

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer};
use tracing::error;

/// Transport layer protocol used to reach the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    /// Stream transport. Delivery is acknowledged by the sink.
    #[default]
    Tcp,
    /// Datagram transport. Documents must fit a single datagram.
    Udp,
}

impl Protocol {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            _ => Err(format!(
                "Invalid transport protocol: '{s}'. Valid protocols are: tcp, udp"
            )),
        }
    }
}

impl Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lenient deserialization: unknown protocols are logged and fall back to `Tcp`.
impl<'de> Deserialize<'de> for Protocol {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match Protocol::from_str(&s) {
            Ok(protocol) => Ok(protocol),
            Err(e) => {
                error!("{}, using tcp", e);
                Ok(Protocol::Tcp)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_protocols() {
        assert_eq!(Protocol::from_str("TCP").unwrap(), Protocol::Tcp);
        assert_eq!(Protocol::from_str("udp").unwrap(), Protocol::Udp);
        assert!(Protocol::from_str("sctp").is_err());
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(Protocol::Udp.to_string(), "udp");
        assert_eq!(Protocol::Tcp.as_str(), "tcp");
    }

    #[test]
    fn test_unknown_protocol_deserializes_to_tcp() {
        let protocol: Protocol = serde_json::from_value(json!("quic")).unwrap();
        assert_eq!(protocol, Protocol::Tcp);
    }
}
