//! Client configuration management.

use std::time::Duration;

use blackjack::config::{ClientConfig, ConfigError};

/// Values given on the command line.
#[derive(Debug, Default)]
pub struct Overrides {
    pub client_name: Option<String>,
    pub discovery_port: Option<u16>,
}

/// Load configuration from environment variables
///
/// # Errors
///
/// Returns error if the resulting configuration is invalid
pub fn from_env(overrides: Overrides) -> Result<ClientConfig, ConfigError> {
    from_lookup(|key| std::env::var(key).ok(), overrides)
}

pub(crate) fn from_lookup<L>(lookup: L, overrides: Overrides) -> Result<ClientConfig, ConfigError>
where
    L: Fn(&str) -> Option<String>,
{
    let defaults = ClientConfig::default();

    let client_name = overrides
        .client_name
        .or_else(|| lookup("BJ_CLIENT_NAME"))
        .unwrap_or(defaults.client_name);
    let discovery_port = overrides.discovery_port.unwrap_or_else(|| {
        parse_env_or(&lookup, "BJ_DISCOVERY_PORT", defaults.discovery_port)
    });
    let connect_timeout = Duration::from_secs(parse_env_or(
        &lookup,
        "BJ_CONNECT_TIMEOUT_SECS",
        defaults.connect_timeout.as_secs(),
    ));

    let mut timeouts = defaults.timeouts;
    timeouts.handshake = Duration::from_secs(parse_env_or(
        &lookup,
        "BJ_HANDSHAKE_TIMEOUT_SECS",
        timeouts.handshake.as_secs(),
    ));
    timeouts.read = Duration::from_secs(parse_env_or(
        &lookup,
        "BJ_READ_TIMEOUT_SECS",
        timeouts.read.as_secs(),
    ));

    let config = ClientConfig {
        client_name,
        discovery_port,
        connect_timeout,
        timeouts,
    };
    config.validate()?;
    Ok(config)
}

fn parse_env_or<L, T>(lookup: &L, key: &str, default: T) -> T
where
    L: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn none(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = from_lookup(none, Overrides::default()).unwrap();
        assert_eq!(config.client_name, "NoSocketsJustCards");
        assert_eq!(config.discovery_port, 13122);
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.timeouts.handshake, Duration::from_secs(10));
        assert_eq!(config.timeouts.read, Duration::from_secs(8));
    }

    #[test]
    fn test_environment_and_overrides() {
        let lookup = |key: &str| match key {
            "BJ_CLIENT_NAME" => Some("env name".to_string()),
            "BJ_DISCOVERY_PORT" => Some("15000".to_string()),
            "BJ_READ_TIMEOUT_SECS" => Some("4".to_string()),
            _ => None,
        };
        let config = from_lookup(
            lookup,
            Overrides {
                client_name: Some("cli name".to_string()),
                discovery_port: None,
            },
        )
        .unwrap();
        assert_eq!(config.client_name, "cli name");
        assert_eq!(config.discovery_port, 15000);
        assert_eq!(config.timeouts.read, Duration::from_secs(4));
    }

    #[test]
    fn test_zero_connect_timeout_rejected() {
        let lookup = |key: &str| (key == "BJ_CONNECT_TIMEOUT_SECS").then(|| "0".to_string());
        let err = from_lookup(lookup, Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("connect_timeout"));
    }
}
