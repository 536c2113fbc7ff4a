//! Server configuration management.
//!
//! Consolidates all environment variable reads. Command-line overrides win
//! over the environment, which wins over the library defaults.

use std::{
    net::{IpAddr, SocketAddr},
    time::Duration,
};

use blackjack::config::{ConfigError, ServerConfig};

/// Values given on the command line.
#[derive(Debug, Default)]
pub struct Overrides {
    pub server_name: Option<String>,
    pub bind_ip: Option<IpAddr>,
    pub tcp_port: Option<u16>,
    pub discovery_port: Option<u16>,
}

/// Load configuration from environment variables
///
/// # Errors
///
/// Returns error if the resulting configuration is invalid
pub fn from_env(overrides: Overrides) -> Result<ServerConfig, ConfigError> {
    from_lookup(|key| std::env::var(key).ok(), overrides)
}

fn from_lookup<L>(lookup: L, overrides: Overrides) -> Result<ServerConfig, ConfigError>
where
    L: Fn(&str) -> Option<String>,
{
    let defaults = ServerConfig::default();

    let server_name = overrides
        .server_name
        .or_else(|| lookup("BJ_SERVER_NAME"))
        .unwrap_or(defaults.server_name);
    let bind_ip = overrides
        .bind_ip
        .unwrap_or_else(|| parse_env_or(&lookup, "BJ_BIND_IP", defaults.bind_ip));
    let tcp_port = overrides
        .tcp_port
        .unwrap_or_else(|| parse_env_or(&lookup, "BJ_TCP_PORT", defaults.tcp_port));
    let discovery_port = overrides.discovery_port.unwrap_or_else(|| {
        parse_env_or(&lookup, "BJ_DISCOVERY_PORT", defaults.broadcast_addr.port())
    });

    let offer_interval = Duration::from_millis(parse_env_or(
        &lookup,
        "BJ_OFFER_INTERVAL_MS",
        defaults.offer_interval.as_millis() as u64,
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

    let config = ServerConfig {
        server_name,
        bind_ip,
        tcp_port,
        broadcast_addr: SocketAddr::new(defaults.broadcast_addr.ip(), discovery_port),
        offer_interval,
        timeouts,
    };
    config.validate()?;
    Ok(config)
}

/// Helper to parse environment variable with default fallback
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
    use std::{collections::HashMap, net::Ipv4Addr};

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = from_lookup(env(&[]), Overrides::default()).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_environment_values_are_read() {
        let config = from_lookup(
            env(&[
                ("BJ_SERVER_NAME", "Dealer Dan"),
                ("BJ_BIND_IP", "127.0.0.1"),
                ("BJ_TCP_PORT", "7000"),
                ("BJ_DISCOVERY_PORT", "14000"),
                ("BJ_OFFER_INTERVAL_MS", "250"),
                ("BJ_HANDSHAKE_TIMEOUT_SECS", "20"),
                ("BJ_READ_TIMEOUT_SECS", "5"),
            ]),
            Overrides::default(),
        )
        .unwrap();

        assert_eq!(config.server_name, "Dealer Dan");
        assert_eq!(config.bind_ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.tcp_port, 7000);
        assert_eq!(config.broadcast_addr.port(), 14000);
        assert_eq!(config.broadcast_addr.ip(), IpAddr::V4(Ipv4Addr::BROADCAST));
        assert_eq!(config.offer_interval, Duration::from_millis(250));
        assert_eq!(config.timeouts.handshake, Duration::from_secs(20));
        assert_eq!(config.timeouts.read, Duration::from_secs(5));
    }

    #[test]
    fn test_overrides_beat_environment() {
        let config = from_lookup(
            env(&[("BJ_SERVER_NAME", "from env"), ("BJ_TCP_PORT", "7000")]),
            Overrides {
                server_name: Some("from args".to_string()),
                tcp_port: Some(8000),
                ..Overrides::default()
            },
        )
        .unwrap();
        assert_eq!(config.server_name, "from args");
        assert_eq!(config.tcp_port, 8000);
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let config = from_lookup(
            env(&[("BJ_TCP_PORT", "not a port"), ("BJ_BIND_IP", "999.1.1.1")]),
            Overrides::default(),
        )
        .unwrap();
        assert_eq!(config.tcp_port, 0);
        assert_eq!(config.bind_ip, ServerConfig::default().bind_ip);
    }

    #[test]
    fn test_invalid_result_is_rejected() {
        let err = from_lookup(env(&[("BJ_OFFER_INTERVAL_MS", "0")]), Overrides::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "offer_interval"));

        let err = from_lookup(
            env(&[
                ("BJ_HANDSHAKE_TIMEOUT_SECS", "2"),
                ("BJ_READ_TIMEOUT_SECS", "9"),
            ]),
            Overrides::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("handshake_timeout"));
    }
}
