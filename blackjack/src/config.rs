//! Server and client configuration.
//!
//! Values are passed explicitly into the server and client entry points;
//! nothing here reads process-wide state.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use crate::net::messages::DISCOVERY_PORT;

/// Display name used when none is configured.
pub const DEFAULT_NAME: &str = "NoSocketsJustCards";

/// Time between offer broadcasts.
pub const DEFAULT_OFFER_INTERVAL: Duration = Duration::from_secs(1);

/// How long the server waits for a connecting client's request.
pub const DEFAULT_SERVER_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(15);

/// How long the server waits for each hit/stand decision.
pub const DEFAULT_SERVER_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// How long the client waits for the TCP connection to be established.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// How long the client waits for the server's acknowledgment.
pub const DEFAULT_CLIENT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// How long the client waits for each server payload.
pub const DEFAULT_CLIENT_READ_TIMEOUT: Duration = Duration::from_secs(8);

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

impl ConfigError {
    fn invalid(var: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var: var.to_string(),
            reason: reason.into(),
        }
    }
}

/// Per-connection read deadlines.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SessionTimeouts {
    /// Deadline for the initial request record.
    pub handshake: Duration,
    /// Deadline for every read once rounds have started.
    pub read: Duration,
}

impl SessionTimeouts {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.handshake.is_zero() {
            return Err(ConfigError::invalid("handshake_timeout", "Must be non-zero"));
        }
        if self.read.is_zero() {
            return Err(ConfigError::invalid("read_timeout", "Must be non-zero"));
        }
        if self.handshake < self.read {
            return Err(ConfigError::invalid(
                "handshake_timeout",
                format!("Must be at least the read timeout ({:?})", self.read),
            ));
        }
        Ok(())
    }
}

/// Everything a blackjack server needs to advertise itself and run sessions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Name advertised in offers.
    pub server_name: String,
    /// Address the TCP listener and broadcast socket bind to.
    pub bind_ip: IpAddr,
    /// TCP listen port. Zero picks an ephemeral port.
    pub tcp_port: u16,
    /// Where offers are sent.
    pub broadcast_addr: SocketAddr,
    pub offer_interval: Duration,
    pub timeouts: SessionTimeouts,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_name: DEFAULT_NAME.to_string(),
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            tcp_port: 0,
            broadcast_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::BROADCAST), DISCOVERY_PORT),
            offer_interval: DEFAULT_OFFER_INTERVAL,
            timeouts: SessionTimeouts {
                handshake: DEFAULT_SERVER_HANDSHAKE_TIMEOUT,
                read: DEFAULT_SERVER_READ_TIMEOUT,
            },
        }
    }
}

impl ServerConfig {
    /// Validate configuration after loading
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_name.trim().is_empty() {
            return Err(ConfigError::invalid("server_name", "Must not be empty"));
        }
        if self.offer_interval.is_zero() {
            return Err(ConfigError::invalid("offer_interval", "Must be non-zero"));
        }
        if self.broadcast_addr.port() == 0 {
            return Err(ConfigError::invalid("broadcast_addr", "Port must be non-zero"));
        }
        self.timeouts.validate()
    }
}

/// Settings for a blackjack client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Name sent in the request record.
    pub client_name: String,
    /// UDP port offers are received on.
    pub discovery_port: u16,
    pub connect_timeout: Duration,
    /// `handshake` bounds the acknowledgment read, `read` every payload.
    pub timeouts: SessionTimeouts,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_name: DEFAULT_NAME.to_string(),
            discovery_port: DISCOVERY_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeouts: SessionTimeouts {
                handshake: DEFAULT_CLIENT_HANDSHAKE_TIMEOUT,
                read: DEFAULT_CLIENT_READ_TIMEOUT,
            },
        }
    }
}

impl ClientConfig {
    /// Validate configuration after loading
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_name.trim().is_empty() {
            return Err(ConfigError::invalid("client_name", "Must not be empty"));
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::invalid("connect_timeout", "Must be non-zero"));
        }
        self.timeouts.validate()
    }
}
