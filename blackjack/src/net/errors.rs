//! Protocol error types for encoding, decoding, and session I/O.

use std::{io, time::Duration};

use thiserror::Error;

use super::messages::MessageKind;
use crate::{config::ConfigError, game::entities::DeckExhausted};

/// Errors that can occur while speaking the blackjack protocol.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Wrong length, magic cookie, or message-type tag.
    #[error("malformed {kind} message: {reason}")]
    MalformedMessage { kind: MessageKind, reason: String },

    /// A field value outside its declared domain.
    #[error("invalid {field}: {value}")]
    InvalidField { field: &'static str, value: String },

    /// The client sent a decision that isn't hit or stand.
    #[error("invalid decision {0:?}")]
    InvalidDecision(String),

    /// The peer sent a card where only a round result is legal.
    #[error("expected {expected}, got another card")]
    OutOfSequence { expected: &'static str },

    #[error(transparent)]
    Deck(#[from] DeckExhausted),

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Io(io::Error),

    #[error("failed to encode message: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// The local player couldn't produce a decision, e.g. their input closed.
    #[error("player input failed: {0}")]
    Decider(io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ProtocolError {
    pub(crate) fn malformed(kind: MessageKind, reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(field: &'static str, value: impl ToString) -> Self {
        Self::InvalidField {
            field,
            value: value.to_string(),
        }
    }

    /// Whether the error came from the transport rather than the protocol.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::ConnectionClosed | Self::Timeout(_) | Self::Io(_))
    }
}

impl From<io::Error> for ProtocolError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Self::ConnectionClosed,
            _ => Self::Io(error),
        }
    }
}

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
