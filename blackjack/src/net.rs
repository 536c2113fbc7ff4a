//! Networking layer for client-server communication.
//!
//! Every record has a fixed length, so framing is just reading the right
//! number of bytes. The server runs on `tokio` with one task per
//! connection.

/// Client session driver.
pub mod client;

/// UDP offer broadcasting and listening.
pub mod discovery;

/// Protocol error types.
pub mod errors;

/// Wire records and their codec.
pub mod messages;

/// Offer broadcaster, accept loop, and per-connection session handler.
pub mod server;

/// Reading and writing records with deadlines.
pub mod utils;
