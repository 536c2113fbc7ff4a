//! # Blackjack
//!
//! A two-party blackjack game played over a small fixed-length binary
//! protocol on a local network.
//!
//! ## Architecture
//!
//! A server broadcasts UDP offers advertising its TCP port. A client picks
//! up an offer, connects, and asks for a number of rounds. The server then
//! drives each round through four phases:
//!
//! - **Dealing**: two cards to the player, one visible card to the dealer
//! - **PlayerTurn**: the player hits or stands; a bust ends the round
//! - **DealerTurn**: the dealer reveals and draws to 17
//! - **Resolved**: the outcome is sent
//!
//! ## Core Modules
//!
//! - [`game`]: cards, decks, hand totals, and the round state machine
//! - [`net`]: wire codec, discovery, server, and client
//! - [`config`]: server and client settings
//!
//! ## Example
//!
//! ```
//! use blackjack::entities::{Card, Suit, hand_value};
//!
//! let hand = [Card(1, Suit::Heart), Card(1, Suit::Spade), Card(9, Suit::Club)];
//! assert_eq!(hand_value(&hand), 21);
//! ```

/// Server and client settings.
pub mod config;

/// Networking components for client-server communication.
pub mod net;
pub use net::{
    client::{self, Client, Decider},
    discovery,
    errors::{ProtocolError, Result},
    messages, server, utils,
};

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    constants,
    entities::{self, Deck, Hand, Outcome, Tally},
    round::{self, Round},
};
