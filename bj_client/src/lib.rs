//! Internal modules for the blackjack client.
//!
//! This library provides input parsing, configuration, and the interactive
//! player used by the bj_client binary.

pub mod commands;
pub mod config;
pub mod prompt;
