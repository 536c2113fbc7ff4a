//! Blackjack game engine: cards, decks, hand totals, and the round FSM.

pub mod constants;
pub mod entities;
pub mod round;
