use super::entities::Rank;

/// Highest hand total that doesn't bust.
pub const BLACKJACK: u32 = 21;

/// The dealer keeps drawing while their total is below this.
pub const DEALER_STANDS_ON: u32 = 17;

/// Number of cards in a fresh deck (13 ranks x 4 suits).
pub const DECK_SIZE: usize = 52;

/// Cards dealt face-up to the player before their first decision.
pub const INITIAL_PLAYER_CARDS: usize = 2;

pub const ACE: Rank = 1;
pub const JACK: Rank = 11;
pub const QUEEN: Rank = 12;
pub const KING: Rank = 13;

/// Points an ace is worth before soft-ace reduction.
pub const ACE_HIGH_POINTS: u32 = 11;

/// Points removed from a total when an ace is demoted from 11 to 1.
pub const ACE_REDUCTION: u32 = 10;
