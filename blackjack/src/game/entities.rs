use rand::{Rng, seq::SliceRandom};
use std::fmt;
use thiserror::Error;

use super::constants::{
    ACE, ACE_HIGH_POINTS, ACE_REDUCTION, BLACKJACK, DECK_SIZE, JACK, KING, QUEEN,
};

/// Suits in wire order: hearts are 0, spades are 3.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Suit {
    Heart,
    Diamond,
    Club,
    Spade,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Heart, Suit::Diamond, Suit::Club, Suit::Spade];

    #[must_use]
    pub fn to_wire(self) -> u8 {
        match self {
            Self::Heart => 0,
            Self::Diamond => 1,
            Self::Club => 2,
            Self::Spade => 3,
        }
    }

    #[must_use]
    pub fn from_wire(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Heart => "♥",
            Self::Diamond => "♦",
            Self::Club => "♣",
            Self::Spade => "♠",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card ranks (ace=1u8 ... king=13u8).
pub type Rank = u8;

/// A card is a tuple of a rank and a suit.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Card(pub Rank, pub Suit);

impl Card {
    #[must_use]
    pub fn rank(&self) -> Rank {
        self.0
    }

    #[must_use]
    pub fn suit(&self) -> Suit {
        self.1
    }

    #[must_use]
    pub fn is_ace(&self) -> bool {
        self.0 == ACE
    }

    /// Blackjack points before any soft-ace reduction.
    #[must_use]
    pub fn points(&self) -> u32 {
        match self.0 {
            ACE => ACE_HIGH_POINTS,
            r if r >= JACK => 10,
            r => u32::from(r),
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rank = match self.0 {
            ACE => "A",
            JACK => "J",
            QUEEN => "Q",
            KING => "K",
            r => &r.to_string(),
        };
        write!(f, "{rank}{}", self.1)
    }
}

/// Computes a hand's total, counting aces as 11 and then demoting them
/// to 1 one at a time while the total is over 21.
#[must_use]
pub fn hand_value(cards: &[Card]) -> u32 {
    let mut total: u32 = cards.iter().map(Card::points).sum();
    let mut aces = cards.iter().filter(|c| c.is_ace()).count();
    while total > BLACKJACK && aces > 0 {
        total -= ACE_REDUCTION;
        aces -= 1;
    }
    total
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("deck exhausted")]
pub struct DeckExhausted;

/// An ordered pile of cards. Cards are drawn from the end.
#[derive(Debug)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// A fresh 52-card deck shuffled with the thread-local RNG.
    #[must_use]
    pub fn shuffled() -> Self {
        Self::shuffled_with(&mut rand::rng())
    }

    pub fn shuffled_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::default();
        deck.cards.shuffle(rng);
        deck
    }

    /// Builds a stacked deck. The last card in `cards` is drawn first.
    #[must_use]
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn draw(&mut self) -> Result<Card, DeckExhausted> {
        self.cards.pop().ok_or(DeckExhausted)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl Default for Deck {
    /// An unshuffled deck, ordered by suit then rank.
    fn default() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for suit in Suit::ALL {
            for rank in ACE..=KING {
                cards.push(Card(rank, suit));
            }
        }
        Self { cards }
    }
}

/// Cards held by one party during a round. The value is always
/// recomputed from the cards.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        hand_value(&self.cards)
    }

    #[must_use]
    pub fn is_bust(&self) -> bool {
        self.value() > BLACKJACK
    }
}

impl From<Vec<Card>> for Hand {
    fn from(cards: Vec<Card>) -> Self {
        Self { cards }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cards = self
            .cards
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "[{cards}] ({})", self.value())
    }
}

/// How a finished round went, from the player's side.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Outcome {
    Win,
    Loss,
    Tie,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Win => "WIN",
            Self::Loss => "LOSS",
            Self::Tie => "TIE",
        };
        write!(f, "{repr}")
    }
}

/// Win/loss/tie counts for one session.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Tally {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

impl Tally {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Tie => self.ties += 1,
        }
    }

    #[must_use]
    pub fn played(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    /// Fraction of played rounds that were won, or 0 if none were played.
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        match self.played() {
            0 => 0.0,
            played => f64::from(self.wins) / f64::from(played),
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wins={}, losses={}, ties={}",
            self.wins, self.losses, self.ties
        )
    }
}
