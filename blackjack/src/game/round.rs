//! Server-driven state machine for a single blackjack round.
//!
//! A round moves through four phases:
//!
//! - **Dealing**: two cards to the player and the dealer's upcard are sent
//!   as they're drawn. The dealer's second card is drawn but held back.
//! - **PlayerTurn**: the player hits until they stand or bust. A bust
//!   ends the round immediately without waiting for more input.
//! - **DealerTurn**: the hidden card is revealed and the dealer draws
//!   until their total reaches 17.
//! - **Resolved**: the outcome is sent with a filler card.

use std::time::Duration;

use log::debug;
use tokio::io::{AsyncRead, AsyncWrite};

use super::{
    constants::{BLACKJACK, DEALER_STANDS_ON, INITIAL_PLAYER_CARDS},
    entities::{Card, Deck, Hand, Outcome},
};
use crate::net::{
    errors::{ProtocolError, Result},
    messages::{Decision, RoundPayload},
    utils::{read_message, write_message},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Dealing,
    PlayerTurn,
    DealerTurn,
    Resolved,
}

/// Compares final totals. Only called when the player hasn't busted.
#[must_use]
pub fn resolve(player_total: u32, dealer_total: u32) -> Outcome {
    if dealer_total > BLACKJACK || player_total > dealer_total {
        Outcome::Win
    } else if player_total < dealer_total {
        Outcome::Loss
    } else {
        Outcome::Tie
    }
}

/// What happened during a finished round.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundReport {
    pub outcome: Outcome,
    pub player: Hand,
    /// The dealer's cards, including the hidden card if it was revealed.
    pub dealer: Hand,
}

/// One round in progress. Owns its deck and both hands.
#[derive(Debug)]
pub struct Round {
    deck: Deck,
    player: Hand,
    dealer: Hand,
    hidden: Option<Card>,
    phase: Phase,
}

impl Round {
    #[must_use]
    pub fn new(deck: Deck) -> Self {
        Self {
            deck,
            player: Hand::new(),
            dealer: Hand::new(),
            hidden: None,
            phase: Phase::Dealing,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Plays the round to completion over `stream`, waiting at most
    /// `read_timeout` for each client decision.
    ///
    /// # Errors
    ///
    /// Fails on any I/O error, timeout, malformed or invalid decision,
    /// or if the deck runs out. The round is abandoned with no further
    /// writes in every case.
    pub async fn play<S>(mut self, stream: &mut S, read_timeout: Duration) -> Result<RoundReport>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.deal(stream).await?;
        let outcome = match self.player_turn(stream, read_timeout).await? {
            Some(outcome) => outcome,
            None => {
                self.dealer_turn(stream).await?;
                resolve(self.player.value(), self.dealer.value())
            }
        };
        self.phase = Phase::Resolved;
        write_message(stream, &RoundPayload::finished(outcome)).await?;
        debug!(
            "round resolved: player {} vs dealer {} => {outcome}",
            self.player, self.dealer
        );
        Ok(RoundReport {
            outcome,
            player: self.player,
            dealer: self.dealer,
        })
    }

    async fn deal<S>(&mut self, stream: &mut S) -> Result<()>
    where
        S: AsyncWrite + Unpin,
    {
        debug_assert_eq!(self.phase, Phase::Dealing);
        for _ in 0..INITIAL_PLAYER_CARDS {
            let card = self.deck.draw()?;
            self.player.push(card);
            write_message(stream, &RoundPayload::card(card)).await?;
        }
        let upcard = self.deck.draw()?;
        self.dealer.push(upcard);
        write_message(stream, &RoundPayload::card(upcard)).await?;
        self.hidden = Some(self.deck.draw()?);
        self.phase = Phase::PlayerTurn;
        Ok(())
    }

    /// Returns `Some(Outcome::Loss)` if the player busts, or `None` once
    /// they stand.
    async fn player_turn<S>(
        &mut self,
        stream: &mut S,
        read_timeout: Duration,
    ) -> Result<Option<Outcome>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        loop {
            if self.player.is_bust() {
                return Ok(Some(Outcome::Loss));
            }
            let decision = read_message::<Decision, _>(stream, read_timeout)
                .await
                .map_err(|error| match error {
                    ProtocolError::InvalidField {
                        field: "decision",
                        value,
                    } => ProtocolError::InvalidDecision(value),
                    error => error,
                })?;
            match decision {
                Decision::Hit => {
                    let card = self.deck.draw()?;
                    self.player.push(card);
                    write_message(stream, &RoundPayload::card(card)).await?;
                }
                Decision::Stand => {
                    self.phase = Phase::DealerTurn;
                    return Ok(None);
                }
            }
        }
    }

    async fn dealer_turn<S>(&mut self, stream: &mut S) -> Result<()>
    where
        S: AsyncWrite + Unpin,
    {
        if let Some(hidden) = self.hidden.take() {
            self.dealer.push(hidden);
            write_message(stream, &RoundPayload::card(hidden)).await?;
        }
        while self.dealer.value() < DEALER_STANDS_ON {
            let card = self.deck.draw()?;
            self.dealer.push(card);
            write_message(stream, &RoundPayload::card(card)).await?;
        }
        Ok(())
    }
}
