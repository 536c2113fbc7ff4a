//! Client side of a blackjack session.
//!
//! The client is passive apart from its hit/stand decision: it waits for
//! the next server payload, and only at the decision point waits on its
//! [`Decider`]. The two waits never overlap.

use std::{io, net::SocketAddr, time::Duration};

use async_trait::async_trait;
use log::{debug, warn};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
    time::timeout,
};

use super::{
    errors::{ProtocolError, Result},
    messages::{ACK, Decision, Request, RoundPayload},
    utils::{read_exact_within, read_message, write_message},
};
use crate::{
    config::ClientConfig,
    game::{
        constants::INITIAL_PLAYER_CARDS,
        entities::{Hand, Outcome, Tally},
    },
};

/// The cards a client has seen so far in the current round.
#[derive(Clone, Copy, Debug)]
pub struct RoundView<'a> {
    pub player: &'a Hand,
    pub dealer: &'a Hand,
}

/// A finished round as the client saw it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientRound {
    pub outcome: Outcome,
    pub player: Hand,
    pub dealer: Hand,
    /// The server sent a result before the initial deal was complete.
    pub ended_early: bool,
}

/// Makes the player's choices.
#[async_trait]
pub trait Decider: Send {
    /// Called only while the player's total is 21 or less.
    async fn decide(&mut self, view: &RoundView<'_>) -> io::Result<Decision>;

    /// Called after each round with its 1-based number.
    fn round_finished(&mut self, _number: u8, _round: &ClientRound) {}
}

async fn read_payload<S>(stream: &mut S, read_timeout: Duration) -> Result<RoundPayload>
where
    S: AsyncRead + Unpin,
{
    read_message(stream, read_timeout).await
}

fn finished(outcome: Outcome, player: Hand, dealer: Hand, ended_early: bool) -> ClientRound {
    ClientRound {
        outcome,
        player,
        dealer,
        ended_early,
    }
}

/// Plays one round from the client side.
///
/// # Errors
///
/// Fails on I/O errors, timeouts, malformed payloads, a decider error, or
/// if the server sends a card after the player has busted.
pub async fn play_round<S, D>(
    stream: &mut S,
    read_timeout: Duration,
    decider: &mut D,
) -> Result<ClientRound>
where
    S: AsyncRead + AsyncWrite + Unpin,
    D: Decider + ?Sized,
{
    let mut player = Hand::new();
    let mut dealer = Hand::new();

    // Two player cards, then the dealer's upcard.
    for dealt in 0..=INITIAL_PLAYER_CARDS {
        let payload = read_payload(stream, read_timeout).await?;
        match payload.result.outcome() {
            None if dealt < INITIAL_PLAYER_CARDS => player.push(payload.card),
            None => dealer.push(payload.card),
            Some(outcome) => {
                warn!("Round ended unexpectedly: {}", payload.result);
                return Ok(finished(outcome, player, dealer, true));
            }
        }
    }

    loop {
        if player.is_bust() {
            let payload = read_payload(stream, read_timeout).await?;
            return match payload.result.outcome() {
                Some(outcome) => Ok(finished(outcome, player, dealer, false)),
                None => Err(ProtocolError::OutOfSequence {
                    expected: "a result after bust",
                }),
            };
        }

        let view = RoundView {
            player: &player,
            dealer: &dealer,
        };
        let decision = decider.decide(&view).await.map_err(ProtocolError::Decider)?;
        write_message(stream, &decision).await?;

        match decision {
            Decision::Hit => {
                let payload = read_payload(stream, read_timeout).await?;
                match payload.result.outcome() {
                    None => player.push(payload.card),
                    Some(outcome) => return Ok(finished(outcome, player, dealer, false)),
                }
            }
            Decision::Stand => loop {
                let payload = read_payload(stream, read_timeout).await?;
                match payload.result.outcome() {
                    None => dealer.push(payload.card),
                    Some(outcome) => return Ok(finished(outcome, player, dealer, false)),
                }
            },
        }
    }
}

/// A connected client that has completed the handshake.
pub struct Client {
    stream: TcpStream,
    read_timeout: Duration,
}

impl Client {
    /// Connects, sends the request, and waits for the acknowledgment.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or handshake fails or times out,
    /// or if `num_rounds` is zero.
    pub async fn connect(addr: SocketAddr, num_rounds: u8, config: &ClientConfig) -> Result<Self> {
        let mut stream = timeout(config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ProtocolError::Timeout(config.connect_timeout))?
            .map_err(ProtocolError::Io)?;

        let request = Request {
            num_rounds,
            client_name: config.client_name.clone(),
        };
        write_message(&mut stream, &request).await?;

        let mut ack = [0; ACK.len()];
        read_exact_within(&mut stream, &mut ack, config.timeouts.handshake).await?;
        debug!(
            "Server {addr} acknowledged with {:?}",
            String::from_utf8_lossy(&ack)
        );

        Ok(Self {
            stream,
            read_timeout: config.timeouts.read,
        })
    }

    /// Plays the next round.
    ///
    /// # Errors
    ///
    /// See [`play_round`].
    pub async fn play_round<D>(&mut self, decider: &mut D) -> Result<ClientRound>
    where
        D: Decider + ?Sized,
    {
        play_round(&mut self.stream, self.read_timeout, decider).await
    }
}

/// Connects to `addr` and plays `num_rounds` rounds.
///
/// # Errors
///
/// Any error abandons the session; rounds already played aren't reported.
pub async fn play_session<D>(
    addr: SocketAddr,
    num_rounds: u8,
    config: &ClientConfig,
    decider: &mut D,
) -> Result<Tally>
where
    D: Decider + ?Sized,
{
    let mut client = Client::connect(addr, num_rounds, config).await?;
    let mut tally = Tally::default();
    for number in 1..=num_rounds {
        let round = client.play_round(decider).await?;
        tally.record(round.outcome);
        decider.round_finished(number, &round);
    }
    Ok(tally)
}
