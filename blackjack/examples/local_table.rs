//! Local Table Example
//!
//! Starts a server on loopback, picks up its offer, and plays a short
//! session with a bot that draws to 17 like the dealer does.

use std::{
    io,
    net::{IpAddr, Ipv4Addr, SocketAddr},
};

use async_trait::async_trait;
use blackjack::{
    Decider,
    client::{self, ClientRound, RoundView},
    config::{ClientConfig, ServerConfig},
    constants::DEALER_STANDS_ON,
    discovery,
    messages::Decision,
};
use tokio::net::UdpSocket;

struct DealerMimic;

#[async_trait]
impl Decider for DealerMimic {
    async fn decide(&mut self, view: &RoundView<'_>) -> io::Result<Decision> {
        if view.player.value() < DEALER_STANDS_ON {
            Ok(Decision::Hit)
        } else {
            Ok(Decision::Stand)
        }
    }

    fn round_finished(&mut self, number: u8, round: &ClientRound) {
        println!(
            "Round {number}: {} ({}) vs dealer {} ({}) => {}",
            round.player,
            round.player.value(),
            round.dealer,
            round.dealer.value(),
            round.outcome
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Local Blackjack Table ===\n");

    let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
    let listener = UdpSocket::bind((localhost, 0)).await?;
    let server = blackjack::server::start(&ServerConfig {
        server_name: "Example Table".to_string(),
        bind_ip: localhost,
        broadcast_addr: SocketAddr::new(localhost, listener.local_addr()?.port()),
        ..ServerConfig::default()
    })
    .await?;

    let found = discovery::next_offer(&listener).await?;
    println!(
        "Found {:?} at {} via offer\n",
        found.offer.server_name, found.addr
    );

    let tally = client::play_session(found.addr, 10, &ClientConfig::default(), &mut DealerMimic)
        .await?;
    println!("\n{tally}, win rate {:.0}%", tally.win_rate() * 100.0);

    server.shutdown().await;
    Ok(())
}
