//! LAN blackjack client.
//!
//! Listens for server offers, asks how many rounds to play, plays them
//! interactively, and goes back to listening.

use anyhow::{Context, Result};
use bj_client::{
    config::{self, Overrides},
    prompt::{self, Prompt},
};
use blackjack::{
    ProtocolError, client,
    discovery::{self, DiscoveredServer},
};
use log::warn;
use pico_args::Arguments;
use std::io;
use tokio::{
    io::{AsyncBufRead, AsyncWrite},
    net::UdpSocket,
};

const HELP: &str = "\
Play blackjack against any server on the local network

USAGE:
  bj_client [OPTIONS]

OPTIONS:
  --name           NAME    Name sent to the server      [default: env BJ_CLIENT_NAME or NoSocketsJustCards]
  --discovery-port PORT    UDP port to hear offers on   [default: env BJ_DISCOVERY_PORT or 13122]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  BJ_CONNECT_TIMEOUT_SECS     How long to wait for a TCP connection
  BJ_HANDSHAKE_TIMEOUT_SECS   How long to wait for the server's acknowledgment
  BJ_READ_TIMEOUT_SECS        How long to wait for each card or result
  RUST_LOG                    Log level (default: info)
";

#[tokio::main]
async fn main() -> Result<()> {
    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = Overrides {
        client_name: pargs.opt_value_from_str("--name")?,
        discovery_port: pargs.opt_value_from_str("--discovery-port")?,
    };
    let config = config::from_env(overrides).context("Invalid client configuration")?;

    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_target(false)
        .init();

    let socket = discovery::bind_listener(config.discovery_port)
        .await
        .with_context(|| format!("Failed to bind discovery port {}", config.discovery_port))?;
    println!(
        "Client {:?} started, listening for offer requests on port {}...",
        config.client_name, config.discovery_port
    );

    let mut prompt = prompt::stdio();
    tokio::select! {
        result = run(&socket, &config, &mut prompt) => result?,
        _ = tokio::signal::ctrl_c() => {}
    }
    println!("\nClient stopped.");
    Ok(())
}

/// Plays one session per offer until the player closes their input.
async fn run<R, W>(
    socket: &UdpSocket,
    config: &blackjack::config::ClientConfig,
    prompt: &mut Prompt<R, W>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    loop {
        let DiscoveredServer { addr, offer } = discovery::next_offer(socket)
            .await
            .context("Failed to receive offers")?;
        prompt
            .say(&format!(
                "Received offer from {} (server_name={}, tcp_port={})",
                addr.ip(),
                offer.server_name,
                offer.tcp_port
            ))
            .await?;

        let rounds = match prompt.ask_rounds().await {
            Ok(rounds) => rounds,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(error) => return Err(error.into()),
        };

        match client::play_session(addr, rounds, config, prompt).await {
            Ok(tally) => prompt.report_session(&tally).await?,
            Err(ProtocolError::Decider(error)) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return Ok(());
            }
            Err(ProtocolError::Timeout(after)) => {
                prompt
                    .say(&format!(
                        "Timeout: no response from server after {after:?}. Closing session and returning to offers..."
                    ))
                    .await?;
            }
            Err(error) if error.is_disconnect() => {
                prompt
                    .say(&format!("Connection to {addr} lost: {error}"))
                    .await?;
            }
            Err(error) => {
                warn!("Session with {addr} failed: {error}");
                prompt
                    .say(&format!("Session ended unexpectedly: {error}"))
                    .await?;
            }
        }
        prompt.say("Back to listening for offers...\n").await?;
    }
}
