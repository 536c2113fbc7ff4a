//! Blackjack server: an offer broadcaster, a TCP accept loop, and one
//! independent task per accepted connection.
//!
//! Sessions share nothing mutable. Each one owns its stream, its rounds,
//! and its tally. The only shared value is the encoded offer, which is
//! fixed once the listener is bound.

use std::net::SocketAddr;

use log::{error, info, warn};
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{Duration, sleep},
};

use super::{
    discovery::{OfferBroadcaster, bind_broadcaster},
    errors::{ProtocolError, Result},
    messages::{ACK, Offer, Request},
    utils::read_message,
};
use crate::{
    config::{ServerConfig, SessionTimeouts},
    game::{
        entities::{Deck, Tally},
        round::Round,
    },
};

/// Pause after a failed accept so a persistent error doesn't spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// A finished session's handshake details and results.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Session {
    pub client_name: String,
    pub declared_rounds: u8,
    pub tally: Tally,
}

/// Posted by each session that completes all of its rounds.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionReport {
    pub peer: SocketAddr,
    pub session: Session,
}

/// Runs one session on an already-connected stream: reads the request,
/// acknowledges it, then plays every declared round with a fresh deck
/// from `new_deck`.
///
/// # Errors
///
/// Any error ends the session. No partial tally is returned.
pub async fn run_session<S, F>(
    stream: &mut S,
    timeouts: SessionTimeouts,
    mut new_deck: F,
) -> Result<Session>
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: FnMut() -> Deck,
{
    let request: Request = read_message(stream, timeouts.handshake).await?;
    info!(
        "Client {} requested {} round(s)",
        request.client_name, request.num_rounds
    );
    stream.write_all(ACK).await?;

    let mut tally = Tally::default();
    for _ in 0..request.num_rounds {
        let report = Round::new(new_deck()).play(stream, timeouts.read).await?;
        tally.record(report.outcome);
    }

    Ok(Session {
        client_name: request.client_name,
        declared_rounds: request.num_rounds,
        tally,
    })
}

async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    timeouts: SessionTimeouts,
    reports: Option<mpsc::UnboundedSender<SessionReport>>,
) {
    match run_session(&mut stream, timeouts, Deck::shuffled).await {
        Ok(session) => {
            info!(
                "Finished with {} ({peer}): {}",
                session.client_name, session.tally
            );
            let _ = stream.shutdown().await;
            if let Some(reports) = reports {
                let _ = reports.send(SessionReport { peer, session });
            }
        }
        Err(ProtocolError::Timeout(after)) => {
            warn!("Timeout with {peer}: no response after {after:?}, closing connection");
        }
        Err(error) => warn!("Session with {peer} ended: {error}"),
    }
}

async fn accept_loop(
    listener: TcpListener,
    timeouts: SessionTimeouts,
    reports: Option<mpsc::UnboundedSender<SessionReport>>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    info!("Accepted connection from {peer}");
                    tokio::spawn(handle_connection(stream, peer, timeouts, reports.clone()));
                }
                Err(error) => {
                    error!("Failed to accept connection: {error}");
                    sleep(ACCEPT_BACKOFF).await;
                }
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("No longer accepting connections");
                    break;
                }
            }
        }
    }
}

/// Handle to a running server.
///
/// Shutting down stops the broadcaster and the accept loop. Sessions that
/// are already running finish on their own.
pub struct ServerHandle {
    local_addr: SocketAddr,
    offer: Offer,
    shutdown: watch::Sender<bool>,
    accept: JoinHandle<()>,
    broadcast: JoinHandle<()>,
}

impl ServerHandle {
    /// Address of the TCP listener.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The offer being broadcast.
    #[must_use]
    pub fn offer(&self) -> &Offer {
        &self.offer
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.accept.await;
        let _ = self.broadcast.await;
    }

    /// Waits until the accept loop exits.
    pub async fn wait(self) {
        let _ = self.accept.await;
        let _ = self.shutdown.send(true);
        let _ = self.broadcast.await;
    }
}

/// Binds the listener and broadcast socket and starts serving.
///
/// # Errors
///
/// Returns an error if `config` fails validation, either socket can't be
/// bound, or the offer can't be encoded.
pub async fn start(config: &ServerConfig) -> Result<ServerHandle> {
    start_with_reports(config, None).await
}

/// Like [`start`], but every completed session is also posted to `reports`.
///
/// # Errors
///
/// See [`start`].
pub async fn start_with_reports(
    config: &ServerConfig,
    reports: Option<mpsc::UnboundedSender<SessionReport>>,
) -> Result<ServerHandle> {
    config.validate()?;
    let listener = TcpListener::bind(SocketAddr::new(config.bind_ip, config.tcp_port))
        .await
        .map_err(ProtocolError::Io)?;
    let local_addr = listener.local_addr().map_err(ProtocolError::Io)?;
    let offer = Offer {
        tcp_port: local_addr.port(),
        server_name: config.server_name.clone(),
    };
    info!(
        "Server {} listening on {local_addr}",
        config.server_name
    );

    let socket = bind_broadcaster(config.bind_ip)
        .await
        .map_err(ProtocolError::Io)?;
    let broadcaster =
        OfferBroadcaster::new(socket, &offer, config.broadcast_addr, config.offer_interval)?;

    let (shutdown, shutdown_rx) = watch::channel(false);
    let broadcast = broadcaster.spawn(shutdown_rx.clone());
    let accept = tokio::spawn(accept_loop(
        listener,
        config.timeouts,
        reports,
        shutdown_rx,
    ));

    Ok(ServerHandle {
        local_addr,
        offer,
        shutdown,
        accept,
        broadcast,
    })
}

/// Runs a server until its accept loop stops.
///
/// # Errors
///
/// See [`start`].
pub async fn run(config: &ServerConfig) -> Result<()> {
    start(config).await?.wait().await;
    Ok(())
}
