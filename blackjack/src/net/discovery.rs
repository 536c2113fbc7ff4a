//! LAN discovery over UDP broadcast.
//!
//! Servers periodically broadcast an [`Offer`] to the well-known discovery
//! port. Clients listen on that port and pick up the first well-formed
//! offer; anything else arriving on the port is dropped.

use std::{
    io,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use log::{debug, info, warn};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::{
    net::UdpSocket,
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use super::{
    errors::{ProtocolError, Result},
    messages::{Offer, WireMessage},
};

/// Large enough for any datagram we'd care to look at.
const RECV_BUFFER_SIZE: usize = 4096;

/// Binds an ephemeral UDP socket that's allowed to send broadcasts.
pub async fn bind_broadcaster(bind_ip: IpAddr) -> io::Result<UdpSocket> {
    let socket = UdpSocket::bind(SocketAddr::new(bind_ip, 0)).await?;
    socket.set_broadcast(true)?;
    Ok(socket)
}

/// Binds the socket clients receive offers on. Address and port reuse are
/// enabled so several clients on one host can share the discovery port.
pub async fn bind_listener(port: u16) -> io::Result<UdpSocket> {
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(all(
        unix,
        not(any(target_os = "solaris", target_os = "illumos", target_os = "cygwin"))
    ))]
    socket.set_reuse_port(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    UdpSocket::from_std(socket.into())
}

/// Sends the same pre-encoded offer on a fixed interval until shut down.
pub struct OfferBroadcaster {
    socket: UdpSocket,
    datagram: Vec<u8>,
    target: SocketAddr,
    period: Duration,
}

impl OfferBroadcaster {
    /// Encodes `offer` once up front; the datagram never changes afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the offer can't be encoded or `period` is zero.
    pub fn new(
        socket: UdpSocket,
        offer: &Offer,
        target: SocketAddr,
        period: Duration,
    ) -> Result<Self> {
        if period.is_zero() {
            return Err(ProtocolError::invalid("offer_interval", format!("{period:?}")));
        }
        Ok(Self {
            socket,
            datagram: offer.encode()?,
            target,
            period,
        })
    }

    /// Broadcasts until `shutdown` flips to `true` or its sender is dropped.
    /// Send failures are logged and retried on the next tick.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "Broadcasting offers to {} every {:?}",
            self.target, self.period
        );
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.socket.send_to(&self.datagram, self.target).await {
                        Ok(n) => debug!("Sent offer ({n} bytes) to {}", self.target),
                        Err(error) => warn!("Failed to send offer to {}: {error}", self.target),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Offer broadcaster shutting down");
                        break;
                    }
                }
            }
        }
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

/// A server found through discovery.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiscoveredServer {
    /// The sender's IP paired with the advertised TCP port.
    pub addr: SocketAddr,
    pub offer: Offer,
}

/// Waits for the next valid offer on `socket`. Malformed datagrams are
/// discarded and listening continues.
///
/// # Errors
///
/// Only socket errors are returned.
pub async fn next_offer(socket: &UdpSocket) -> io::Result<DiscoveredServer> {
    let mut buf = vec![0; RECV_BUFFER_SIZE];
    loop {
        let (len, src) = socket.recv_from(&mut buf).await?;
        match Offer::decode(&buf[..len]) {
            Ok(offer) => {
                let addr = SocketAddr::new(src.ip(), offer.tcp_port);
                return Ok(DiscoveredServer { addr, offer });
            }
            Err(error) => debug!("Discarding datagram from {src}: {error}"),
        }
    }
}
