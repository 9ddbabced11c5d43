//! UDP stand-in for the GATT characteristic pair.
//!
//! Each datagram is one write to the RX characteristic. `subscribe` / `unsubscribe`
//! datagrams enable or disable notifications for their sender; acknowledgments then
//! go back to that sender as datagrams.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tmbot_core::{NotifySink, Session};
use tokio::net::UdpSocket;
use tokio::sync::Mutex;

const SUBSCRIBE: &[u8] = b"subscribe";
const UNSUBSCRIBE: &[u8] = b"unsubscribe";

/// Session shared between the receive loop and the tick loop.
pub type SharedSession = Arc<Mutex<Session<UdpNotifySink>>>;

/// Notifications to one subscribed peer.
pub struct UdpNotifySink {
    socket: Arc<UdpSocket>,
    peer: SocketAddr,
}

impl UdpNotifySink {
    pub fn new(socket: Arc<UdpSocket>, peer: SocketAddr) -> Self {
        Self { socket, peer }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl NotifySink for UdpNotifySink {
    fn send(&mut self, bytes: &[u8]) {
        if let Err(e) = self.socket.try_send_to(bytes, self.peer) {
            tracing::warn!(error = %e, peer = %self.peer, "notify send failed");
        }
    }
}

pub async fn bind(listen_port: u16) -> std::io::Result<Arc<UdpSocket>> {
    let socket = UdpSocket::bind(("127.0.0.1", listen_port)).await?;
    Ok(Arc::new(socket))
}

/// Receive writes until the socket fails. A bad write never ends the loop.
pub async fn run_bridge(socket: Arc<UdpSocket>, session: SharedSession) -> std::io::Result<()> {
    let mut buf = vec![0u8; 65536];
    loop {
        let (n, from) = socket.recv_from(&mut buf).await?;
        let write = &buf[..n];
        let mut s = session.lock().await;
        match write {
            SUBSCRIBE => {
                tracing::info!(peer = %from, "notifications enabled");
                s.subscribe(UdpNotifySink::new(socket.clone(), from));
            }
            UNSUBSCRIBE => {
                if s.sink().map(UdpNotifySink::peer) == Some(from) {
                    tracing::info!(peer = %from, "notifications disabled");
                    s.unsubscribe();
                }
            }
            _ => {
                tracing::trace!(peer = %from, len = n, "write");
                s.on_inbound_write(write);
            }
        }
    }
}

/// Drive the expiry sweep.
pub async fn tick_loop(session: SharedSession, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let expired = session.lock().await.tick();
        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "expired transfers");
        }
    }
}
