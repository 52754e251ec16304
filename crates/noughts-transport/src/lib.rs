//! Transport layer for the noughts server.
//!
//! [`Transport`] accepts peers and [`Connection`] moves whole frames (one
//! JSON envelope each) to and from a single peer. Two implementations ship:
//!
//! - [`TcpLineTransport`]: newline-delimited frames over plain TCP.
//! - [`WebSocketTransport`]: one text frame per envelope (feature
//!   `websocket`, enabled by default).
//!
//! Reading and writing are independent halves, so a connection's reader
//! loop can sit in [`Connection::recv`] while another task calls
//! [`Connection::send`].

mod error;
mod tcp;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use tcp::{TcpLineConnection, TcpLineTransport, MAX_LINE_BYTES};
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for one accepted peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw id. Transports use [`ConnectionId::next`] instead.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates a process-unique id.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;

    /// Waits for and accepts the next peer.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;

    /// The address the listener is bound to.
    fn local_addr(&self) -> Result<SocketAddr, TransportError>;
}

/// A single peer that exchanges whole frames.
pub trait Connection: Send + Sync + 'static {
    /// Writes one frame.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Reads the next frame.
    ///
    /// Returns `Ok(None)` when the peer closed the stream cleanly.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Closes the write side. Further sends fail.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Returns the identifier assigned at accept time.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_display_uses_conn_prefix() {
        assert_eq!(ConnectionId::new(7).to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_next_is_unique_and_increasing() {
        let a = ConnectionId::next();
        let b = ConnectionId::next();
        assert_ne!(a, b);
        assert!(b.into_inner() > a.into_inner());
    }

    #[test]
    fn test_connection_id_keys_a_seat_map() {
        use std::collections::HashSet;
        let seated: HashSet<_> = [ConnectionId::new(1), ConnectionId::new(2)].into();
        assert!(seated.contains(&ConnectionId::new(2)));
        assert!(!seated.contains(&ConnectionId::new(3)));
    }
}
