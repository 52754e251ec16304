//! The server's handle on one connected client.
//!
//! A [`Client`] never touches the socket. Messages go onto an unbounded
//! channel that the connection's single writer task drains, so a reply from
//! the reader loop and a timeout notice from a timer task can never
//! interleave on the wire.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use noughts_protocol::ServerMessage;
use noughts_transport::ConnectionId;
use tokio::sync::{Notify, mpsc};

use crate::PlayerError;

/// Receiving end of a client's outbound queue.
pub type Outbox = mpsc::UnboundedReceiver<ServerMessage>;

/// One connected client, shared by the handler, the game service and any
/// session actor the client plays in.
#[derive(Debug)]
pub struct Client {
    id: ConnectionId,
    username: OnceLock<String>,
    outbound: mpsc::UnboundedSender<ServerMessage>,
    closed: AtomicBool,
    close_notify: Notify,
}

impl Client {
    /// Creates a client and the receiver its writer task should drain.
    pub fn new(id: ConnectionId) -> (Arc<Self>, Outbox) {
        let (outbound, outbox) = mpsc::unbounded_channel();
        let client = Arc::new(Self {
            id,
            username: OnceLock::new(),
            outbound,
            closed: AtomicBool::new(false),
            close_notify: Notify::new(),
        });
        (client, outbox)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The logged-in username, if any.
    pub fn username(&self) -> Option<&str> {
        self.username.get().map(String::as_str)
    }

    /// Records the username. Succeeds once per client.
    pub fn set_username(&self, username: String) -> Result<(), PlayerError> {
        self.username
            .set(username)
            .map_err(|_| PlayerError::AlreadyLoggedIn)
    }

    /// Queues a message for delivery.
    ///
    /// Returns `false` if the client is closed or its writer is gone; the
    /// message is dropped in that case.
    pub fn send(&self, msg: ServerMessage) -> bool {
        if self.is_closed() {
            tracing::trace!(id = %self.id, kind = msg.kind(), "send after close dropped");
            return false;
        }
        self.outbound.send(msg).is_ok()
    }

    /// Marks the client closed and wakes everyone waiting in
    /// [`closed`](Self::closed). Returns `true` only for the first call.
    pub fn close(&self) -> bool {
        let first = self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if first {
            self.close_notify.notify_waiters();
        }
        first
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        loop {
            let notified = self.close_notify.notified();
            if self.is_closed() {
                return;
            }
            notified.await;
        }
    }
}

impl PartialEq for Client {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Client {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client() -> (Arc<Client>, Outbox) {
        Client::new(ConnectionId::next())
    }

    #[test]
    fn test_send_delivers_in_order() {
        let (client, mut outbox) = client();
        assert!(client.send(ServerMessage::error("one")));
        assert!(client.send(ServerMessage::error("two")));

        assert_eq!(outbox.try_recv().unwrap(), ServerMessage::error("one"));
        assert_eq!(outbox.try_recv().unwrap(), ServerMessage::error("two"));
    }

    #[test]
    fn test_send_after_close_is_noop() {
        let (client, mut outbox) = client();
        client.close();
        assert!(!client.send(ServerMessage::error("late")));
        assert!(outbox.try_recv().is_err());
    }

    #[test]
    fn test_send_after_writer_dropped_returns_false() {
        let (client, outbox) = client();
        drop(outbox);
        assert!(!client.send(ServerMessage::error("nobody listening")));
    }

    #[test]
    fn test_close_is_idempotent() {
        let (client, _outbox) = client();
        assert!(client.close());
        assert!(!client.close());
        assert!(client.is_closed());
    }

    #[test]
    fn test_set_username_only_once() {
        let (client, _outbox) = client();
        assert_eq!(client.username(), None);
        client.set_username("ana".into()).unwrap();
        assert_eq!(client.set_username("bo".into()), Err(PlayerError::AlreadyLoggedIn));
        assert_eq!(client.username(), Some("ana"));
    }

    #[tokio::test]
    async fn test_closed_wakes_waiter() {
        let (client, _outbox) = client();
        let waiter = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.closed().await })
        };
        tokio::task::yield_now().await;
        client.close();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_closed_returns_immediately_when_already_closed() {
        let (client, _outbox) = client();
        client.close();
        tokio::time::timeout(Duration::from_millis(50), client.closed())
            .await
            .expect("already closed");
    }

    #[test]
    fn test_clients_compare_by_id() {
        let id = ConnectionId::next();
        let (a, _ra) = Client::new(id);
        let (b, _rb) = Client::new(id);
        let (c, _rc) = client();
        assert_eq!(*a, *b);
        assert_ne!(*a, *c);
    }
}
