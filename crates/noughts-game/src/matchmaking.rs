//! Single-slot matchmaking.

use std::sync::{Arc, Mutex};

use noughts_player::Client;
use noughts_transport::ConnectionId;

use crate::GameConfig;

/// A client waiting for an opponent, with the game it asked for.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub client: Arc<Client>,
    pub config: GameConfig,
}

impl QueueEntry {
    pub fn new(client: Arc<Client>, config: GameConfig) -> Self {
        Self { client, config }
    }

    pub fn id(&self) -> ConnectionId {
        self.client.id()
    }
}

/// Result of [`MatchmakingQueue::try_enqueue`].
#[derive(Debug)]
pub enum Enqueue {
    /// The slot was empty and now holds the new entry.
    Waiting,
    /// The slot already held this connection; nothing changed.
    AlreadyWaiting,
    /// The slot held someone else. It is now empty and both entries are
    /// handed back for pairing.
    Matched {
        waiting: QueueEntry,
        joiner: QueueEntry,
    },
}

/// Holds at most one waiting client.
///
/// Both operations run in one critical section, so two simultaneous joiners
/// can never both see an empty slot.
#[derive(Debug, Default)]
pub struct MatchmakingQueue {
    slot: Mutex<Option<QueueEntry>>,
}

impl MatchmakingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Occupies the empty slot, or pairs with whoever holds it.
    pub fn try_enqueue(&self, entry: QueueEntry) -> Enqueue {
        let mut slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        match slot.take() {
            None => {
                *slot = Some(entry);
                Enqueue::Waiting
            }
            Some(waiting) if waiting.id() == entry.id() => {
                *slot = Some(waiting);
                Enqueue::AlreadyWaiting
            }
            Some(waiting) => Enqueue::Matched {
                waiting,
                joiner: entry,
            },
        }
    }

    /// Clears the slot only if `id` still holds it.
    pub fn remove_if_waiting(&self, id: ConnectionId) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        if slot.as_ref().is_some_and(|entry| entry.id() == id) {
            *slot = None;
            true
        } else {
            false
        }
    }

    pub fn is_waiting(&self, id: ConnectionId) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .is_some_and(|entry| entry.id() == id)
    }

    /// The connection currently waiting, if any.
    pub fn waiting(&self) -> Option<ConnectionId> {
        self.slot
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .map(QueueEntry::id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> QueueEntry {
        let (client, _outbox) = Client::new(ConnectionId::next());
        QueueEntry::new(client, GameConfig::default())
    }

    #[test]
    fn test_try_enqueue_first_caller_waits() {
        let queue = MatchmakingQueue::new();
        let first = entry();
        let id = first.id();
        assert!(matches!(queue.try_enqueue(first), Enqueue::Waiting));
        assert_eq!(queue.waiting(), Some(id));
    }

    #[test]
    fn test_try_enqueue_second_caller_matches_and_empties_slot() {
        let queue = MatchmakingQueue::new();
        let first = entry();
        let second = entry();
        let (a, b) = (first.id(), second.id());

        queue.try_enqueue(first);
        match queue.try_enqueue(second) {
            Enqueue::Matched { waiting, joiner } => {
                assert_eq!(waiting.id(), a);
                assert_eq!(joiner.id(), b);
            }
            other => panic!("expected a match, got {other:?}"),
        }
        assert_eq!(queue.waiting(), None);
    }

    #[test]
    fn test_try_enqueue_same_connection_twice_is_already_waiting() {
        let queue = MatchmakingQueue::new();
        let first = entry();
        let again = first.clone();
        queue.try_enqueue(first);
        assert!(matches!(queue.try_enqueue(again), Enqueue::AlreadyWaiting));
        assert!(queue.waiting().is_some());
    }

    #[test]
    fn test_remove_if_waiting_ignores_other_connection() {
        let queue = MatchmakingQueue::new();
        let first = entry();
        let id = first.id();
        queue.try_enqueue(first);

        assert!(!queue.remove_if_waiting(ConnectionId::next()));
        assert!(queue.is_waiting(id));

        assert!(queue.remove_if_waiting(id));
        assert!(!queue.is_waiting(id));
        assert!(!queue.remove_if_waiting(id));
    }

    #[test]
    fn test_try_enqueue_concurrent_joiners_pair_exactly_once() {
        let queue = Arc::new(MatchmakingQueue::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let e = entry();
                std::thread::spawn(move || matches!(queue.try_enqueue(e), Enqueue::Matched { .. }))
            })
            .collect();
        let matched = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|m| *m)
            .count();
        assert_eq!(matched, 4);
        assert_eq!(queue.waiting(), None);
    }
}
