//! Connection → session index.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use noughts_protocol::GameId;
use noughts_transport::ConnectionId;

use crate::{GameError, SessionHandle};

/// Maps every seated connection to its session's handle.
///
/// A connection is in at most one session. The lock is never held across
/// an `.await`.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<ConnectionId, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seats every connection in `ids` at `handle`, or none of them.
    ///
    /// # Errors
    /// [`GameError::AlreadyInGame`] if any of them is already seated.
    pub fn insert_all(&self, ids: &[ConnectionId], handle: &SessionHandle) -> Result<(), GameError> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|p| p.into_inner());
        if ids.iter().any(|id| sessions.contains_key(id)) {
            return Err(GameError::AlreadyInGame);
        }
        for id in ids {
            sessions.insert(*id, handle.clone());
        }
        Ok(())
    }

    pub fn get(&self, id: ConnectionId) -> Option<SessionHandle> {
        self.sessions
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&id)
            .cloned()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(&id)
    }

    pub fn remove(&self, id: ConnectionId) -> Option<SessionHandle> {
        self.sessions
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&id)
    }

    /// Removes `id` only if it still points at `game_id`.
    pub fn remove_if(&self, id: ConnectionId, game_id: &GameId) -> bool {
        let mut sessions = self.sessions.lock().unwrap_or_else(|p| p.into_inner());
        if sessions.get(&id).is_some_and(|h| h.game_id() == game_id) {
            sessions.remove(&id);
            true
        } else {
            false
        }
    }

    /// Number of distinct running sessions.
    pub fn session_count(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .values()
            .map(SessionHandle::game_id)
            .collect::<HashSet<_>>()
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::generate_game_id;

    fn handle() -> SessionHandle {
        let (tx, _rx) = tokio::sync::mpsc::channel(1);
        SessionHandle::new(generate_game_id(), tx)
    }

    #[test]
    fn test_insert_all_is_all_or_nothing() {
        let registry = SessionRegistry::new();
        let (a, b, c) = (ConnectionId::next(), ConnectionId::next(), ConnectionId::next());
        registry.insert_all(&[a, b], &handle()).unwrap();

        assert_eq!(registry.insert_all(&[c, a], &handle()), Err(GameError::AlreadyInGame));
        assert!(!registry.contains(c));
        assert_eq!(registry.session_count(), 1);
    }

    #[test]
    fn test_remove_if_checks_game_id() {
        let registry = SessionRegistry::new();
        let id = ConnectionId::next();
        let first = handle();
        registry.insert_all(&[id], &first).unwrap();

        assert!(!registry.remove_if(id, &generate_game_id()));
        assert!(registry.contains(id));
        assert!(registry.remove_if(id, first.game_id()));
        assert!(registry.get(id).is_none());
    }
}
