//! Usernames currently logged in.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::{Client, PlayerError};

/// Trims and lower-cases a requested username.
pub fn normalize_username(raw: &str) -> Result<String, PlayerError> {
    let name = raw.trim().to_lowercase();
    if name.is_empty() {
        return Err(PlayerError::EmptyUsername);
    }
    Ok(name)
}

/// The set of logged-in usernames. One name, one connection.
#[derive(Debug, Default)]
pub struct ActiveUsers {
    names: Mutex<HashSet<String>>,
}

impl ActiveUsers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `username`. Returns `false` if it is already taken.
    pub fn try_add(&self, username: &str) -> bool {
        self.lock().insert(username.to_string())
    }

    /// Releases `username`.
    pub fn remove(&self, username: &str) {
        self.lock().remove(username);
    }

    pub fn contains(&self, username: &str) -> bool {
        self.lock().contains(username)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalises `raw`, claims it and binds it to `client`.
    ///
    /// # Errors
    /// [`PlayerError::AlreadyLoggedIn`] if the client has a name already,
    /// [`PlayerError::EmptyUsername`] for a blank name, and
    /// [`PlayerError::UsernameTaken`] if another client holds it.
    pub fn login(&self, client: &Client, raw: &str) -> Result<String, PlayerError> {
        if client.username().is_some() {
            return Err(PlayerError::AlreadyLoggedIn);
        }
        let name = normalize_username(raw)?;
        if !self.try_add(&name) {
            return Err(PlayerError::UsernameTaken(name));
        }
        if let Err(e) = client.set_username(name.clone()) {
            // lost a race with a concurrent login on the same client
            self.remove(&name);
            return Err(e);
        }
        tracing::info!(id = %client.id(), username = %name, "player logged in");
        Ok(name)
    }

    /// Releases the client's username, if it logged in.
    pub fn logout(&self, client: &Client) {
        if let Some(name) = client.username() {
            self.remove(name);
            tracing::debug!(id = %client.id(), username = name, "username released");
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.names
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noughts_transport::ConnectionId;

    #[test]
    fn test_normalize_username_trims_and_lowercases() {
        assert_eq!(normalize_username("  Ana ").unwrap(), "ana");
    }

    #[test]
    fn test_normalize_username_blank_rejected() {
        assert_eq!(normalize_username("   "), Err(PlayerError::EmptyUsername));
    }

    #[test]
    fn test_try_add_rejects_duplicate() {
        let users = ActiveUsers::new();
        assert!(users.try_add("ana"));
        assert!(!users.try_add("ana"));
        users.remove("ana");
        assert!(users.try_add("ana"));
    }

    #[test]
    fn test_login_binds_normalised_name() {
        let users = ActiveUsers::new();
        let (client, _outbox) = Client::new(ConnectionId::next());
        assert_eq!(users.login(&client, "ANA").unwrap(), "ana");
        assert_eq!(client.username(), Some("ana"));
        assert!(users.contains("ana"));
    }

    #[test]
    fn test_login_same_name_from_second_client_fails() {
        let users = ActiveUsers::new();
        let (a, _ra) = Client::new(ConnectionId::next());
        let (b, _rb) = Client::new(ConnectionId::next());
        users.login(&a, "ana").unwrap();

        let err = users.login(&b, " Ana").unwrap_err();
        assert_eq!(err, PlayerError::UsernameTaken("ana".into()));
        assert_eq!(b.username(), None);
    }

    #[test]
    fn test_login_twice_on_same_client_fails_without_claiming() {
        let users = ActiveUsers::new();
        let (a, _ra) = Client::new(ConnectionId::next());
        users.login(&a, "ana").unwrap();

        assert_eq!(users.login(&a, "bo"), Err(PlayerError::AlreadyLoggedIn));
        assert!(!users.contains("bo"));
    }

    #[test]
    fn test_logout_releases_name() {
        let users = ActiveUsers::new();
        let (a, _ra) = Client::new(ConnectionId::next());
        users.login(&a, "ana").unwrap();
        users.logout(&a);
        assert!(users.is_empty());

        // logging out an anonymous client is harmless
        let (b, _rb) = Client::new(ConnectionId::next());
        users.logout(&b);
    }
}
