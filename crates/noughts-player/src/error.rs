//! Error types for the player layer.

/// Login failures. The `Display` text is what the client sees in
/// `LOGIN_ERROR`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayerError {
    /// The username was blank after trimming.
    #[error("username must not be empty")]
    EmptyUsername,

    /// Another connection is logged in under this name.
    #[error("username {0} is already in use")]
    UsernameTaken(String),

    /// This connection already has a username.
    #[error("already logged in")]
    AlreadyLoggedIn,
}
