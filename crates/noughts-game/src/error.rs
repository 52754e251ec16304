//! Error types for the game layer.

use noughts_protocol::GameId;

/// Why a move was refused. The `Display` text is sent to the mover in an
/// `ERROR` envelope; nothing else observes a rejected move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejection {
    /// The connection is not part of any running session.
    #[error("not in a game")]
    NotInGame,

    /// The mover's symbol is not the one on turn.
    #[error("not your turn")]
    NotYourTurn,

    /// Row or column outside `[0, N)`.
    #[error("out of range")]
    OutOfRange,

    /// The target square already holds a mark.
    #[error("cell occupied")]
    CellOccupied,
}

/// Errors from queue and session-start requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The connection is already playing.
    #[error("already in a game")]
    AlreadyInGame,

    /// The connection already holds the matchmaking slot.
    #[error("already waiting")]
    AlreadyWaiting,

    /// The session's actor is gone.
    #[error("game {0} is unavailable")]
    Unavailable(GameId),
}
