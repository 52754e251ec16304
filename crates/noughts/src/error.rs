//! Unified error type for the noughts server.

use noughts_game::GameError;
use noughts_player::PlayerError;
use noughts_protocol::ProtocolError;
use noughts_records::RecordsError;
use noughts_transport::TransportError;

/// Top-level error wrapping every layer's error.
///
/// The `#[from]` conversions let `?` lift layer errors into this type.
#[derive(Debug, thiserror::Error)]
pub enum NoughtsError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Player(#[from] PlayerError),

    /// The records store could not be opened or written.
    #[error(transparent)]
    Records(#[from] RecordsError),

    #[error(transparent)]
    Game(#[from] GameError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: NoughtsError = TransportError::ConnectionClosed("gone".into()).into();
        assert!(matches!(err, NoughtsError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: NoughtsError = ProtocolError::UnknownType("PING".into()).into();
        assert!(matches!(err, NoughtsError::Protocol(_)));
        assert!(err.to_string().contains("PING"));
    }

    #[test]
    fn test_from_player_error() {
        let err: NoughtsError = PlayerError::UsernameTaken("ana".into()).into();
        assert!(matches!(err, NoughtsError::Player(_)));
    }

    #[test]
    fn test_from_records_error() {
        let err: NoughtsError = RecordsError::Io {
            path: "records.json".into(),
            source: std::io::Error::other("disk full"),
        }
        .into();
        assert!(matches!(err, NoughtsError::Records(_)));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_from_game_error() {
        let err: NoughtsError = GameError::AlreadyWaiting.into();
        assert_eq!(err.to_string(), "already waiting");
    }
}
