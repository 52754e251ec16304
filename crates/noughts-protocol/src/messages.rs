//! Envelopes exchanged with clients.
//!
//! Every frame is `{"type": "<MESSAGE_TYPE>", "payload": {...}}`, payload
//! fields in camelCase. Server messages are plain adjacently tagged enums.
//! Client messages are read through [`RawEnvelope`] first so a missing,
//! `null` or `{}` payload all mean "use the defaults".

use serde::{Deserialize, Serialize};

use crate::records::RecordsSnapshot;
use crate::types::{Cell, GameId, GameMode, RoundResult, Symbol, blank};
use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// `LOGIN` payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
}

/// `JOIN_QUEUE` payload. Values are clamped by the server, never rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueRequest {
    pub board_size: i64,
    pub rounds: i64,
    /// Seconds per move, 0 disables the clock.
    pub time_limit: i64,
    pub turbo: bool,
}

impl Default for QueueRequest {
    fn default() -> Self {
        Self {
            board_size: 3,
            rounds: 3,
            time_limit: 0,
            turbo: false,
        }
    }
}

/// `START_PVE` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PveRequest {
    pub board_size: i64,
    pub rounds: i64,
    /// Matched case-insensitively; unknown names mean `EASY`.
    pub difficulty: String,
    pub time_limit: i64,
    pub turbo: bool,
}

impl Default for PveRequest {
    fn default() -> Self {
        Self {
            board_size: 3,
            rounds: 3,
            difficulty: "EASY".to_string(),
            time_limit: 0,
            turbo: false,
        }
    }
}

/// `MAKE_MOVE` payload. Signed so that negative coordinates reach the
/// range check instead of failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub row: i64,
    pub col: i64,
}

/// A message sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE",
    try_from = "RawEnvelope"
)]
pub enum ClientMessage {
    Login(LoginRequest),
    JoinQueue(QueueRequest),
    LeaveQueue,
    StartPve(PveRequest),
    MakeMove(MoveRequest),
}

/// An envelope whose payload has not been interpreted yet.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl RawEnvelope {
    fn payload<T: serde::de::DeserializeOwned>(self) -> Result<T, ProtocolError> {
        let value = match self.payload {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            other => other,
        };
        serde_json::from_value(value).map_err(|source| ProtocolError::InvalidPayload {
            kind: self.kind,
            source,
        })
    }
}

impl TryFrom<RawEnvelope> for ClientMessage {
    type Error = ProtocolError;

    fn try_from(raw: RawEnvelope) -> Result<Self, Self::Error> {
        match raw.kind.as_str() {
            "LOGIN" => raw.payload().map(ClientMessage::Login),
            "JOIN_QUEUE" => raw.payload().map(ClientMessage::JoinQueue),
            "LEAVE_QUEUE" => Ok(ClientMessage::LeaveQueue),
            "START_PVE" => raw.payload().map(ClientMessage::StartPve),
            "MAKE_MOVE" => raw.payload().map(ClientMessage::MakeMove),
            _ => Err(ProtocolError::UnknownType(raw.kind)),
        }
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginOk {
    pub username: String,
}

/// Payload of `ERROR` and `LOGIN_ERROR`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

impl ErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueueState {
    Waiting,
    Matched,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub status: QueueState,
}

/// Sent to each human at the start of every round, with their own symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStart {
    pub game_id: GameId,
    pub your_symbol: Symbol,
    pub round: u32,
    pub total_rounds: u32,
    pub x_wins: u32,
    pub o_wins: u32,
    pub wins_needed: u32,
    pub board_size: usize,
    pub mode: GameMode,
    pub time_limit: u64,
    /// The other side's username, `"AI"` against the built-in opponent.
    pub opponent: String,
}

/// Full board broadcast. `nextPlayer` is `""` once the round is over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub game_id: GameId,
    pub board_size: usize,
    pub board: Vec<Vec<Cell>>,
    #[serde(with = "blank")]
    pub next_player: Option<Symbol>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundEnd {
    pub game_id: GameId,
    pub round_winner: RoundResult,
    pub series_over: bool,
    /// Series result, `""` while the series continues.
    #[serde(with = "blank")]
    pub winner: Option<RoundResult>,
    /// Set only when the series ended with a winner.
    pub winner_user: Option<String>,
    pub loser_user: Option<String>,
    pub round: u32,
    pub total_rounds: u32,
    pub x_wins: u32,
    pub o_wins: u32,
    pub wins_needed: u32,
}

/// A side ran out of time and forfeited its turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeoutNotice {
    pub game_id: GameId,
    pub timed_out: Symbol,
    pub next_player: Symbol,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameAborted {
    pub game_id: GameId,
    pub reason: String,
}

/// A message sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    RecordsSync(RecordsSnapshot),
    LoginOk(LoginOk),
    LoginError(ErrorPayload),
    QueueStatus(QueueStatus),
    GameStart(GameStart),
    GameState(GameState),
    RoundEnd(RoundEnd),
    Timeout(TimeoutNotice),
    Error(ErrorPayload),
    GameAborted(GameAborted),
}

impl ServerMessage {
    /// Shorthand for an `ERROR` envelope.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error(ErrorPayload::new(message))
    }

    /// The wire name of this message's type.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::RecordsSync(_) => "RECORDS_SYNC",
            ServerMessage::LoginOk(_) => "LOGIN_OK",
            ServerMessage::LoginError(_) => "LOGIN_ERROR",
            ServerMessage::QueueStatus(_) => "QUEUE_STATUS",
            ServerMessage::GameStart(_) => "GAME_START",
            ServerMessage::GameState(_) => "GAME_STATE",
            ServerMessage::RoundEnd(_) => "ROUND_END",
            ServerMessage::Timeout(_) => "TIMEOUT",
            ServerMessage::Error(_) => "ERROR",
            ServerMessage::GameAborted(_) => "GAME_ABORTED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Codec, JsonCodec};

    fn decode(line: &str) -> Result<ClientMessage, ProtocolError> {
        JsonCodec.decode(line.as_bytes())
    }

    // =====================================================================
    // Client messages
    // =====================================================================

    #[test]
    fn test_decode_make_move() {
        let msg = decode(r#"{"type":"MAKE_MOVE","payload":{"row":1,"col":2}}"#).unwrap();
        assert_eq!(msg, ClientMessage::MakeMove(MoveRequest { row: 1, col: 2 }));
    }

    #[test]
    fn test_decode_join_queue_fills_defaults() {
        let msg = decode(r#"{"type":"JOIN_QUEUE","payload":{"boardSize":4}}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::JoinQueue(QueueRequest {
                board_size: 4,
                ..QueueRequest::default()
            })
        );
    }

    #[test]
    fn test_decode_start_pve_without_payload_uses_defaults() {
        let msg = decode(r#"{"type":"START_PVE"}"#).unwrap();
        assert_eq!(msg, ClientMessage::StartPve(PveRequest::default()));
    }

    #[test]
    fn test_decode_leave_queue_with_or_without_payload() {
        assert_eq!(decode(r#"{"type":"LEAVE_QUEUE"}"#).unwrap(), ClientMessage::LeaveQueue);
        assert_eq!(
            decode(r#"{"type":"LEAVE_QUEUE","payload":{}}"#).unwrap(),
            ClientMessage::LeaveQueue
        );
    }

    #[test]
    fn test_decode_unknown_type_fails() {
        let err = decode(r#"{"type":"CHAT","payload":{"text":"hi"}}"#).unwrap_err();
        assert!(err.to_string().contains("unknown message type"));
    }

    #[test]
    fn test_decode_move_missing_col_fails() {
        assert!(decode(r#"{"type":"MAKE_MOVE","payload":{"row":1}}"#).is_err());
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode("not json").is_err());
        assert!(decode(r#"{"payload":{}}"#).is_err());
    }

    #[test]
    fn test_encode_client_message_round_trips_through_raw_envelope() {
        let msg = ClientMessage::Login(LoginRequest { username: "ana".into() });
        let bytes = JsonCodec.encode(&msg).unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"type":"LOGIN","payload":{"username":"ana"}}"#
        );
        assert_eq!(JsonCodec.decode::<ClientMessage>(&bytes).unwrap(), msg);
    }

    // =====================================================================
    // Server messages
    // =====================================================================

    #[test]
    fn test_game_state_blank_next_player() {
        let msg = ServerMessage::GameState(GameState {
            game_id: GameId("g1".into()),
            board_size: 3,
            board: vec![vec![Cell::X, Cell::Empty, Cell::Empty]; 3],
            next_player: None,
        });
        let value: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "GAME_STATE");
        assert_eq!(value["payload"]["nextPlayer"], "");
        assert_eq!(value["payload"]["board"][0][0], "X");
        assert_eq!(value["payload"]["board"][0][1], "");

        let back: ServerMessage = serde_json::from_value(value).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_round_end_field_names() {
        let msg = ServerMessage::RoundEnd(RoundEnd {
            game_id: GameId("g1".into()),
            round_winner: RoundResult::X,
            series_over: false,
            winner: None,
            winner_user: None,
            loser_user: None,
            round: 1,
            total_rounds: 3,
            x_wins: 1,
            o_wins: 0,
            wins_needed: 2,
        });
        let value = serde_json::to_value(&msg).unwrap();
        let payload = &value["payload"];
        assert_eq!(payload["roundWinner"], "X");
        assert_eq!(payload["seriesOver"], false);
        assert_eq!(payload["winner"], "");
        assert!(payload["winnerUser"].is_null());
        assert_eq!(payload["winsNeeded"], 2);
    }

    #[test]
    fn test_queue_status_wire_shape() {
        let msg = ServerMessage::QueueStatus(QueueStatus { status: QueueState::Waiting });
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"type":"QUEUE_STATUS","payload":{"status":"WAITING"}}"#
        );
        assert_eq!(msg.kind(), "QUEUE_STATUS");
    }

    #[test]
    fn test_records_sync_wraps_snapshot() {
        let msg = ServerMessage::RecordsSync(RecordsSnapshot::default());
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"type":"RECORDS_SYNC","payload":{"players":{}}}"#
        );
    }
}
