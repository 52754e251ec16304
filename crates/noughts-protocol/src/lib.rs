//! Wire protocol for the noughts server.
//!
//! - **Types** ([`Symbol`], [`Cell`], [`RoundResult`], [`GameMode`],
//!   [`GameId`]): the game vocabulary.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`] and their payloads):
//!   the typed envelopes, one per frame.
//! - **Records** ([`RecordsSnapshot`], [`PlayerRecord`]): statistics as
//!   persisted and as pushed to clients.
//! - **Codec** ([`Codec`], [`JsonCodec`]): envelope ↔ bytes.
//!
//! ```text
//! Transport (frames) → Protocol (envelopes) → Player / Game
//! ```

mod codec;
mod error;
mod messages;
mod records;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use messages::{
    ClientMessage, ErrorPayload, GameAborted, GameStart, GameState, LoginOk,
    LoginRequest, MoveRequest, PveRequest, QueueRequest, QueueState,
    QueueStatus, RawEnvelope, RoundEnd, ServerMessage, TimeoutNotice,
};
pub use records::{PlayerRecord, RecordsSnapshot};
pub use types::{Cell, GameId, GameMode, RoundResult, Symbol};
