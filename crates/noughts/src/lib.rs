//! # Noughts
//!
//! Server for best-of-N series of noughts and crosses on 3×3 to 5×5
//! boards, between two connected players or against a built-in opponent.
//!
//! The server is authoritative: clients send intents (`LOGIN`,
//! `JOIN_QUEUE`, `START_PVE`, `MAKE_MOVE`, `LEAVE_QUEUE`) and receive the
//! resulting state. Per-player statistics persist across restarts.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use noughts::prelude::*;
//!
//! # async fn run() -> Result<(), NoughtsError> {
//! let server = NoughtsServer::builder()
//!     .bind("0.0.0.0:5678")
//!     .records_path("records.json")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{DEFAULT_BIND_ADDR, DEFAULT_RECORDS_PATH, ServerConfig, TransportKind};
pub use error::NoughtsError;
pub use server::{NoughtsServer, NoughtsServerBuilder};

pub mod prelude {
    pub use crate::{NoughtsError, NoughtsServer, NoughtsServerBuilder, ServerConfig, TransportKind};
    pub use noughts_game::{Difficulty, FirstEmptySelector, GameConfig, MinimaxSelector, MoveSelector};
    pub use noughts_records::{FileRecordsStore, MemoryRecordsStore, Outcome, RecordsStore};
}
