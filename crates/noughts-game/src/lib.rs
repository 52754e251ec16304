//! Game engine for the noughts server.
//!
//! Each running series is an isolated Tokio task (actor model) that owns
//! its board and its turn timer.
//!
//! # Key types
//!
//! - [`GameService`]: queueing, session start, move routing, disconnects
//! - [`MatchmakingQueue`]: the single waiting slot
//! - [`GameSession`]: board, turn, round and score of one series
//! - [`SessionHandle`]: send commands to a running session actor
//! - [`Board`]: N×N grid and its win/draw rules
//! - [`GameConfig`] / [`Difficulty`]: clamped per-game settings
//! - [`MoveSelector`]: the synthetic opponent's strategy

mod actor;
mod ai;
mod board;
mod config;
mod error;
mod matchmaking;
mod registry;
mod service;
mod session;

pub use actor::SessionHandle;
pub use ai::{FirstEmptySelector, MinimaxSelector, MoveSelector, random_empty_cell};
pub use board::Board;
pub use config::{Difficulty, GameConfig, wins_needed};
pub use error::{GameError, MoveRejection};
pub use matchmaking::{Enqueue, MatchmakingQueue, QueueEntry};
pub use registry::SessionRegistry;
pub use service::{GameService, OPPONENT_LEFT};
pub use session::{AI_NAME, GameSession, RoundSummary, SessionSnapshot, generate_game_id};
