//! Per-game configuration: board size, series length, move clock.
//!
//! Client requests are clamped, never rejected. Every adjustment is logged
//! at `warn`.

use std::fmt;

use noughts_protocol::{PveRequest, QueueRequest};
use noughts_timer::TimerPolicy;
use tracing::warn;

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Settings fixed for the lifetime of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    /// Side length N of the N×N board.
    pub board_size: usize,
    /// Rounds in the series; always odd.
    pub total_rounds: u32,
    pub timer: TimerPolicy,
}

impl GameConfig {
    pub const MIN_BOARD_SIZE: usize = 3;
    pub const MAX_BOARD_SIZE: usize = 5;
    pub const MIN_ROUNDS: u32 = 3;
    pub const MAX_ROUNDS: u32 = 7;

    /// Clamps raw request values into a playable configuration.
    pub fn new(board_size: i64, rounds: i64, time_limit_secs: i64, turbo: bool) -> Self {
        Self {
            board_size: clamp_board_size(board_size),
            total_rounds: clamp_rounds(rounds),
            timer: TimerPolicy::from_request(time_limit_secs, turbo),
        }
    }

    pub fn from_queue_request(req: &QueueRequest) -> Self {
        Self::new(req.board_size, req.rounds, req.time_limit, req.turbo)
    }

    pub fn from_pve_request(req: &PveRequest) -> Self {
        Self::new(req.board_size, req.rounds, req.time_limit, req.turbo)
    }

    /// Round wins that end the series early.
    pub fn wins_needed(&self) -> u32 {
        wins_needed(self.total_rounds)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_size: Self::MIN_BOARD_SIZE,
            total_rounds: Self::MIN_ROUNDS,
            timer: TimerPolicy::default(),
        }
    }
}

/// `total_rounds / 2 + 1`.
pub fn wins_needed(total_rounds: u32) -> u32 {
    total_rounds / 2 + 1
}

fn clamp_board_size(requested: i64) -> usize {
    let min = GameConfig::MIN_BOARD_SIZE as i64;
    let max = GameConfig::MAX_BOARD_SIZE as i64;
    let size = requested.clamp(min, max);
    if size != requested {
        warn!(requested, clamped = size, "board size out of range");
    }
    size as usize
}

fn clamp_rounds(requested: i64) -> u32 {
    let mut rounds =
        requested.clamp(GameConfig::MIN_ROUNDS as i64, GameConfig::MAX_ROUNDS as i64) as u32;
    if rounds % 2 == 0 {
        rounds += 1;
    }
    if rounds as i64 != requested {
        warn!(requested, clamped = rounds, "round count adjusted");
    }
    rounds
}

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

/// Strength of the built-in opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Case-insensitive lookup; anything unrecognised is `Easy`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "EASY" => Difficulty::Easy,
            "MEDIUM" => Difficulty::Medium,
            "HARD" => Difficulty::Hard,
            other => {
                warn!(requested = other, "unknown difficulty, using EASY");
                Difficulty::Easy
            }
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => f.write_str("EASY"),
            Difficulty::Medium => f.write_str("MEDIUM"),
            Difficulty::Hard => f.write_str("HARD"),
        }
    }
}
