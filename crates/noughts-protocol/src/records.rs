//! Persistent per-player statistics, as stored on disk and pushed to clients.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Totals for one username.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerRecord {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// Consecutive series won, reset by a loss or a draw.
    pub streak: u32,
    pub best_streak: u32,
}

/// Every known player's record, keyed by username.
///
/// This is both the records file format and the `RECORDS_SYNC` payload:
/// `{"players": {"ana": {"wins": 1, ...}}}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsSnapshot {
    pub players: BTreeMap<String, PlayerRecord>,
}

impl RecordsSnapshot {
    /// The record for `username`, or zeroes if unknown.
    pub fn get(&self, username: &str) -> PlayerRecord {
        self.players.get(username).copied().unwrap_or_default()
    }
}
