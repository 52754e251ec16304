//! Win/loss/draw statistics for the noughts server.
//!
//! [`RecordsStore`] is the seam the game service talks to. Two stores ship:
//! [`FileRecordsStore`] keeps a JSON file on disk and [`MemoryRecordsStore`]
//! keeps everything in memory for tests and throwaway servers.

mod error;
mod file;

pub use error::RecordsError;
pub use file::FileRecordsStore;

use std::sync::Mutex;

use noughts_protocol::{PlayerRecord, RecordsSnapshot};

/// Result of a finished series from one player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    /// Folds this outcome into `record`.
    ///
    /// A win extends the streak and may raise the best streak; a loss or a
    /// draw resets the streak.
    pub fn apply(self, record: &mut PlayerRecord) {
        match self {
            Outcome::Win => {
                record.wins += 1;
                record.streak += 1;
                record.best_streak = record.best_streak.max(record.streak);
            }
            Outcome::Loss => {
                record.losses += 1;
                record.streak = 0;
            }
            Outcome::Draw => {
                record.draws += 1;
                record.streak = 0;
            }
        }
    }
}

/// Persistent per-username statistics.
pub trait RecordsStore: Send + Sync + 'static {
    /// Applies `outcome` to `username`'s record, creating it if needed.
    fn update_result(&self, username: &str, outcome: Outcome) -> Result<(), RecordsError>;

    /// A copy of every record.
    fn snapshot(&self) -> RecordsSnapshot;
}

/// A [`RecordsStore`] that forgets everything on drop.
#[derive(Debug, Default)]
pub struct MemoryRecordsStore {
    records: Mutex<RecordsSnapshot>,
}

impl MemoryRecordsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing snapshot.
    pub fn with_snapshot(snapshot: RecordsSnapshot) -> Self {
        Self {
            records: Mutex::new(snapshot),
        }
    }
}

impl RecordsStore for MemoryRecordsStore {
    fn update_result(&self, username: &str, outcome: Outcome) -> Result<(), RecordsError> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        outcome.apply(records.players.entry(username.to_string()).or_default());
        Ok(())
    }

    fn snapshot(&self) -> RecordsSnapshot {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
