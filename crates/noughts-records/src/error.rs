//! Error types for the records store.

use std::path::PathBuf;

/// Failures reading or writing statistics.
#[derive(Debug, thiserror::Error)]
pub enum RecordsError {
    /// The records file could not be read or written.
    #[error("records file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The records could not be serialized.
    #[error("encode records: {0}")]
    Encode(#[source] serde_json::Error),
}
