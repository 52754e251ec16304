//! JSON-file backed records.

use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use noughts_protocol::RecordsSnapshot;
use tracing::{debug, info, warn};

use crate::{Outcome, RecordsError, RecordsStore};

/// Keeps records in memory and rewrites the whole file after every update.
///
/// Writes go to `<path>.tmp` first and are renamed over the target, so a
/// crash mid-write leaves the previous file intact.
///
/// Inside a Tokio runtime the file write runs on the blocking pool and
/// `update_result` returns as soon as the in-memory record has changed; a
/// failed write is logged. Outside a runtime the write happens inline.
#[derive(Debug)]
pub struct FileRecordsStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    state: Mutex<State>,
    /// Generation of the newest snapshot on disk.
    written: Mutex<u64>,
}

#[derive(Debug, Default)]
struct State {
    records: RecordsSnapshot,
    generation: u64,
}

impl FileRecordsStore {
    /// Loads `path`.
    ///
    /// A missing file starts empty. A file that cannot be parsed is moved
    /// to `<path>.corrupt` and the store starts empty.
    ///
    /// # Errors
    /// Returns [`RecordsError::Io`] if the file exists but cannot be read,
    /// or cannot be moved aside after a failed parse.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RecordsError> {
        let path = path.into();
        let records = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RecordsSnapshot>(&contents) {
                Ok(snapshot) => {
                    info!(
                        path = %path.display(),
                        players = snapshot.players.len(),
                        "loaded records"
                    );
                    snapshot
                }
                Err(err) => {
                    let aside = with_suffix(&path, ".corrupt");
                    fs::rename(&path, &aside).map_err(|source| RecordsError::Io {
                        path: path.clone(),
                        source,
                    })?;
                    warn!(
                        path = %path.display(),
                        moved_to = %aside.display(),
                        error = %err,
                        "failed to parse records; starting empty"
                    );
                    RecordsSnapshot::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "records file not found; starting empty");
                RecordsSnapshot::default()
            }
            Err(source) => return Err(RecordsError::Io { path, source }),
        };

        Ok(Self {
            inner: Arc::new(Inner {
                path,
                state: Mutex::new(State {
                    records,
                    generation: 0,
                }),
                written: Mutex::new(0),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }
}

impl Inner {
    /// Writes `snapshot` unless a newer generation already reached disk.
    fn persist(&self, generation: u64, snapshot: &RecordsSnapshot) -> Result<(), RecordsError> {
        let mut written = self.written.lock().unwrap_or_else(|p| p.into_inner());
        if *written >= generation {
            return Ok(());
        }

        let json = serde_json::to_vec_pretty(snapshot).map_err(RecordsError::Encode)?;
        let tmp = with_suffix(&self.path, ".tmp");
        let io = |source| RecordsError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io)?;
        }
        fs::write(&tmp, json).map_err(io)?;
        fs::rename(&tmp, &self.path).map_err(io)?;

        *written = generation;
        debug!(path = %self.path.display(), generation, "records saved");
        Ok(())
    }
}

impl RecordsStore for FileRecordsStore {
    fn update_result(&self, username: &str, outcome: Outcome) -> Result<(), RecordsError> {
        let (generation, snapshot) = {
            let mut state = self.inner.state.lock().unwrap_or_else(|p| p.into_inner());
            outcome.apply(state.records.players.entry(username.to_string()).or_default());
            state.generation += 1;
            (state.generation, state.records.clone())
        };

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let inner = Arc::clone(&self.inner);
                runtime.spawn_blocking(move || {
                    if let Err(e) = inner.persist(generation, &snapshot) {
                        warn!(error = %e, generation, "failed to save records");
                    }
                });
                Ok(())
            }
            Err(_) => self.inner.persist(generation, &snapshot),
        }
    }

    fn snapshot(&self) -> RecordsSnapshot {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .records
            .clone()
    }
}

fn with_suffix(path: &Path, suffix: impl AsRef<OsStr>) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}
