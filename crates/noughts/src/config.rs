//! Server configuration loading.

use std::{env, fs, io::ErrorKind, path::Path, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for its JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "noughts.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "NOUGHTS_CONFIG_PATH";
/// Environment variable that overrides [`ServerConfig::bind_addr`].
const BIND_ENV: &str = "NOUGHTS_BIND";
/// Environment variable that overrides [`ServerConfig::records_path`].
const RECORDS_PATH_ENV: &str = "NOUGHTS_RECORDS_PATH";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5678";
pub const DEFAULT_RECORDS_PATH: &str = "records.json";

/// How envelopes travel on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// One JSON object per line over plain TCP.
    #[default]
    Tcp,
    /// One JSON object per text frame.
    Websocket,
}

/// Runtime configuration for the server binary.
///
/// Every field is optional in the file; missing ones take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub records_path: PathBuf,
    pub transport: TransportKind,
    /// Seconds without an inbound frame before a connection is dropped.
    /// 0 disables the check.
    pub idle_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            records_path: PathBuf::from(DEFAULT_RECORDS_PATH),
            transport: TransportKind::default(),
            idle_timeout_secs: 0,
        }
    }
}

impl ServerConfig {
    /// Loads the configuration file named by `NOUGHTS_CONFIG_PATH` (or
    /// `noughts.json`), then applies `NOUGHTS_BIND` and
    /// `NOUGHTS_RECORDS_PATH`.
    pub fn load() -> Self {
        Self::from_file(&resolve_config_path()).with_overrides(
            non_empty_var(BIND_ENV),
            non_empty_var(RECORDS_PATH_ENV).map(PathBuf::from),
        )
    }

    /// Reads `path`, falling back to defaults if it is missing or invalid.
    pub fn from_file(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded server config");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Replaces the bind address and records path where an override is set.
    pub fn with_overrides(mut self, bind_addr: Option<String>, records_path: Option<PathBuf>) -> Self {
        if let Some(addr) = bind_addr {
            self.bind_addr = addr;
        }
        if let Some(path) = records_path {
            self.records_path = path;
        }
        self
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}

fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("noughts-config-{}-{name}", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_from_file_missing_uses_defaults() {
        let path = env::temp_dir().join("noughts-config-does-not-exist.json");
        assert_eq!(ServerConfig::from_file(&path), ServerConfig::default());
    }

    #[test]
    fn test_from_file_partial_fills_defaults() {
        let path = scratch_file("partial.json", r#"{"transport":"websocket","idle_timeout_secs":30}"#);
        let config = ServerConfig::from_file(&path);
        let _ = fs::remove_file(&path);

        assert_eq!(config.transport, TransportKind::Websocket);
        assert_eq!(config.idle_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.records_path, PathBuf::from(DEFAULT_RECORDS_PATH));
    }

    #[test]
    fn test_from_file_malformed_uses_defaults() {
        let path = scratch_file("malformed.json", "{ nope");
        let config = ServerConfig::from_file(&path);
        let _ = fs::remove_file(&path);
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_with_overrides_replaces_only_given_fields() {
        let config = ServerConfig::default().with_overrides(Some("0.0.0.0:9000".into()), None);
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.records_path, PathBuf::from(DEFAULT_RECORDS_PATH));

        let config = config.with_overrides(None, Some(PathBuf::from("/tmp/r.json")));
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.records_path, PathBuf::from("/tmp/r.json"));
    }

    #[test]
    fn test_idle_timeout_zero_is_disabled() {
        assert_eq!(ServerConfig::default().idle_timeout(), None);
    }
}
