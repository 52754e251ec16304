//! `noughts-server` binary: loads configuration, starts the server and runs
//! until Ctrl+C or SIGTERM.

use noughts::{NoughtsError, NoughtsServerBuilder, ServerConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), NoughtsError> {
    init_tracing();

    let config = ServerConfig::load();
    let server = NoughtsServerBuilder::from_config(&config).build().await?;

    info!(
        addr = %server.local_addr()?,
        transport = ?config.transport,
        records = %config.records_path.display(),
        "starting server"
    );

    server.run_until(shutdown_signal()).await
}

/// Log level comes from `RUST_LOG`, `info` otherwise.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "cannot listen for SIGTERM; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
