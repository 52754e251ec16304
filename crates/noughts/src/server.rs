//! `NoughtsServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → player → game.

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use noughts_game::{GameService, MinimaxSelector, MoveSelector};
use noughts_player::ActiveUsers;
use noughts_protocol::JsonCodec;
use noughts_records::{FileRecordsStore, MemoryRecordsStore, RecordsStore};
use noughts_transport::{TcpLineTransport, Transport, WebSocketTransport};
use tracing::{debug, error, info};

use crate::config::{DEFAULT_BIND_ADDR, ServerConfig, TransportKind};
use crate::handler::handle_connection;
use crate::NoughtsError;

/// State shared by every connection handler.
///
/// Built once by [`NoughtsServerBuilder::build`]; nothing here is a
/// process-wide global.
pub(crate) struct ServerState {
    pub(crate) users: ActiveUsers,
    pub(crate) game: GameService,
    pub(crate) codec: JsonCodec,
    pub(crate) idle_timeout: Option<Duration>,
}

/// Builder for configuring and starting a noughts server.
///
/// ```rust,no_run
/// # async fn run() -> Result<(), noughts::NoughtsError> {
/// let server = noughts::NoughtsServer::builder()
///     .bind("0.0.0.0:5678")
///     .records_path("records.json")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct NoughtsServerBuilder {
    bind_addr: String,
    transport: TransportKind,
    records: Option<Arc<dyn RecordsStore>>,
    records_path: Option<PathBuf>,
    selector: Arc<dyn MoveSelector>,
    idle_timeout: Option<Duration>,
}

impl NoughtsServerBuilder {
    /// Line-framed TCP on the default address, in-memory records.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            transport: TransportKind::Tcp,
            records: None,
            records_path: None,
            selector: Arc::new(MinimaxSelector),
            idle_timeout: None,
        }
    }

    /// Starts from a loaded [`ServerConfig`]. Records go to its file.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            bind_addr: config.bind_addr.clone(),
            transport: config.transport,
            records_path: Some(config.records_path.clone()),
            idle_timeout: config.idle_timeout(),
            ..Self::new()
        }
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn transport(mut self, kind: TransportKind) -> Self {
        self.transport = kind;
        self
    }

    /// Persists records as JSON at `path`.
    pub fn records_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.records_path = Some(path.into());
        self
    }

    /// Uses an existing store. Takes precedence over [`records_path`](Self::records_path).
    pub fn records(mut self, store: Arc<dyn RecordsStore>) -> Self {
        self.records = Some(store);
        self
    }

    /// Replaces the synthetic opponent's strategy.
    pub fn move_selector(mut self, selector: impl MoveSelector) -> Self {
        self.selector = Arc::new(selector);
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Opens the records store and binds the listener.
    ///
    /// # Errors
    /// [`NoughtsError::Records`] if the records file exists but cannot be
    /// read, [`NoughtsError::Transport`] if binding fails.
    pub async fn build(self) -> Result<NoughtsServer, NoughtsError> {
        let records: Arc<dyn RecordsStore> = match (self.records, self.records_path) {
            (Some(store), _) => store,
            (None, Some(path)) => Arc::new(FileRecordsStore::open(path)?),
            (None, None) => Arc::new(MemoryRecordsStore::new()),
        };

        let listener = match self.transport {
            TransportKind::Tcp => Listener::Tcp(TcpLineTransport::bind(&self.bind_addr).await?),
            TransportKind::Websocket => {
                Listener::WebSocket(WebSocketTransport::bind(&self.bind_addr).await?)
            }
        };

        let state = Arc::new(ServerState {
            users: ActiveUsers::new(),
            game: GameService::new(records, self.selector),
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
        });

        Ok(NoughtsServer { listener, state })
    }
}

impl Default for NoughtsServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

enum Listener {
    Tcp(TcpLineTransport),
    WebSocket(WebSocketTransport),
}

/// A bound noughts server. Call [`run`](Self::run) to start accepting.
pub struct NoughtsServer {
    listener: Listener,
    state: Arc<ServerState>,
}

impl NoughtsServer {
    pub fn builder() -> NoughtsServerBuilder {
        NoughtsServerBuilder::new()
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NoughtsError> {
        let addr = match &self.listener {
            Listener::Tcp(t) => t.local_addr()?,
            Listener::WebSocket(w) => w.local_addr()?,
        };
        Ok(addr)
    }

    /// Accepts connections until the process ends, one handler task per
    /// peer.
    pub async fn run(self) -> Result<(), NoughtsError> {
        match self.listener {
            Listener::Tcp(transport) => accept_loop(transport, self.state).await,
            Listener::WebSocket(transport) => accept_loop(transport, self.state).await,
        }
    }

    /// Like [`run`](Self::run), but returns once `shutdown` resolves.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<(), NoughtsError> {
        tokio::select! {
            result = self.run() => result,
            () = shutdown => {
                info!("shutdown requested");
                Ok(())
            }
        }
    }
}

async fn accept_loop<T: Transport>(mut transport: T, state: Arc<ServerState>) -> Result<(), NoughtsError> {
    info!(addr = ?transport.local_addr().ok(), "noughts server running");

    loop {
        match transport.accept().await {
            Ok(conn) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(Arc::new(conn), state).await {
                        debug!(error = %e, "connection ended with error");
                    }
                });
            }
            Err(e) => {
                error!(error = %e, "accept failed");
            }
        }
    }
}
