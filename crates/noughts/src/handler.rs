//! Per-connection handler: records sync, login and message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Spawn the writer task that drains the client's outbox
//!   2. Send `RECORDS_SYNC`
//!   3. Loop: receive frames → decode → dispatch
//!   4. On exit, the guard logs out the username and aborts any session

use std::sync::Arc;
use std::time::Duration;

use noughts_game::{Difficulty, GameConfig};
use noughts_player::{Client, Outbox};
use noughts_protocol::{
    ClientMessage, Codec, ErrorPayload, JsonCodec, LoginOk, MoveRequest, QueueState,
    QueueStatus, ServerMessage,
};
use noughts_transport::{Connection, ConnectionId};
use tracing::{debug, info, trace, warn};

use crate::NoughtsError;
use crate::server::ServerState;

const LOGIN_REQUIRED: &str = "login required";

/// Drop guard that releases everything a connection holds when its handler
/// exits, including on panic.
///
/// `Drop` is synchronous, so the session abort runs as a fire-and-forget
/// task.
struct ConnectionGuard {
    client: Arc<Client>,
    state: Arc<ServerState>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.client.close();
        self.state.users.logout(&self.client);

        let conn_id = self.client.id();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.game.disconnect(conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Connection>(
    conn: Arc<C>,
    state: Arc<ServerState>,
) -> Result<(), NoughtsError> {
    let conn_id = conn.id();
    debug!(%conn_id, "handling new connection");

    let (client, outbox) = Client::new(conn_id);
    let writer = tokio::spawn(write_loop(
        Arc::clone(&conn),
        Arc::clone(&client),
        outbox,
        state.codec,
    ));
    let guard = ConnectionGuard {
        client: Arc::clone(&client),
        state: Arc::clone(&state),
    };

    client.send(ServerMessage::RecordsSync(state.game.records().snapshot()));

    let result = read_loop(conn.as_ref(), &client, &state).await;

    drop(guard);
    if let Err(e) = writer.await {
        warn!(%conn_id, error = %e, "writer task failed");
    }
    debug!(%conn_id, "connection finished");
    result
}

/// Sole writer for one connection. Runs until the client is closed, the
/// outbox is dropped, or a send fails, then closes the connection.
async fn write_loop<C: Connection>(
    conn: Arc<C>,
    client: Arc<Client>,
    mut outbox: Outbox,
    codec: JsonCodec,
) {
    let conn_id = conn.id();
    loop {
        let msg = tokio::select! {
            biased;
            msg = outbox.recv() => match msg {
                Some(msg) => msg,
                None => break,
            },
            () = client.closed() => break,
        };

        let bytes = match codec.encode(&msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(%conn_id, kind = msg.kind(), error = %e, "failed to encode message");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            debug!(%conn_id, error = %e, "send failed");
            break;
        }
        trace!(%conn_id, kind = msg.kind(), "sent");
    }

    client.close();
    if let Err(e) = conn.close().await {
        trace!(%conn_id, error = %e, "close after writer exit");
    }
}

async fn read_loop<C: Connection>(
    conn: &C,
    client: &Arc<Client>,
    state: &ServerState,
) -> Result<(), NoughtsError> {
    let conn_id = client.id();
    loop {
        let frame = tokio::select! {
            () = client.closed() => {
                debug!(%conn_id, "client closed by writer");
                return Ok(());
            }
            frame = next_frame(conn, conn_id, state.idle_timeout) => frame?,
        };

        let Some(data) = frame else {
            info!(%conn_id, "connection closed");
            return Ok(());
        };

        let msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(%conn_id, error = %e, "ignoring undecodable frame");
                continue;
            }
        };
        dispatch(client, state, msg).await;
    }
}

/// Next inbound frame, or `None` on a clean close or when the idle limit
/// passes without one.
async fn next_frame<C: Connection>(
    conn: &C,
    conn_id: ConnectionId,
    idle_timeout: Option<Duration>,
) -> Result<Option<Vec<u8>>, NoughtsError> {
    let Some(limit) = idle_timeout else {
        return Ok(conn.recv().await?);
    };
    match tokio::time::timeout(limit, conn.recv()).await {
        Ok(frame) => Ok(frame?),
        Err(_) => {
            info!(%conn_id, "connection idle for too long");
            Ok(None)
        }
    }
}

async fn dispatch(client: &Arc<Client>, state: &ServerState, msg: ClientMessage) {
    match msg {
        ClientMessage::Login(req) => match state.users.login(client, &req.username) {
            Ok(username) => {
                client.send(ServerMessage::LoginOk(LoginOk { username }));
                client.send(ServerMessage::RecordsSync(state.game.records().snapshot()));
            }
            Err(e) => {
                client.send(ServerMessage::LoginError(ErrorPayload::new(e.to_string())));
            }
        },
        ClientMessage::JoinQueue(req) => {
            if !logged_in(client) {
                return;
            }
            let config = GameConfig::from_queue_request(&req);
            if let Err(e) = state.game.join_queue(client, config) {
                client.send(ServerMessage::error(e.to_string()));
            }
        }
        ClientMessage::LeaveQueue => {
            if state.game.leave_queue(client.id()) {
                client.send(ServerMessage::QueueStatus(QueueStatus {
                    status: QueueState::Cancelled,
                }));
            }
        }
        ClientMessage::StartPve(req) => {
            if !logged_in(client) {
                return;
            }
            let difficulty = Difficulty::from_name(&req.difficulty);
            let config = GameConfig::from_pve_request(&req);
            if let Err(e) = state.game.start_pve_game(Arc::clone(client), difficulty, config) {
                client.send(ServerMessage::error(e.to_string()));
            }
        }
        ClientMessage::MakeMove(MoveRequest { row, col }) => {
            if let Err(rejection) = state.game.handle_move(client.id(), row, col).await {
                trace!(conn_id = %client.id(), row, col, %rejection, "move rejected");
                client.send(ServerMessage::error(rejection.to_string()));
            }
        }
    }
}

/// Sends `ERROR "login required"` and returns `false` for an anonymous
/// client.
fn logged_in(client: &Client) -> bool {
    if client.username().is_some() {
        return true;
    }
    client.send(ServerMessage::error(LOGIN_REQUIRED));
    false
}
