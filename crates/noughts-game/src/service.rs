//! The game service: queueing, session start, move routing, disconnects.

use std::sync::Arc;

use noughts_player::Client;
use noughts_protocol::{GameId, QueueState, QueueStatus, ServerMessage, Symbol};
use noughts_records::RecordsStore;
use noughts_transport::ConnectionId;
use tracing::{debug, info};

use crate::actor::{SessionActor, SessionContext};
use crate::ai::MoveSelector;
use crate::matchmaking::{Enqueue, MatchmakingQueue, QueueEntry};
use crate::session::{GameSession, SessionSnapshot};
use crate::{Difficulty, GameConfig, GameError, MoveRejection, SessionRegistry};

/// Reason sent with `GAME_ABORTED` when the other side disconnects.
pub const OPPONENT_LEFT: &str = "opponent disconnected";

/// Entry point for everything a connection handler asks of the game layer.
///
/// Constructed once at startup and shared behind an `Arc`.
pub struct GameService {
    queue: MatchmakingQueue,
    ctx: SessionContext,
}

impl GameService {
    pub fn new(records: Arc<dyn RecordsStore>, selector: Arc<dyn MoveSelector>) -> Self {
        Self {
            queue: MatchmakingQueue::new(),
            ctx: SessionContext {
                registry: Arc::new(SessionRegistry::new()),
                records,
                selector,
            },
        }
    }

    pub fn records(&self) -> &Arc<dyn RecordsStore> {
        &self.ctx.records
    }

    /// Queues `client` for a PVP game, or pairs it with whoever is waiting.
    ///
    /// A waiting client gets `QUEUE_STATUS WAITING`. On a pairing both sides
    /// get `QUEUE_STATUS MATCHED`, then the session starts with the waiting
    /// client's configuration; the waiting client plays X.
    ///
    /// Returns the new game's id when a pairing happened.
    ///
    /// # Errors
    /// [`GameError::AlreadyInGame`] or [`GameError::AlreadyWaiting`].
    pub fn join_queue(
        &self,
        client: &Arc<Client>,
        config: GameConfig,
    ) -> Result<Option<GameId>, GameError> {
        if self.ctx.registry.contains(client.id()) {
            return Err(GameError::AlreadyInGame);
        }

        let mut entry = QueueEntry::new(Arc::clone(client), config);
        loop {
            match self.queue.try_enqueue(entry) {
                Enqueue::Waiting => {
                    debug!(conn = %client.id(), "waiting for opponent");
                    client.send(ServerMessage::QueueStatus(QueueStatus {
                        status: QueueState::Waiting,
                    }));
                    return Ok(None);
                }
                Enqueue::AlreadyWaiting => return Err(GameError::AlreadyWaiting),
                Enqueue::Matched { waiting, joiner } => {
                    let waiting_id = waiting.id();
                    if waiting.client.is_closed() {
                        debug!(conn = %waiting_id, "dropping closed queue entry");
                        entry = joiner;
                        continue;
                    }
                    let session = GameSession::pvp(
                        waiting.client,
                        Arc::clone(&joiner.client),
                        waiting.config,
                    );
                    match self.open_session(session, true) {
                        Ok(game_id) => return Ok(Some(game_id)),
                        // the waiting side got seated after we took it from the slot
                        Err(GameError::AlreadyInGame)
                            if !self.ctx.registry.contains(joiner.id()) =>
                        {
                            debug!(conn = %waiting_id, "dropping seated queue entry");
                            entry = joiner;
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }
    }

    /// Gives up a queue slot. Returns `true` if `conn` was waiting.
    pub fn leave_queue(&self, conn: ConnectionId) -> bool {
        let removed = self.queue.remove_if_waiting(conn);
        if removed {
            debug!(%conn, "left queue");
        }
        removed
    }

    pub fn is_waiting(&self, conn: ConnectionId) -> bool {
        self.queue.is_waiting(conn)
    }

    /// Starts a PVP series directly, skipping the queue.
    pub fn start_pvp_game(
        &self,
        x: Arc<Client>,
        o: Arc<Client>,
        config: GameConfig,
    ) -> Result<GameId, GameError> {
        self.open_session(GameSession::pvp(x, o, config), false)
    }

    /// Starts a series against the synthetic opponent. The human plays X.
    pub fn start_pve_game(
        &self,
        human: Arc<Client>,
        difficulty: Difficulty,
        config: GameConfig,
    ) -> Result<GameId, GameError> {
        if self.ctx.registry.contains(human.id()) {
            return Err(GameError::AlreadyInGame);
        }
        self.queue.remove_if_waiting(human.id());
        self.open_session(GameSession::pve(human, difficulty, config), false)
    }

    /// Routes a move to the mover's session.
    ///
    /// # Errors
    /// The [`MoveRejection`] to report back to the mover.
    pub async fn handle_move(
        &self,
        conn: ConnectionId,
        row: i64,
        col: i64,
    ) -> Result<(), MoveRejection> {
        let handle = self
            .ctx
            .registry
            .get(conn)
            .ok_or(MoveRejection::NotInGame)?;
        handle.submit_move(conn, row, col).await
    }

    /// Cleans up after a closed connection: leaves the queue and aborts any
    /// running session for both sides.
    pub async fn disconnect(&self, conn: ConnectionId) {
        self.leave_queue(conn);
        if let Some(handle) = self.ctx.registry.remove(conn) {
            if let Err(e) = handle.abort(conn, OPPONENT_LEFT).await {
                debug!(%conn, error = %e, "session already gone");
            }
        }
    }

    pub fn is_in_game(&self, conn: ConnectionId) -> bool {
        self.ctx.registry.contains(conn)
    }

    /// The running session `conn` sits in, if any.
    pub async fn snapshot(&self, conn: ConnectionId) -> Option<SessionSnapshot> {
        let handle = self.ctx.registry.get(conn)?;
        handle.snapshot().await.ok()
    }

    pub fn active_sessions(&self) -> usize {
        self.ctx.registry.session_count()
    }

    fn open_session(&self, session: GameSession, matched: bool) -> Result<GameId, GameError> {
        let (actor, handle) = SessionActor::new(session, self.ctx.clone());
        let session = actor.session();
        self.ctx
            .registry
            .insert_all(&session.connections(), &handle)?;

        if matched {
            for (_, client) in session.seats() {
                client.send(ServerMessage::QueueStatus(QueueStatus {
                    status: QueueState::Matched,
                }));
            }
        }
        for (symbol, client) in session.seats() {
            client.send(ServerMessage::GameStart(session.game_start(symbol)));
        }
        let state = ServerMessage::GameState(session.game_state(false));
        for (_, client) in session.seats() {
            client.send(state.clone());
        }

        let game_id = handle.game_id().clone();
        info!(
            %game_id,
            mode = %session.mode(),
            board_size = session.board().size(),
            x = %session.name_of(Symbol::X).unwrap_or_default(),
            o = %session.name_of(Symbol::O).unwrap_or_default(),
            "game started"
        );
        actor.spawn();
        Ok(game_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FirstEmptySelector;
    use crate::session::generate_game_id;
    use noughts_records::MemoryRecordsStore;

    fn service() -> GameService {
        GameService::new(Arc::new(MemoryRecordsStore::new()), Arc::new(FirstEmptySelector))
    }

    fn player(name: &str) -> (Arc<Client>, noughts_player::Outbox) {
        let (client, outbox) = Client::new(ConnectionId::next());
        client.set_username(name.to_string()).unwrap();
        (client, outbox)
    }

    #[tokio::test]
    async fn test_join_queue_requeues_joiner_when_waiting_side_is_seated() {
        let service = service();
        let (ana, _ana_out) = player("ana");
        let (bo, mut bo_out) = player("bo");
        service.join_queue(&ana, GameConfig::default()).unwrap();

        // ana starts another game between leaving the slot and being paired
        let (tx, _rx) = tokio::sync::mpsc::channel(1);
        let elsewhere = crate::SessionHandle::new(generate_game_id(), tx);
        service.ctx.registry.insert_all(&[ana.id()], &elsewhere).unwrap();

        assert_eq!(service.join_queue(&bo, GameConfig::default()), Ok(None));
        assert!(service.is_waiting(bo.id()));
        assert!(!service.is_in_game(bo.id()));
        assert_eq!(service.active_sessions(), 1);

        let statuses: Vec<_> = std::iter::from_fn(|| bo_out.try_recv().ok()).collect();
        assert!(matches!(
            statuses.as_slice(),
            [ServerMessage::QueueStatus(s)] if s.status == QueueState::Waiting
        ));
    }
}
