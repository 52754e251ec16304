//! Session actor: one Tokio task per running series.
//!
//! The actor owns its [`GameSession`] and its [`TurnTimer`]. Moves, timer
//! expiries, aborts and snapshot queries all arrive as commands on one
//! channel, so a move and a timeout for the same board are handled one
//! after the other and never interleave.

use std::ops::ControlFlow;
use std::sync::Arc;

use noughts_protocol::{
    GameAborted, GameId, RoundResult, ServerMessage, Symbol, TimeoutNotice,
};
use noughts_records::RecordsStore;
use noughts_timer::{TurnTimer, TurnToken};
use noughts_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::ai::{MoveSelector, random_empty_cell};
use crate::session::{GameSession, RoundSummary, SessionSnapshot};
use crate::{GameError, MoveRejection, SessionRegistry};

/// Bound on queued commands per session.
pub(crate) const COMMAND_CHANNEL_SIZE: usize = 64;

pub(crate) enum SessionCommand {
    Move {
        conn: ConnectionId,
        row: i64,
        col: i64,
        reply: oneshot::Sender<Result<(), MoveRejection>>,
    },
    TurnExpired {
        token: TurnToken,
    },
    /// A seated connection went away.
    Abort {
        by: ConnectionId,
        reason: String,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// Cheap, cloneable handle to a running session actor.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    game_id: GameId,
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub(crate) fn new(game_id: GameId, sender: mpsc::Sender<SessionCommand>) -> Self {
        Self { game_id, sender }
    }

    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    /// Submits a move and waits for the verdict.
    ///
    /// A session that has already ended answers [`MoveRejection::NotInGame`].
    pub async fn submit_move(
        &self,
        conn: ConnectionId,
        row: i64,
        col: i64,
    ) -> Result<(), MoveRejection> {
        let (reply, verdict) = oneshot::channel();
        self.sender
            .send(SessionCommand::Move {
                conn,
                row,
                col,
                reply,
            })
            .await
            .map_err(|_| MoveRejection::NotInGame)?;
        verdict.await.map_err(|_| MoveRejection::NotInGame)?
    }

    /// Ends the series without a result.
    pub async fn abort(&self, by: ConnectionId, reason: impl Into<String>) -> Result<(), GameError> {
        self.sender
            .send(SessionCommand::Abort {
                by,
                reason: reason.into(),
            })
            .await
            .map_err(|_| GameError::Unavailable(self.game_id.clone()))
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, GameError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Snapshot { reply })
            .await
            .map_err(|_| GameError::Unavailable(self.game_id.clone()))?;
        rx.await
            .map_err(|_| GameError::Unavailable(self.game_id.clone()))
    }
}

/// Services a session actor needs from its owner.
#[derive(Clone)]
pub(crate) struct SessionContext {
    pub registry: Arc<SessionRegistry>,
    pub records: Arc<dyn RecordsStore>,
    pub selector: Arc<dyn MoveSelector>,
}

pub(crate) struct SessionActor {
    session: GameSession,
    timer: TurnTimer,
    ctx: SessionContext,
    /// Feeds timer expiries back in without keeping the channel open.
    commands: mpsc::WeakSender<SessionCommand>,
    receiver: mpsc::Receiver<SessionCommand>,
}

impl SessionActor {
    /// Builds the actor and its handle. Nothing runs until [`spawn`](Self::spawn).
    pub(crate) fn new(session: GameSession, ctx: SessionContext) -> (Self, SessionHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let handle = SessionHandle::new(session.id().clone(), tx);
        let actor = Self {
            timer: TurnTimer::new(session.timer_policy()),
            commands: handle.sender.downgrade(),
            session,
            ctx,
            receiver: rx,
        };
        (actor, handle)
    }

    pub(crate) fn session(&self) -> &GameSession {
        &self.session
    }

    pub(crate) fn spawn(self) {
        tokio::spawn(self.run());
    }

    async fn run(mut self) {
        let game_id = self.session.id().clone();
        info!(%game_id, mode = %self.session.mode(), "session started");
        self.arm_timer();

        while let Some(cmd) = self.receiver.recv().await {
            let flow = match cmd {
                SessionCommand::Move {
                    conn,
                    row,
                    col,
                    reply,
                } => match self.handle_move(conn, row, col) {
                    Ok(flow) => {
                        let _ = reply.send(Ok(()));
                        flow
                    }
                    Err(rejection) => {
                        debug!(%game_id, %conn, row, col, %rejection, "move rejected");
                        let _ = reply.send(Err(rejection));
                        ControlFlow::Continue(())
                    }
                },
                SessionCommand::TurnExpired { token } => self.handle_timeout(token),
                SessionCommand::Abort { by, reason } => self.handle_abort(by, reason),
                SessionCommand::Snapshot { reply } => {
                    let _ = reply.send(self.session.snapshot());
                    ControlFlow::Continue(())
                }
            };
            if flow.is_break() {
                break;
            }
        }

        self.timer.cancel();
        self.receiver.close();
        while let Ok(cmd) = self.receiver.try_recv() {
            if let SessionCommand::Move { reply, .. } = cmd {
                let _ = reply.send(Err(MoveRejection::NotInGame));
            }
        }
        info!(%game_id, "session stopped");
    }

    // -- commands -----------------------------------------------------------

    fn handle_move(
        &mut self,
        conn: ConnectionId,
        row: i64,
        col: i64,
    ) -> Result<ControlFlow<()>, MoveRejection> {
        let (r, c, symbol) = self.session.check_move(conn, row, col)?;
        self.timer.cancel();
        debug!(game_id = %self.session.id(), %symbol, row = r, col = c, "move accepted");
        Ok(self.play(r, c, symbol))
    }

    fn handle_timeout(&mut self, token: TurnToken) -> ControlFlow<()> {
        if !self.timer.is_current(token) {
            trace!(game_id = %self.session.id(), token = token.into_inner(), "stale turn timeout ignored");
            return ControlFlow::Continue(());
        }
        let timed_out = self.session.next();
        let next_player = self.session.pass_turn();
        info!(game_id = %self.session.id(), %timed_out, "turn timed out");
        self.broadcast(ServerMessage::Timeout(TimeoutNotice {
            game_id: self.session.id().clone(),
            timed_out,
            next_player,
            message: format!("{timed_out} ran out of time, {next_player} to move"),
        }));
        self.after_turn_change()
    }

    fn handle_abort(&mut self, by: ConnectionId, reason: String) -> ControlFlow<()> {
        self.timer.cancel();
        self.release_seats();
        let game_id = self.session.id().clone();
        for (_, client) in self.session.seats().filter(|(_, c)| c.id() != by) {
            client.send(ServerMessage::GameAborted(GameAborted {
                game_id: game_id.clone(),
                reason: reason.clone(),
            }));
        }
        info!(%game_id, %by, %reason, "session aborted");
        ControlFlow::Break(())
    }

    // -- turn flow ----------------------------------------------------------

    /// Applies a validated mark, then resolves the round or passes the turn.
    fn play(&mut self, r: usize, c: usize, symbol: Symbol) -> ControlFlow<()> {
        if let Some(result) = self.session.place(r, c, symbol) {
            return self.finish_round(result);
        }
        self.session.pass_turn();
        self.after_turn_change()
    }

    /// Lets the synthetic opponent answer if it is on turn, then publishes
    /// the board and starts the clock for whoever moves next.
    fn after_turn_change(&mut self) -> ControlFlow<()> {
        if self.session.is_opponent_turn() {
            match self.opponent_move() {
                Some((r, c)) => {
                    if let Some(result) = self.session.place(r, c, Symbol::O) {
                        return self.finish_round(result);
                    }
                    self.session.pass_turn();
                }
                None => {
                    warn!(game_id = %self.session.id(), "opponent found no move, passing");
                    self.session.pass_turn();
                }
            }
        }
        self.broadcast(ServerMessage::GameState(self.session.game_state(false)));
        self.arm_timer();
        ControlFlow::Continue(())
    }

    fn opponent_move(&self) -> Option<(usize, usize)> {
        let board = self.session.board();
        if board.size() != 3 {
            return random_empty_cell(board);
        }
        let choice = self
            .ctx
            .selector
            .choose_move(board, self.session.difficulty(), Symbol::O);
        match choice {
            Some((r, c)) if r < 3 && c < 3 && board.get(r, c).is_empty() => Some((r, c)),
            other => {
                if other.is_some() {
                    warn!(game_id = %self.session.id(), ?other, "opponent chose an unplayable square");
                }
                random_empty_cell(board)
            }
        }
    }

    fn finish_round(&mut self, result: RoundResult) -> ControlFlow<()> {
        self.timer.cancel();
        let summary = self.session.record_round(result);
        info!(
            game_id = %self.session.id(),
            round = self.session.round(),
            %result,
            series_over = summary.series_over,
            "round finished"
        );

        if summary.series_over {
            // unseat first so a client reacting to ROUND_END can queue again
            self.record_series(&summary);
            self.release_seats();
        }

        self.broadcast(ServerMessage::GameState(self.session.game_state(true)));
        self.broadcast(ServerMessage::RoundEnd(self.session.round_end(&summary)));

        if summary.series_over {
            let records = self.ctx.records.snapshot();
            self.broadcast(ServerMessage::RecordsSync(records));
            return ControlFlow::Break(());
        }

        self.session.start_next_round();
        for (symbol, client) in self.session.seats() {
            client.send(ServerMessage::GameStart(self.session.game_start(symbol)));
        }
        self.broadcast(ServerMessage::GameState(self.session.game_state(false)));
        self.arm_timer();
        ControlFlow::Continue(())
    }

    fn record_series(&self, summary: &RoundSummary) {
        let Some(winner) = summary.series_winner else {
            return;
        };
        let Some(outcomes) = self.session.series_outcomes(winner) else {
            warn!(game_id = %self.session.id(), "player without username, series not recorded");
            return;
        };
        for (username, outcome) in outcomes {
            if let Err(e) = self.ctx.records.update_result(&username, outcome) {
                warn!(%username, ?outcome, error = %e, "failed to record result");
            }
        }
    }

    // -- helpers ------------------------------------------------------------

    fn arm_timer(&mut self) {
        let commands = self.commands.clone();
        self.timer.arm(move |token| async move {
            if let Some(tx) = commands.upgrade() {
                let _ = tx.send(SessionCommand::TurnExpired { token }).await;
            }
        });
    }

    fn release_seats(&self) {
        for conn in self.session.connections() {
            self.ctx.registry.remove_if(conn, self.session.id());
        }
    }

    fn broadcast(&self, msg: ServerMessage) {
        for (_, client) in self.session.seats() {
            client.send(msg.clone());
        }
    }
}
