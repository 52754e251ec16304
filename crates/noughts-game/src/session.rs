//! The state of one series: seats, board, turn and score.
//!
//! [`GameSession`] is plain data with no locking. It is owned by exactly one
//! session actor, which is the only code that mutates it.

use std::sync::Arc;

use noughts_player::Client;
use noughts_protocol::{
    GameId, GameMode, GameStart, GameState, RoundEnd, RoundResult, Symbol,
};
use noughts_records::Outcome;
use noughts_timer::TimerPolicy;
use noughts_transport::ConnectionId;
use rand::Rng;

use crate::{Board, Difficulty, GameConfig, MoveRejection, wins_needed};

/// Username credited with the synthetic opponent's results.
pub const AI_NAME: &str = "AI";

/// A fresh 32-character hex id.
pub fn generate_game_id() -> GameId {
    let bytes: [u8; 16] = rand::rng().random();
    GameId(bytes.iter().map(|b| format!("{b:02x}")).collect())
}

/// What [`GameSession::record_round`] decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSummary {
    pub round_winner: RoundResult,
    pub series_over: bool,
    /// The series result, once it is over. A tie in round wins is a draw.
    pub series_winner: Option<RoundResult>,
}

/// A point-in-time copy of a session, for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub game_id: GameId,
    pub mode: GameMode,
    pub board: Board,
    pub next: Symbol,
    pub round: u32,
    pub total_rounds: u32,
    pub x_wins: u32,
    pub o_wins: u32,
}

#[derive(Debug)]
pub struct GameSession {
    id: GameId,
    mode: GameMode,
    player_x: Arc<Client>,
    /// `None` in PVE; the synthetic opponent plays O.
    player_o: Option<Arc<Client>>,
    difficulty: Option<Difficulty>,
    board: Board,
    next: Symbol,
    round: u32,
    total_rounds: u32,
    x_wins: u32,
    o_wins: u32,
    timer: TimerPolicy,
}

impl GameSession {
    /// A PVP series. `x` opens every round.
    pub fn pvp(x: Arc<Client>, o: Arc<Client>, config: GameConfig) -> Self {
        Self::new(GameMode::Pvp, x, Some(o), None, config)
    }

    /// A series against the synthetic opponent. The human is always X.
    pub fn pve(human: Arc<Client>, difficulty: Difficulty, config: GameConfig) -> Self {
        Self::new(GameMode::Pve, human, None, Some(difficulty), config)
    }

    fn new(
        mode: GameMode,
        player_x: Arc<Client>,
        player_o: Option<Arc<Client>>,
        difficulty: Option<Difficulty>,
        config: GameConfig,
    ) -> Self {
        Self {
            id: generate_game_id(),
            mode,
            player_x,
            player_o,
            difficulty,
            board: Board::new(config.board_size),
            next: Symbol::X,
            round: 1,
            total_rounds: config.total_rounds,
            x_wins: 0,
            o_wins: 0,
            timer: config.timer,
        }
    }

    pub fn id(&self) -> &GameId {
        &self.id
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty.unwrap_or_default()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn next(&self) -> Symbol {
        self.next
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn timer_policy(&self) -> &TimerPolicy {
        &self.timer
    }

    pub fn wins_needed(&self) -> u32 {
        wins_needed(self.total_rounds)
    }

    /// The symbol `conn` plays, if it is seated here.
    pub fn symbol_of(&self, conn: ConnectionId) -> Option<Symbol> {
        if self.player_x.id() == conn {
            Some(Symbol::X)
        } else if self.player_o.as_ref().is_some_and(|o| o.id() == conn) {
            Some(Symbol::O)
        } else {
            None
        }
    }

    /// Human seats with their symbols.
    pub fn seats(&self) -> impl Iterator<Item = (Symbol, &Arc<Client>)> {
        std::iter::once((Symbol::X, &self.player_x))
            .chain(self.player_o.iter().map(|o| (Symbol::O, o)))
    }

    /// The connections seated at this board.
    pub fn connections(&self) -> Vec<ConnectionId> {
        self.seats().map(|(_, client)| client.id()).collect()
    }

    /// `true` when the synthetic opponent is on turn.
    pub fn is_opponent_turn(&self) -> bool {
        self.mode == GameMode::Pve && self.next == Symbol::O
    }

    /// The name shown and recorded for `symbol`'s side.
    pub fn name_of(&self, symbol: Symbol) -> Option<String> {
        match (symbol, &self.player_o) {
            (Symbol::X, _) => self.player_x.username().map(str::to_string),
            (Symbol::O, Some(o)) => o.username().map(str::to_string),
            (Symbol::O, None) => Some(AI_NAME.to_string()),
        }
    }

    // -- moves --------------------------------------------------------------

    /// Validates a move from `conn` without touching the board.
    ///
    /// Checks run in order: seat, turn, range, occupancy.
    pub fn check_move(
        &self,
        conn: ConnectionId,
        row: i64,
        col: i64,
    ) -> Result<(usize, usize, Symbol), MoveRejection> {
        let symbol = self.symbol_of(conn).ok_or(MoveRejection::NotInGame)?;
        if symbol != self.next {
            return Err(MoveRejection::NotYourTurn);
        }
        let (r, c) = self
            .board
            .locate(row, col)
            .ok_or(MoveRejection::OutOfRange)?;
        if !self.board.get(r, c).is_empty() {
            return Err(MoveRejection::CellOccupied);
        }
        Ok((r, c, symbol))
    }

    /// Marks a validated square and reports whether the round is decided.
    pub fn place(&mut self, row: usize, col: usize, symbol: Symbol) -> Option<RoundResult> {
        self.board.place(row, col, symbol);
        self.board.outcome()
    }

    /// Hands the turn to the other side and returns it.
    pub fn pass_turn(&mut self) -> Symbol {
        self.next = self.next.other();
        self.next
    }

    // -- rounds -------------------------------------------------------------

    /// Scores a decided round and works out whether the series is over.
    pub fn record_round(&mut self, result: RoundResult) -> RoundSummary {
        match result {
            RoundResult::X => self.x_wins += 1,
            RoundResult::O => self.o_wins += 1,
            RoundResult::Draw => {}
        }
        let needed = self.wins_needed();
        let series_over = self.x_wins >= needed
            || self.o_wins >= needed
            || self.round >= self.total_rounds;
        let series_winner = series_over.then(|| match self.x_wins.cmp(&self.o_wins) {
            std::cmp::Ordering::Greater => RoundResult::X,
            std::cmp::Ordering::Less => RoundResult::O,
            std::cmp::Ordering::Equal => RoundResult::Draw,
        });
        RoundSummary {
            round_winner: result,
            series_over,
            series_winner,
        }
    }

    /// Clears the board for the next round; X opens again.
    pub fn start_next_round(&mut self) {
        self.round += 1;
        self.board.clear();
        self.next = Symbol::X;
    }

    /// Per-player results for a finished series, or `None` if a side has
    /// no username to credit.
    pub fn series_outcomes(&self, winner: RoundResult) -> Option<[(String, Outcome); 2]> {
        let x = self.name_of(Symbol::X)?;
        let o = self.name_of(Symbol::O)?;
        Some(match winner {
            RoundResult::X => [(x, Outcome::Win), (o, Outcome::Loss)],
            RoundResult::O => [(x, Outcome::Loss), (o, Outcome::Win)],
            RoundResult::Draw => [(x, Outcome::Draw), (o, Outcome::Draw)],
        })
    }

    // -- messages -----------------------------------------------------------

    /// `GAME_START` as seen by the player holding `symbol`.
    pub fn game_start(&self, symbol: Symbol) -> GameStart {
        GameStart {
            game_id: self.id.clone(),
            your_symbol: symbol,
            round: self.round,
            total_rounds: self.total_rounds,
            x_wins: self.x_wins,
            o_wins: self.o_wins,
            wins_needed: self.wins_needed(),
            board_size: self.board.size(),
            mode: self.mode,
            time_limit: self.timer.time_limit_secs,
            opponent: self.name_of(symbol.other()).unwrap_or_default(),
        }
    }

    /// `GAME_STATE` for the current board. Pass `round_over` to blank the
    /// next player.
    pub fn game_state(&self, round_over: bool) -> GameState {
        GameState {
            game_id: self.id.clone(),
            board_size: self.board.size(),
            board: self.board.rows(),
            next_player: (!round_over).then_some(self.next),
        }
    }

    pub fn round_end(&self, summary: &RoundSummary) -> RoundEnd {
        let (winner_user, loser_user) = match summary.series_winner.and_then(|w| w.winner()) {
            Some(symbol) => (self.name_of(symbol), self.name_of(symbol.other())),
            None => (None, None),
        };
        RoundEnd {
            game_id: self.id.clone(),
            round_winner: summary.round_winner,
            series_over: summary.series_over,
            winner: summary.series_winner,
            winner_user,
            loser_user,
            round: self.round,
            total_rounds: self.total_rounds,
            x_wins: self.x_wins,
            o_wins: self.o_wins,
            wins_needed: self.wins_needed(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            game_id: self.id.clone(),
            mode: self.mode,
            board: self.board.clone(),
            next: self.next,
            round: self.round,
            total_rounds: self.total_rounds,
            x_wins: self.x_wins,
            o_wins: self.o_wins,
        }
    }
}
