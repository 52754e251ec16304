//! Move selection for the synthetic opponent.
//!
//! The native strategies only cover 3×3 boards; the session uses
//! [`random_empty_cell`] for anything larger.

use noughts_protocol::Symbol;
use rand::seq::IndexedRandom;
use tracing::debug;

use crate::{Board, Difficulty};

/// Picks the synthetic opponent's next square.
///
/// Implementations must return an empty in-range square, or `None` when the
/// board is full. The session double-checks the answer and falls back to a
/// random square if it is not playable.
pub trait MoveSelector: Send + Sync + 'static {
    fn choose_move(&self, board: &Board, difficulty: Difficulty, me: Symbol)
    -> Option<(usize, usize)>;
}

/// A uniformly random empty square.
pub fn random_empty_cell(board: &Board) -> Option<(usize, usize)> {
    board.empty_cells().choose(&mut rand::rng()).copied()
}

// ---------------------------------------------------------------------------
// MinimaxSelector
// ---------------------------------------------------------------------------

/// The default opponent.
///
/// - `Easy`: random.
/// - `Medium`: take a winning square, else block one, else random.
/// - `Hard`: full minimax, preferring the quickest win and the slowest loss.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimaxSelector;

impl MoveSelector for MinimaxSelector {
    fn choose_move(
        &self,
        board: &Board,
        difficulty: Difficulty,
        me: Symbol,
    ) -> Option<(usize, usize)> {
        let choice = match difficulty {
            Difficulty::Easy => random_empty_cell(board),
            Difficulty::Medium => winning_square(board, me)
                .or_else(|| winning_square(board, me.other()))
                .or_else(|| random_empty_cell(board)),
            Difficulty::Hard => best_move(board, me),
        };
        debug!(%difficulty, ?choice, "opponent move chosen");
        choice
    }
}

/// A square that completes a line for `symbol` right now.
fn winning_square(board: &Board, symbol: Symbol) -> Option<(usize, usize)> {
    board.empty_cells().into_iter().find(|&(r, c)| {
        let mut probe = board.clone();
        probe.place(r, c, symbol);
        probe.winner() == Some(symbol)
    })
}

fn best_move(board: &Board, me: Symbol) -> Option<(usize, usize)> {
    let mut best: Option<((usize, usize), i32)> = None;
    for (r, c) in board.empty_cells() {
        let mut next = board.clone();
        next.place(r, c, me);
        let score = minimax(&next, me, me.other(), 1);
        if best.is_none_or(|(_, s)| score > s) {
            best = Some(((r, c), score));
        }
    }
    best.map(|(square, _)| square)
}

/// Score of `board` for `me` with `to_move` on turn, `depth` plies in.
fn minimax(board: &Board, me: Symbol, to_move: Symbol, depth: i32) -> i32 {
    match board.winner() {
        Some(w) if w == me => return 10 - depth,
        Some(_) => return depth - 10,
        None if board.is_full() => return 0,
        None => {}
    }

    let scores = board.empty_cells().into_iter().map(|(r, c)| {
        let mut next = board.clone();
        next.place(r, c, to_move);
        minimax(&next, me, to_move.other(), depth + 1)
    });
    if to_move == me {
        scores.max().unwrap_or(0)
    } else {
        scores.min().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// FirstEmptySelector
// ---------------------------------------------------------------------------

/// Always plays the first empty square in row-major order, whatever the
/// difficulty. Handy for scripted games.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstEmptySelector;

impl MoveSelector for FirstEmptySelector {
    fn choose_move(&self, board: &Board, _: Difficulty, _: Symbol) -> Option<(usize, usize)> {
        board.empty_cells().first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // random_empty_cell
    // =====================================================================

    #[test]
    fn test_random_empty_cell_only_returns_empty_squares() {
        let board = Board::from_rows(&["XOX", "O.X", "OX."]);
        for _ in 0..50 {
            let (r, c) = random_empty_cell(&board).unwrap();
            assert!(board.get(r, c).is_empty());
        }
    }

    #[test]
    fn test_random_empty_cell_full_board_returns_none() {
        let board = Board::from_rows(&["XOX", "XOO", "OXX"]);
        assert_eq!(random_empty_cell(&board), None);
    }

    // =====================================================================
    // MinimaxSelector
    // =====================================================================

    #[test]
    fn test_easy_picks_an_empty_square() {
        let board = Board::from_rows(&["XX.", "O..", "..."]);
        let (r, c) = MinimaxSelector
            .choose_move(&board, Difficulty::Easy, Symbol::O)
            .unwrap();
        assert!(board.get(r, c).is_empty());
    }

    #[test]
    fn test_medium_takes_win_before_block() {
        // O can win at (1,2); X threatens (0,2).
        let board = Board::from_rows(&["XX.", "OO.", "X.."]);
        let choice = MinimaxSelector.choose_move(&board, Difficulty::Medium, Symbol::O);
        assert_eq!(choice, Some((1, 2)));
    }

    #[test]
    fn test_medium_blocks_immediate_threat() {
        let board = Board::from_rows(&["XX.", "O..", "..."]);
        let choice = MinimaxSelector.choose_move(&board, Difficulty::Medium, Symbol::O);
        assert_eq!(choice, Some((0, 2)));
    }

    #[test]
    fn test_hard_takes_immediate_win() {
        let board = Board::from_rows(&["OX.", "OX.", "..X"]);
        let choice = MinimaxSelector.choose_move(&board, Difficulty::Hard, Symbol::O);
        assert_eq!(choice, Some((2, 0)));
    }

    #[test]
    fn test_hard_blocks_immediate_threat() {
        let board = Board::from_rows(&["X..", ".X.", "O.."]);
        let choice = MinimaxSelector.choose_move(&board, Difficulty::Hard, Symbol::O);
        assert_eq!(choice, Some((2, 2)));
    }

    #[test]
    fn test_hard_never_loses_to_itself() {
        let mut board = Board::new(3);
        let mut turn = Symbol::X;
        while board.outcome().is_none() {
            let (r, c) = MinimaxSelector
                .choose_move(&board, Difficulty::Hard, turn)
                .unwrap();
            assert!(board.place(r, c, turn));
            turn = turn.other();
        }
        assert_eq!(board.outcome(), Some(noughts_protocol::RoundResult::Draw));
    }

    // =====================================================================
    // FirstEmptySelector
    // =====================================================================

    #[test]
    fn test_first_empty_is_row_major() {
        let board = Board::from_rows(&["XO.", "...", "..."]);
        let choice = FirstEmptySelector.choose_move(&board, Difficulty::Hard, Symbol::O);
        assert_eq!(choice, Some((0, 2)));
    }
}
