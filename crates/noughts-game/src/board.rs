//! The N×N board and its win/draw rules.

use noughts_protocol::{Cell, RoundResult, Symbol};

/// A square board, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// An empty `size`×`size` board.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Cell::Empty; size * size],
        }
    }

    /// Builds a board from rows of `'X'`, `'O'` and anything else for empty.
    ///
    /// Panics if the rows are not square. Meant for tests and fixtures.
    pub fn from_rows(rows: &[&str]) -> Self {
        let size = rows.len();
        let mut board = Self::new(size);
        for (r, row) in rows.iter().enumerate() {
            let chars: Vec<char> = row.chars().collect();
            assert_eq!(chars.len(), size, "row {r} is not {size} wide");
            for (c, ch) in chars.into_iter().enumerate() {
                board.cells[r * size + c] = match ch {
                    'X' => Cell::X,
                    'O' => Cell::O,
                    _ => Cell::Empty,
                };
            }
        }
        board
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row * self.size + col]
    }

    /// Converts wire coordinates to indices, or `None` if off the board.
    pub fn locate(&self, row: i64, col: i64) -> Option<(usize, usize)> {
        let n = self.size as i64;
        if (0..n).contains(&row) && (0..n).contains(&col) {
            Some((row as usize, col as usize))
        } else {
            None
        }
    }

    /// Puts `symbol` on an empty square. Returns `false` if it was taken.
    pub fn place(&mut self, row: usize, col: usize, symbol: Symbol) -> bool {
        let cell = &mut self.cells[row * self.size + col];
        if !cell.is_empty() {
            return false;
        }
        *cell = symbol.into();
        true
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::Empty);
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| !c.is_empty())
    }

    /// Every empty square, row-major.
    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        (0..self.size)
            .flat_map(|r| (0..self.size).map(move |c| (r, c)))
            .filter(|&(r, c)| self.get(r, c).is_empty())
            .collect()
    }

    /// The side holding a complete row, column or full diagonal.
    ///
    /// Only full-length lines count; there is no k-in-a-row rule.
    pub fn winner(&self) -> Option<Symbol> {
        let n = self.size;
        (0..n)
            .find_map(|r| uniform((0..n).map(|c| self.get(r, c))))
            .or_else(|| (0..n).find_map(|c| uniform((0..n).map(|r| self.get(r, c)))))
            .or_else(|| uniform((0..n).map(|i| self.get(i, i))))
            .or_else(|| uniform((0..n).map(|i| self.get(i, n - 1 - i))))
    }

    /// `Some` once the round is decided: a win, or a full board (draw).
    pub fn outcome(&self) -> Option<RoundResult> {
        match self.winner() {
            Some(symbol) => Some(symbol.into()),
            None if self.is_full() => Some(RoundResult::Draw),
            None => None,
        }
    }

    /// Rows for a `GAME_STATE` broadcast.
    pub fn rows(&self) -> Vec<Vec<Cell>> {
        self.cells.chunks(self.size).map(<[Cell]>::to_vec).collect()
    }
}

/// The symbol filling every cell of a line, if one does.
fn uniform(mut line: impl Iterator<Item = Cell>) -> Option<Symbol> {
    let first = line.next()?.symbol()?;
    line.all(|c| c.symbol() == Some(first)).then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_line_boards(n: usize) -> Vec<Board> {
        let mut boards = Vec::new();
        for r in 0..n {
            let mut b = Board::new(n);
            for c in 0..n {
                b.place(r, c, Symbol::X);
            }
            boards.push(b);
        }
        for c in 0..n {
            let mut b = Board::new(n);
            for r in 0..n {
                b.place(r, c, Symbol::O);
            }
            boards.push(b);
        }
        let mut diag = Board::new(n);
        let mut anti = Board::new(n);
        for i in 0..n {
            diag.place(i, i, Symbol::X);
            anti.place(i, n - 1 - i, Symbol::O);
        }
        boards.push(diag);
        boards.push(anti);
        boards
    }

    #[test]
    fn test_winner_detects_every_full_line_for_sizes_3_to_5() {
        for n in 3..=5 {
            for board in full_line_boards(n) {
                assert!(board.winner().is_some(), "missed a line on {n}x{n}: {board:?}");
                assert!(board.outcome().unwrap().winner().is_some());
            }
        }
    }

    #[test]
    fn test_winner_ignores_partial_runs() {
        // three in a row on a 4x4 board is not a win
        let board = Board::from_rows(&["XXX.", "OO..", "....", "...."]);
        assert_eq!(board.winner(), None);
        assert_eq!(board.outcome(), None);
    }

    #[test]
    fn test_winner_ignores_short_diagonal() {
        let board = Board::from_rows(&[".X...", "..X..", "...X.", "....X", "....."]);
        assert_eq!(board.winner(), None);
    }

    #[test]
    fn test_draw_on_full_board_without_line_3x3() {
        let board = Board::from_rows(&["XOX", "XOO", "OXX"]);
        assert_eq!(board.winner(), None);
        assert_eq!(board.outcome(), Some(RoundResult::Draw));
    }

    #[test]
    fn test_draw_on_full_board_without_line_4x4_and_5x5() {
        let four = Board::from_rows(&["XXOO", "OOXX", "XXOO", "OOXX"]);
        assert_eq!(four.outcome(), Some(RoundResult::Draw));

        let five = Board::from_rows(&["XXOOX", "OOXXO", "XXOOX", "OOXXO", "XOXOX"]);
        assert_eq!(five.winner(), None);
        assert_eq!(five.outcome(), Some(RoundResult::Draw));
    }

    #[test]
    fn test_empty_board_has_no_outcome() {
        for n in 3..=5 {
            assert_eq!(Board::new(n).outcome(), None);
        }
    }

    #[test]
    fn test_place_refuses_occupied_square() {
        let mut board = Board::new(3);
        assert!(board.place(1, 1, Symbol::X));
        assert!(!board.place(1, 1, Symbol::O));
        assert_eq!(board.get(1, 1), Cell::X);
    }

    #[test]
    fn test_locate_bounds() {
        let board = Board::new(3);
        assert_eq!(board.locate(2, 0), Some((2, 0)));
        assert_eq!(board.locate(3, 0), None);
        assert_eq!(board.locate(0, -1), None);
    }

    #[test]
    fn test_empty_cells_and_clear() {
        let mut board = Board::from_rows(&["XO.", "...", "..X"]);
        assert_eq!(board.empty_cells().len(), 6);
        assert_eq!(board.empty_cells()[0], (0, 2));
        board.clear();
        assert_eq!(board.empty_cells().len(), 9);
    }

    #[test]
    fn test_rows_shape() {
        let board = Board::from_rows(&["X...", "....", "....", "...O"]);
        let rows = board.rows();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0][0], Cell::X);
        assert_eq!(rows[3][3], Cell::O);
    }
}
