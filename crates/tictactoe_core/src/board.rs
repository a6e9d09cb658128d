//! Board state and the move-legality authority for a single game.
//!
//! `Game` is the only way to mutate a board: every move goes through
//! [`Game::apply_move`], which either commits the move completely or leaves
//! the position untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{InvalidCell, Move, Player, Terminal, BOARD_SIZE, CELL_COUNT};

/// Row, column and diagonal lines, in evaluation order.
const LINES: [[(usize, usize); 3]; 8] = [
    // rows
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    // columns
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    // diagonals
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

/// 3x3 grid of cells, `None` for empty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [[Option<Player>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell contents, or `None` for an empty or out-of-range cell.
    pub fn get(&self, row: usize, col: usize) -> Option<Player> {
        self.cells.get(row)?.get(col).copied().flatten()
    }

    pub fn is_vacant(&self, row: usize, col: usize) -> bool {
        row < BOARD_SIZE && col < BOARD_SIZE && self.cells[row][col].is_none()
    }

    /// Empty cells in row-major order.
    pub fn empty_cells(&self) -> Vec<Move> {
        let mut cells = Vec::with_capacity(CELL_COUNT);
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                if self.cells[row][col].is_none() {
                    cells.push(Move::new(row, col));
                }
            }
        }
        cells
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.occupied_count() == CELL_COUNT
    }

    /// First complete line, if any.
    pub fn winner(&self) -> Option<Player> {
        LINES.iter().find_map(|line| {
            let [a, b, c] = line.map(|(r, col)| self.cells[r][col]);
            match (a, b, c) {
                (Some(p), Some(q), Some(s)) if p == q && q == s => Some(p),
                _ => None,
            }
        })
    }

    fn set(&mut self, row: usize, col: usize, player: Player) {
        self.cells[row][col] = Some(player);
    }
}

impl std::fmt::Display for Board {
    /// Renders the grid with row/column indices and `.` for empty cells:
    ///
    /// ```text
    ///   0 1 2
    /// 0 X . .
    /// 1 . O .
    /// 2 . . .
    /// ```
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "  0 1 2")?;
        for (r, row) in self.cells.iter().enumerate() {
            let cells: Vec<String> = row
                .iter()
                .map(|c| c.map_or('.', Player::marker).to_string())
                .collect();
            write!(f, "{} {}", r, cells.join(" "))?;
            if r + 1 < BOARD_SIZE {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// A committed move, as recorded in the game history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub player: Player,
    pub row: usize,
    pub col: usize,
    pub timestamp: DateTime<Utc>,
}

/// One game of tic-tac-toe. `X` moves first.
#[derive(Clone, Debug, Default)]
pub struct Game {
    board: Board,
    moves: Vec<MoveRecord>,
}

impl Game {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    pub fn into_moves(self) -> Vec<MoveRecord> {
        self.moves
    }

    /// Side to move, derived from move-count parity.
    pub fn current_player(&self) -> Player {
        if self.moves.len() % 2 == 0 {
            Player::X
        } else {
            Player::O
        }
    }

    /// Apply a move for the current player.
    ///
    /// The board is untouched on error.
    pub fn apply_move(&mut self, row: usize, col: usize) -> Result<(), InvalidCell> {
        if self.is_over() {
            return Err(InvalidCell::GameOver);
        }
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return Err(InvalidCell::OutOfRange { row, col });
        }
        if self.board.get(row, col).is_some() {
            return Err(InvalidCell::Occupied { row, col });
        }

        let player = self.current_player();
        self.board.set(row, col, player);
        self.moves.push(MoveRecord {
            player,
            row,
            col,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Win if any line is complete, draw if the board is full, else `None`.
    pub fn check_terminal(&self) -> Option<Terminal> {
        if let Some(player) = self.board.winner() {
            return Some(Terminal::Win(player));
        }
        if self.board.is_full() {
            return Some(Terminal::Draw);
        }
        None
    }

    pub fn is_over(&self) -> bool {
        self.check_terminal().is_some()
    }

    pub fn empty_cells(&self) -> Vec<Move> {
        self.board.empty_cells()
    }
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod board_tests;
