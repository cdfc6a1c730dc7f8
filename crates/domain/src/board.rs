//! The 6×7 grid and gravity rules.
//!
//! Row 0 is the top of the board and row `ROWS - 1` the bottom; tokens fall to the
//! highest-numbered empty row of a column.

use crate::error::MoveError;
use crate::player::PlayerNumber;

pub const ROWS: usize = 6;
pub const COLS: usize = 7;
pub const CENTER_COLUMN: usize = COLS / 2;

/// Number of aligned tokens needed to win.
pub const CONNECT: usize = 4;

/// Direction vectors (row delta, column delta): horizontal, vertical, and both diagonals.
pub(crate) const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// A single cell; `None` is empty.
pub type Cell = Option<PlayerNumber>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    cells: [[Cell; COLS]; ROWS],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [[None; COLS]; ROWS],
        }
    }

    /// Build a board from wire values (0 empty, 1 or 2 a player's token).
    ///
    /// Returns `None` if any value is outside 0..=2. Gravity is not checked; callers
    /// handing in arbitrary grids get exactly what they asked for.
    pub fn from_grid(grid: &[[u8; COLS]; ROWS]) -> Option<Self> {
        let mut board = Self::new();
        for (row, values) in grid.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                board.cells[row][col] = match value {
                    0 => None,
                    v => Some(PlayerNumber::from_u8(*v)?),
                };
            }
        }
        Some(board)
    }

    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    /// True if `col` is on the board and its top cell is free.
    pub fn is_valid_move(&self, col: usize) -> bool {
        col < COLS && self.cells[0][col].is_none()
    }

    /// Columns that can still take a token, lowest index first.
    pub fn legal_columns(&self) -> impl Iterator<Item = usize> + '_ {
        (0..COLS).filter(move |&col| self.is_valid_move(col))
    }

    /// Drop a token into `col`; returns the row it landed on.
    pub fn drop_piece(&mut self, col: usize, player: PlayerNumber) -> Result<usize, MoveError> {
        if col >= COLS {
            return Err(MoveError::OutOfBounds { column: col as i64 });
        }

        for row in (0..ROWS).rev() {
            if self.cells[row][col].is_none() {
                self.cells[row][col] = Some(player);
                return Ok(row);
            }
        }

        Err(MoveError::ColumnFull { column: col })
    }

    /// Every column's top cell is occupied.
    pub fn is_full(&self) -> bool {
        self.cells[0].iter().all(Option::is_some)
    }

    /// Number of tokens currently in `col`.
    pub fn column_height(&self, col: usize) -> usize {
        (0..ROWS)
            .filter(|&row| self.cells[row][col].is_some())
            .count()
    }

    /// Total tokens on the board.
    pub fn piece_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    /// True if some length-4 window passing through `(row, col)` is filled with the
    /// token sitting at `(row, col)`.
    ///
    /// Only the windows through that one cell are inspected; this is the definition of
    /// "the move at `(row, col)` won".
    pub fn check_win_at(&self, row: usize, col: usize) -> bool {
        let Some(player) = self.cells[row][col] else {
            return false;
        };

        DIRECTIONS.iter().any(|&(dr, dc)| {
            (0..CONNECT as isize).any(|offset| {
                let start_row = row as isize - offset * dr;
                let start_col = col as isize - offset * dc;
                (0..CONNECT as isize).all(|i| {
                    self.cell_at(start_row + i * dr, start_col + i * dc) == Some(Some(player))
                })
            })
        })
    }

    /// Wire representation: rows top to bottom, 0 for empty.
    pub fn to_grid(&self) -> Vec<Vec<u8>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|c| c.map_or(0, PlayerNumber::as_u8)).collect())
            .collect()
    }

    /// Bounds-checked access with signed coordinates; `None` when off the board.
    pub(crate) fn cell_at(&self, row: isize, col: isize) -> Option<Cell> {
        if row < 0 || col < 0 || row >= ROWS as isize || col >= COLS as isize {
            return None;
        }
        Some(self.cells[row as usize][col as usize])
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
