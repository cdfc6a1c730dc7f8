//! Computer opponent: win/block short-circuits, then minimax with alpha-beta pruning.
//!
//! The search is a pure function of the board and the side to move; callers copy the board
//! out of the game before searching and apply the chosen column through the normal move path.

use crate::board::{Board, CENTER_COLUMN, COLS, CONNECT, DIRECTIONS, ROWS};
use crate::player::PlayerNumber;

/// Display name given to every bot seat.
pub const BOT_USERNAME: &str = "AI Bot";

/// Plies searched by default, counting the bot's own candidate move.
pub const DEFAULT_SEARCH_DEPTH: u8 = 6;

const WIN_SCORE: i64 = 1_000_000;
const LOSE_SCORE: i64 = -1_000_000;

const FOUR_SCORE: i64 = 100;
const OPEN_THREE_SCORE: i64 = 5;
const OPEN_TWO_SCORE: i64 = 2;
const OPPONENT_OPEN_THREE_PENALTY: i64 = -4;
const CENTER_TOKEN_SCORE: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinimaxBot {
    depth: u8,
}

impl MinimaxBot {
    /// A depth of zero is raised to one so the bot still compares its own candidate moves.
    pub fn new(depth: u8) -> Self {
        Self {
            depth: depth.max(1),
        }
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Pick a column for `me`.
    ///
    /// The board must have at least one open column; on a full board the center column
    /// is returned.
    pub fn select_move(&self, board: &Board, me: PlayerNumber) -> usize {
        if let Some(col) = winning_column(board, me) {
            return col;
        }
        if let Some(col) = winning_column(board, me.other()) {
            return col;
        }

        let mut best_score = i64::MIN;
        let mut best_move = CENTER_COLUMN;
        let mut alpha = i64::MIN;
        let beta = i64::MAX;

        for col in board.legal_columns() {
            let mut child = *board;
            let Ok(row) = child.drop_piece(col, me) else {
                continue;
            };
            let score = self.minimax(&child, (row, col), self.depth - 1, alpha, beta, false, me);
            if score > best_score {
                best_score = score;
                best_move = col;
            }
            alpha = alpha.max(score);
        }

        best_move
    }

    #[allow(clippy::too_many_arguments)]
    fn minimax(
        &self,
        board: &Board,
        last: (usize, usize),
        depth: u8,
        mut alpha: i64,
        mut beta: i64,
        maximizing: bool,
        me: PlayerNumber,
    ) -> i64 {
        if board.check_win_at(last.0, last.1) {
            return if board.get(last.0, last.1) == Some(me) {
                WIN_SCORE
            } else {
                LOSE_SCORE
            };
        }
        if depth == 0 || board.is_full() {
            return evaluate(board, me);
        }

        let mover = if maximizing { me } else { me.other() };
        let mut best = if maximizing { i64::MIN } else { i64::MAX };

        for col in board.legal_columns() {
            let mut child = *board;
            let Ok(row) = child.drop_piece(col, mover) else {
                continue;
            };
            let score = self.minimax(&child, (row, col), depth - 1, alpha, beta, !maximizing, me);

            if maximizing {
                best = best.max(score);
                alpha = alpha.max(score);
            } else {
                best = best.min(score);
                beta = beta.min(score);
            }
            if beta <= alpha {
                break;
            }
        }

        best
    }
}

impl Default for MinimaxBot {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DEPTH)
    }
}

/// Lowest column where `player` would complete four right now.
fn winning_column(board: &Board, player: PlayerNumber) -> Option<usize> {
    board.legal_columns().find(|&col| {
        let mut probe = *board;
        probe
            .drop_piece(col, player)
            .is_ok_and(|row| probe.check_win_at(row, col))
    })
}

/// Static score of a position from `me`'s point of view.
fn evaluate(board: &Board, me: PlayerNumber) -> i64 {
    let mut score = 0;

    for row in 0..ROWS as isize {
        for col in 0..COLS as isize {
            for &(dr, dc) in &DIRECTIONS {
                let mut window = [None; CONNECT];
                let complete = (0..CONNECT).all(|i| {
                    match board.cell_at(row + i as isize * dr, col + i as isize * dc) {
                        Some(cell) => {
                            window[i] = cell;
                            true
                        }
                        None => false,
                    }
                });
                if complete {
                    score += score_window(&window, me);
                }
            }
        }
    }

    let center_tokens = (0..ROWS)
        .filter(|&row| board.get(row, CENTER_COLUMN) == Some(me))
        .count() as i64;

    score + center_tokens * CENTER_TOKEN_SCORE
}

fn score_window(window: &[Option<PlayerNumber>; CONNECT], me: PlayerNumber) -> i64 {
    let mine = window.iter().filter(|c| **c == Some(me)).count();
    let theirs = window.iter().filter(|c| **c == Some(me.other())).count();
    let empty = CONNECT - mine - theirs;

    match (mine, theirs, empty) {
        (4, _, _) => FOUR_SCORE,
        (3, _, 1) => OPEN_THREE_SCORE,
        (2, _, 2) => OPEN_TWO_SCORE,
        (_, 3, 1) => OPPONENT_OPEN_THREE_PENALTY,
        _ => 0,
    }
}
