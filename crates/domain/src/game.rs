//! Turn state machine for one board.

use crate::board::{Board, COLS};
use crate::error::MoveError;
use crate::player::PlayerNumber;

/// Where the most recent token landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastMove {
    pub row: usize,
    pub column: usize,
    pub player: PlayerNumber,
}

/// Terminal status derived from the last move and the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    InProgress,
    Won(PlayerNumber),
    Draw,
}

impl GameOutcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }

    pub fn winner(self) -> Option<PlayerNumber> {
        match self {
            Self::Won(player) => Some(player),
            _ => None,
        }
    }
}

/// One game of four-in-a-row: the board, whose turn it is, and whether play continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    board: Board,
    current_turn: PlayerNumber,
    last_move: Option<LastMove>,
    is_active: bool,
    moves_played: usize,
}

impl Game {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            current_turn: PlayerNumber::One,
            last_move: None,
            is_active: true,
            moves_played: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_turn(&self) -> PlayerNumber {
        self.current_turn
    }

    pub fn last_move(&self) -> Option<LastMove> {
        self.last_move
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Count of accepted moves; used to detect stale bot results.
    pub fn moves_played(&self) -> usize {
        self.moves_played
    }

    /// Drop the current player's token into `column`.
    ///
    /// On success the turn passes to the other player and the game deactivates if the
    /// move won or filled the board. On error nothing changes.
    pub fn apply_move(&mut self, column: i64) -> Result<LastMove, MoveError> {
        if !self.is_active {
            return Err(MoveError::GameOver);
        }
        let col = usize::try_from(column)
            .ok()
            .filter(|&c| c < COLS)
            .ok_or(MoveError::OutOfBounds { column })?;

        let player = self.current_turn;
        let row = self.board.drop_piece(col, player)?;
        let placed = LastMove {
            row,
            column: col,
            player,
        };

        self.last_move = Some(placed);
        self.moves_played += 1;
        self.current_turn = player.other();

        if self.check_win() || self.is_full() {
            self.is_active = false;
        }

        Ok(placed)
    }

    /// True if the last move completed a line of four.
    pub fn check_win(&self) -> bool {
        self.last_move
            .is_some_and(|m| self.board.check_win_at(m.row, m.column))
    }

    pub fn is_full(&self) -> bool {
        self.board.is_full()
    }

    pub fn outcome(&self) -> GameOutcome {
        match self.last_move {
            Some(m) if self.board.check_win_at(m.row, m.column) => GameOutcome::Won(m.player),
            _ if self.board.is_full() => GameOutcome::Draw,
            _ => GameOutcome::InProgress,
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ROWS;

    fn play(game: &mut Game, columns: &[i64]) {
        for &c in columns {
            game.apply_move(c).unwrap();
        }
    }

    #[test]
    fn opening_sequence_stacks_without_false_win() {
        let mut game = Game::new();
        for &col in &[3, 3, 2, 4, 1, 5, 0] {
            let before = game.current_turn();
            let placed = game.apply_move(col).unwrap();
            assert_eq!(placed.player, before);
            if game.board().piece_count() < 7 {
                assert!(!game.check_win());
            }
        }

        let heights: Vec<usize> = (0..COLS).map(|c| game.board().column_height(c)).collect();
        assert_eq!(heights, vec![1, 1, 1, 2, 1, 1, 0]);

        // Player 1 now holds row 5, columns 0..=3
        assert!(game.check_win());
        assert_eq!(game.outcome(), GameOutcome::Won(PlayerNumber::One));
        assert!(!game.is_active());
    }

    #[test]
    fn turns_alternate_strictly() {
        let mut game = Game::new();
        let mut expected = PlayerNumber::One;
        for col in [0, 1, 2, 3, 4, 5, 6, 0, 1, 2] {
            assert_eq!(game.current_turn(), expected);
            game.apply_move(col).unwrap();
            expected = expected.other();
        }
        assert_eq!(game.moves_played(), 10);
    }

    #[test]
    fn invalid_column_leaves_state_untouched() {
        let mut game = Game::new();
        game.apply_move(3).unwrap();
        let before = game.clone();

        assert_eq!(
            game.apply_move(7),
            Err(MoveError::OutOfBounds { column: 7 })
        );
        assert_eq!(
            game.apply_move(-1),
            Err(MoveError::OutOfBounds { column: -1 })
        );
        assert_eq!(game, before);
    }

    #[test]
    fn full_column_rejected() {
        let mut game = Game::new();
        play(&mut game, &[0, 0, 0, 0, 0, 0]);
        assert_eq!(
            game.apply_move(0),
            Err(MoveError::ColumnFull { column: 0 })
        );
        assert_eq!(game.current_turn(), PlayerNumber::One);
    }

    #[test]
    fn moves_after_win_are_rejected() {
        let mut game = Game::new();
        // Player 1 stacks column 0, player 2 column 1
        play(&mut game, &[0, 1, 0, 1, 0, 1, 0]);
        assert_eq!(game.outcome(), GameOutcome::Won(PlayerNumber::One));
        assert_eq!(game.apply_move(2), Err(MoveError::GameOver));
    }

    #[test]
    fn full_board_without_win_is_draw() {
        // Column pairs filled in alternating blocks never line up four.
        let order: [i64; 42] = [
            0, 1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, //
            2, 3, 2, 3, 2, 3, 3, 2, 3, 2, 3, 2, //
            4, 5, 4, 5, 4, 5, 5, 4, 5, 4, 5, 4, //
            6, 6, 6, 6, 6, 6,
        ];
        let mut game = Game::new();
        for &col in &order {
            assert!(game.is_active(), "game ended early at move {}", game.moves_played());
            game.apply_move(col).unwrap();
        }

        assert!(game.is_full());
        assert!(!game.check_win());
        assert_eq!(game.outcome(), GameOutcome::Draw);
        assert!(!game.is_active());
        assert_eq!(game.board().piece_count(), ROWS * COLS);
    }

    #[test]
    fn fresh_game_is_in_progress() {
        let game = Game::new();
        assert_eq!(game.outcome(), GameOutcome::InProgress);
        assert!(game.last_move().is_none());
        assert!(!game.check_win());
    }
}
