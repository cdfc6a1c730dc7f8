//! Connect Four domain: board, turn engine, search bot and session aggregate.
//!
//! Everything here is synchronous and free of I/O. Time enters only as values handed in
//! by callers.

pub mod board;
pub mod bot;
pub mod error;
pub mod game;
pub mod ids;
pub mod player;
pub mod session;

pub use board::{Board, Cell, CENTER_COLUMN, COLS, CONNECT, ROWS};
pub use bot::{MinimaxBot, BOT_USERNAME, DEFAULT_SEARCH_DEPTH};
pub use error::MoveError;
pub use game::{Game, GameOutcome, LastMove};
pub use ids::{ConnectionId, GameId};
pub use player::PlayerNumber;
pub use session::{Seat, Session, SessionResult, SessionStatus};
