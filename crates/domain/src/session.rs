//! Session aggregate - two seats sharing one game
//!
//! A session pairs two seats (human or bot) with a [`Game`] and collects rematch requests
//! once the game is over. Seats reference their human by connection id only; the hub owns
//! the connections themselves.
//!
//! # Rustic DDD Design
//!
//! - **Private fields**: seats and game are only changed through the methods below
//! - **Derived status**: win/draw comes from the game, never from a stored flag
//! - **Rematch by replacement**: a rematch builds a new `Session`, so request lists never
//!   carry over

use chrono::{DateTime, Utc};

use crate::bot::BOT_USERNAME;
use crate::error::MoveError;
use crate::game::{Game, GameOutcome, LastMove};
use crate::ids::{ConnectionId, GameId};
use crate::player::PlayerNumber;

/// One side of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    username: String,
    is_bot: bool,
    connection: Option<ConnectionId>,
    stands_in_for: Option<String>,
}

impl Seat {
    pub fn human(username: impl Into<String>, connection: ConnectionId) -> Self {
        Self {
            username: username.into(),
            is_bot: false,
            connection: Some(connection),
            stands_in_for: None,
        }
    }

    pub fn bot() -> Self {
        Self {
            username: BOT_USERNAME.to_string(),
            is_bot: true,
            connection: None,
            stands_in_for: None,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_bot(&self) -> bool {
        self.is_bot
    }

    pub fn connection(&self) -> Option<ConnectionId> {
        self.connection
    }

    /// Human this bot took over from, if any.
    pub fn stands_in_for(&self) -> Option<&str> {
        self.stands_in_for.as_deref()
    }

    /// True if `username` owns this seat, either directly or as the human a bot replaced.
    fn belongs_to(&self, username: &str) -> bool {
        (!self.is_bot && self.username == username) || self.stands_in_for() == Some(username)
    }
}

/// Wire status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    InProgress,
    Completed,
    Draw,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Draw => "draw",
        }
    }
}

/// Summary of a finished game, as announced to players and recorded in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    pub is_draw: bool,
    /// Winning human's username; `None` on a draw or when a bot won.
    pub winner: Option<String>,
    pub bot_won: bool,
}

/// A pairing of two seats and their game
///
/// # Invariants
///
/// - Seat order is fixed at creation: `seats[0]` is player 1 and moves first
/// - `rematch_requests` holds each username at most once, and only after the game ended
/// - An abandoned session never becomes active again
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use connect4_domain::{ConnectionId, GameId, PlayerNumber, Seat, Session};
///
/// let alice = ConnectionId::new();
/// let mut session =
///     Session::new(GameId::new(), Seat::human("alice", alice), Seat::bot(), Utc::now());
///
/// assert_eq!(session.seat_of_connection(alice), Some(PlayerNumber::One));
/// session.apply_move(3).unwrap();
/// assert_eq!(session.game().current_turn(), PlayerNumber::Two);
/// ```
#[derive(Debug, Clone)]
pub struct Session {
    id: GameId,
    seats: [Seat; 2],
    game: Game,
    abandoned: bool,
    rematch_requests: Vec<String>,
    started_at: DateTime<Utc>,
}

impl Session {
    // =========================================================================
    // Constructor
    // =========================================================================

    pub fn new(id: GameId, player1: Seat, player2: Seat, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            seats: [player1, player2],
            game: Game::new(),
            abandoned: false,
            rematch_requests: Vec::new(),
            started_at,
        }
    }

    /// Build the follow-up session for a rematch.
    ///
    /// Human seats keep their connections. When a bot is involved the human becomes
    /// player 1 and faces a brand-new bot seat.
    pub fn rematch(&self, id: GameId, started_at: DateTime<Utc>) -> Session {
        let [first, second] = &self.seats;
        let (player1, player2) = match (first.is_bot, second.is_bot) {
            (false, true) => (Self::fresh_human(first), Seat::bot()),
            (true, false) => (Self::fresh_human(second), Seat::bot()),
            (false, false) => (Self::fresh_human(first), Self::fresh_human(second)),
            (true, true) => (Seat::bot(), Seat::bot()),
        };
        Session::new(id, player1, player2, started_at)
    }

    fn fresh_human(seat: &Seat) -> Seat {
        Seat {
            username: seat.username.clone(),
            is_bot: false,
            connection: seat.connection,
            stands_in_for: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn seat(&self, player: PlayerNumber) -> &Seat {
        &self.seats[player.index()]
    }

    pub fn seats(&self) -> &[Seat; 2] {
        &self.seats
    }

    /// Seat whose turn it is.
    pub fn current_seat(&self) -> &Seat {
        self.seat(self.game.current_turn())
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn rematch_requests(&self) -> &[String] {
        &self.rematch_requests
    }

    pub fn is_abandoned(&self) -> bool {
        self.abandoned
    }

    /// Still accepting moves.
    pub fn is_active(&self) -> bool {
        !self.abandoned && self.game.is_active()
    }

    pub fn has_bot(&self) -> bool {
        self.seats.iter().any(Seat::is_bot)
    }

    pub fn seat_of_connection(&self, connection: ConnectionId) -> Option<PlayerNumber> {
        [PlayerNumber::One, PlayerNumber::Two]
            .into_iter()
            .find(|p| self.seat(*p).connection == Some(connection))
    }

    pub fn seat_of_username(&self, username: &str) -> Option<PlayerNumber> {
        [PlayerNumber::One, PlayerNumber::Two]
            .into_iter()
            .find(|p| self.seat(*p).belongs_to(username))
    }

    /// Connections of all human seats.
    pub fn connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.seats.iter().filter_map(|s| s.connection)
    }

    // =========================================================================
    // Play
    // =========================================================================

    /// Apply the current player's move. Turn ownership is checked by the caller.
    pub fn apply_move(&mut self, column: i64) -> Result<LastMove, MoveError> {
        if self.abandoned {
            return Err(MoveError::GameOver);
        }
        self.game.apply_move(column)
    }

    /// Stop the session for good (exit or disconnect teardown).
    pub fn abandon(&mut self) {
        self.abandoned = true;
    }

    pub fn status(&self) -> SessionStatus {
        match self.game.outcome() {
            GameOutcome::Draw => SessionStatus::Draw,
            GameOutcome::Won(_) => SessionStatus::Completed,
            GameOutcome::InProgress if self.abandoned => SessionStatus::Completed,
            GameOutcome::InProgress => SessionStatus::InProgress,
        }
    }

    pub fn winner_seat(&self) -> Option<&Seat> {
        self.game.outcome().winner().map(|p| self.seat(p))
    }

    /// `None` while the game is still being played or was abandoned before a result.
    pub fn result(&self) -> Option<SessionResult> {
        match self.game.outcome() {
            GameOutcome::InProgress => None,
            GameOutcome::Draw => Some(SessionResult {
                is_draw: true,
                winner: None,
                bot_won: false,
            }),
            GameOutcome::Won(player) => {
                let seat = self.seat(player);
                Some(SessionResult {
                    is_draw: false,
                    winner: (!seat.is_bot).then(|| seat.username.clone()),
                    bot_won: seat.is_bot,
                })
            }
        }
    }

    // =========================================================================
    // Seat changes
    // =========================================================================

    /// Hand a human seat to a bot. Returns the replaced username, or `None` if the seat
    /// already holds a bot.
    pub fn replace_with_bot(&mut self, player: PlayerNumber) -> Option<String> {
        let seat = &mut self.seats[player.index()];
        if seat.is_bot {
            return None;
        }
        let replaced = std::mem::replace(seat, Seat::bot());
        seat.stands_in_for = Some(replaced.username.clone());
        Some(replaced.username)
    }

    /// Point the seat owned by `username` at a new connection, taking it back from a bot
    /// stand-in if one was installed.
    pub fn reattach(&mut self, username: &str, connection: ConnectionId) -> Option<PlayerNumber> {
        let player = self.seat_of_username(username)?;
        self.seats[player.index()] = Seat::human(username, connection);
        Some(player)
    }

    // =========================================================================
    // Rematch
    // =========================================================================

    /// Record that `username` wants a rematch. Returns `false` (and changes nothing) while
    /// the game is still running, for repeat requests, or for a username not seated here.
    pub fn record_rematch_request(&mut self, username: &str) -> bool {
        if self.is_active()
            || self.seat_of_username(username).is_none()
            || self.rematch_requests.iter().any(|u| u == username)
        {
            return false;
        }
        self.rematch_requests.push(username.to_string());
        true
    }

    /// Both humans asked, or a bot is seated (bots always accept).
    pub fn both_rematch_ready(&self) -> bool {
        self.has_bot()
            || self
                .seats
                .iter()
                .all(|s| self.rematch_requests.iter().any(|u| *u == s.username))
    }
}
