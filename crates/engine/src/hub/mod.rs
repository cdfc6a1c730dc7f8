//! Session hub: matchmaking, live sessions, reconnect handling and fan-out to connections.
//!
//! All state sits behind one `tokio::sync::Mutex`. Every operation takes the lock, mutates,
//! queues frames with `try_send` and returns. Store calls and the bot search run on spawned
//! tasks; a bot move comes back through a second locked call that checks its preconditions
//! again, and so does every timer.
//!
//! # Participant lifecycle
//!
//! ```text
//! connected-idle ──join──► waiting ──paired / fallback──► in-session
//!        ▲                    │                              │
//!        └──cancelWaiting─────┘                         disconnect
//!                                                            ▼
//!               in-session ◄──rejoin── disconnected-grace ──expiry──► removed
//! ```

mod frames;
mod participant;
mod timers;


use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;

use connect4_domain::{
    ConnectionId, GameId, LastMove, MinimaxBot, PlayerNumber, Seat, Session, BOT_USERNAME,
};
use connect4_shared::{
    ActiveUser, ActiveUserStatus, GameMode, GameResultPayload, GameStatePayload, ServerFrame,
    ServerMessage,
};

use crate::infrastructure::config::HubConfig;
use crate::infrastructure::events;
use crate::infrastructure::ports::{
    ClockPort, EventPublisher, GameEventKind, GameRecord, GameStore,
};

use participant::Participant;
use timers::{ArmedTimer, TimerKind};

const WAITING_CANCELLED: &str = "Waiting cancelled";
const OPPONENT_EXITED: &str = "opponentExited";

#[derive(Default)]
struct HubState {
    participants: HashMap<ConnectionId, Participant>,
    /// At most one friend-mode joiner waits for an opponent
    waiting: Option<ConnectionId>,
    sessions: HashMap<GameId, Session>,
    next_timer_id: u64,
}

type Participants = HashMap<ConnectionId, Participant>;

fn send_to(participants: &Participants, connection_id: ConnectionId, frame: ServerFrame) {
    if let Some(participant) = participants.get(&connection_id) {
        participant.send(frame);
    }
}

fn send_to_seats(participants: &Participants, session: &Session, frame: &ServerFrame) {
    for connection_id in session.connections() {
        send_to(participants, connection_id, frame.clone());
    }
}

fn waiting_cancelled() -> ServerFrame {
    ServerFrame::unscoped(ServerMessage::WaitingCancelled {
        message: WAITING_CANCELLED.to_string(),
    })
}

pub struct Hub {
    state: Mutex<HubState>,
    config: HubConfig,
    bot: MinimaxBot,
    store: Arc<dyn GameStore>,
    events: Arc<dyn EventPublisher>,
    clock: Arc<dyn ClockPort>,
    this: Weak<Hub>,
}

impl Hub {
    pub fn new(
        config: HubConfig,
        store: Arc<dyn GameStore>,
        events: Arc<dyn EventPublisher>,
        clock: Arc<dyn ClockPort>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            state: Mutex::new(HubState::default()),
            bot: MinimaxBot::new(config.bot_search_depth),
            config,
            store,
            events,
            clock,
            this: this.clone(),
        })
    }

    // =========================================================================
    // Connection lifecycle
    // =========================================================================

    /// Add a connected-idle participant.
    pub async fn register(&self, connection_id: ConnectionId, sender: mpsc::Sender<ServerFrame>) {
        let mut state = self.state.lock().await;
        state
            .participants
            .insert(connection_id, Participant::new(connection_id, sender));
        tracing::debug!(connection_id = %connection_id, "Participant registered");
    }

    /// Close the participant's channel and either drop it or hold its seat for the grace
    /// window.
    pub async fn handle_disconnect(&self, connection_id: ConnectionId) {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let Some(participant) = state.participants.get_mut(&connection_id) else {
            return;
        };
        participant.close();
        let username = participant.username.clone();
        let session_id = participant.session_id;

        if state.waiting == Some(connection_id) {
            state.waiting = None;
        }

        let held = session_id.and_then(|id| state.sessions.get(&id).map(|s| (id, s.is_active())));
        match held {
            None => {
                if let Some(mut removed) = state.participants.remove(&connection_id) {
                    removed.cancel_timers();
                }
                tracing::info!(connection_id = %connection_id, "Participant removed");
            }
            Some((session_id, active)) => {
                let takeover = active.then(|| {
                    self.arm_timer(
                        state,
                        connection_id,
                        TimerKind::BotTakeover,
                        self.config.bot_takeover_delay,
                    )
                });
                let teardown = self.arm_timer(
                    state,
                    connection_id,
                    TimerKind::Teardown,
                    self.config.reconnect_grace,
                );
                if let Some(participant) = state.participants.get_mut(&connection_id) {
                    participant.disconnected_at = Some(Instant::now());
                    if let Some(timer) = takeover {
                        participant.arm(TimerKind::BotTakeover, timer);
                    }
                    participant.arm(TimerKind::Teardown, teardown);
                }
                tracing::info!(
                    connection_id = %connection_id,
                    game_id = %session_id,
                    "Participant disconnected, holding seat"
                );
            }
        }

        if let Some(username) = username {
            self.events.publish(events::presence(
                GameEventKind::PlayerLeave,
                self.clock.now(),
                session_id,
                &username,
            ));
        }
    }

    // =========================================================================
    // Joining
    // =========================================================================

    /// Resume a held seat, or enter matchmaking in the requested mode.
    pub async fn join(&self, connection_id: ConnectionId, username: String, mode: GameMode) {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let Some(participant) = state.participants.get(&connection_id) else {
            return;
        };
        if state.waiting == Some(connection_id) {
            tracing::debug!(connection_id = %connection_id, "Join ignored, already waiting");
            return;
        }
        let in_active_session = participant
            .session_id
            .and_then(|id| state.sessions.get(&id))
            .is_some_and(Session::is_active);
        if in_active_session {
            tracing::debug!(connection_id = %connection_id, "Join ignored, already playing");
            return;
        }

        self.detach(state, connection_id);

        if let Some(participant) = state.participants.get_mut(&connection_id) {
            participant.username = Some(username.clone());
        }

        let resumed = self.try_reconnect(state, connection_id, &username);
        self.events.publish(events::presence(
            GameEventKind::PlayerJoin,
            self.clock.now(),
            resumed,
            &username,
        ));
        if resumed.is_some() {
            return;
        }

        tracing::info!(
            connection_id = %connection_id,
            username = %username,
            mode = ?mode,
            "Player joined"
        );

        match mode {
            GameMode::Computer => self.start_bot_session(state, connection_id, username),
            GameMode::Friend => self.enter_matchmaking(state, connection_id, username),
        }
    }

    /// Leave a finished session; whoever is still seated there is told the player left.
    fn detach(&self, state: &mut HubState, connection_id: ConnectionId) {
        let Some(session_id) = state
            .participants
            .get_mut(&connection_id)
            .and_then(|p| p.session_id.take())
        else {
            return;
        };
        if self.close_session(state, session_id) {
            tracing::debug!(game_id = %session_id, "Finished session closed on rejoin");
        }
    }

    /// Abandon and remove a session, detaching and notifying everyone still attached.
    fn close_session(&self, state: &mut HubState, session_id: GameId) -> bool {
        let Some(mut session) = state.sessions.remove(&session_id) else {
            return false;
        };
        session.abandon();

        let notice = frames::scoped(
            &session,
            ServerMessage::OpponentExited {
                game_id: session_id.to_string(),
                message: OPPONENT_EXITED.to_string(),
            },
        );
        for other in state
            .participants
            .values_mut()
            .filter(|p| p.session_id == Some(session_id))
        {
            other.session_id = None;
            other.send(notice.clone());
        }
        true
    }

    /// Move a held seat from a disconnected participant with the same username to this
    /// connection. Returns the resumed session.
    fn try_reconnect(
        &self,
        state: &mut HubState,
        connection_id: ConnectionId,
        username: &str,
    ) -> Option<GameId> {
        let grace = self.config.reconnect_grace;
        let (stale_id, session_id) = state.participants.values().find_map(|p| {
            let session_id = p.session_id?;
            let eligible = p.connection_id != connection_id
                && p.username.as_deref() == Some(username)
                && p.disconnected_at.is_some_and(|at| at.elapsed() < grace)
                && state
                    .sessions
                    .get(&session_id)
                    .is_some_and(|s| s.seat_of_username(username).is_some());
            eligible.then_some((p.connection_id, session_id))
        })?;

        if let Some(mut stale) = state.participants.remove(&stale_id) {
            stale.cancel_timers();
        }
        let session = state.sessions.get_mut(&session_id)?;
        session.reattach(username, connection_id)?;
        if let Some(participant) = state.participants.get_mut(&connection_id) {
            participant.session_id = Some(session_id);
        }

        send_to(
            &state.participants,
            connection_id,
            frames::state_frame(session),
        );
        let notice = frames::scoped(
            session,
            ServerMessage::PlayerReconnected {
                username: username.to_string(),
            },
        );
        for other in session.connections().filter(|c| *c != connection_id) {
            send_to(&state.participants, other, notice.clone());
        }

        tracing::info!(
            connection_id = %connection_id,
            game_id = %session_id,
            username = %username,
            "Player reconnected"
        );
        Some(session_id)
    }

    fn enter_matchmaking(
        &self,
        state: &mut HubState,
        connection_id: ConnectionId,
        username: String,
    ) {
        let waiter = state
            .waiting
            .filter(|id| *id != connection_id)
            .and_then(|id| state.participants.get(&id))
            .and_then(|p| Some((p.connection_id, p.username.clone()?)));

        match waiter {
            Some((waiting_id, waiting_name)) if waiting_name != username => {
                state.waiting = None;
                if let Some(participant) = state.participants.get_mut(&waiting_id) {
                    participant.cancel_timer(TimerKind::MatchmakingFallback);
                }
                let session = Session::new(
                    GameId::new(),
                    Seat::human(waiting_name, waiting_id),
                    Seat::human(username, connection_id),
                    self.clock.now(),
                );
                self.start_session(state, session);
            }
            waiter => {
                // Same username from another connection; the newer one takes the slot
                if let Some((replaced_id, _)) = waiter {
                    if let Some(participant) = state.participants.get_mut(&replaced_id) {
                        participant.cancel_timer(TimerKind::MatchmakingFallback);
                        participant.send(waiting_cancelled());
                    }
                }
                self.park(state, connection_id);
            }
        }
    }

    fn park(&self, state: &mut HubState, connection_id: ConnectionId) {
        state.waiting = Some(connection_id);
        let timer = self.arm_timer(
            state,
            connection_id,
            TimerKind::MatchmakingFallback,
            self.config.matchmaking_timeout,
        );
        if let Some(participant) = state.participants.get_mut(&connection_id) {
            participant.send(ServerFrame::unscoped(ServerMessage::GameState(
                GameStatePayload::waiting(),
            )));
            participant.arm(TimerKind::MatchmakingFallback, timer);
        }
        tracing::debug!(connection_id = %connection_id, "Waiting for an opponent");
    }

    /// Leave the waiting slot.
    pub async fn cancel_waiting(&self, connection_id: ConnectionId) {
        let mut state = self.state.lock().await;
        if state.waiting != Some(connection_id) {
            return;
        }
        state.waiting = None;
        if let Some(participant) = state.participants.get_mut(&connection_id) {
            participant.cancel_timer(TimerKind::MatchmakingFallback);
            participant.send(waiting_cancelled());
        }
        tracing::info!(connection_id = %connection_id, "Waiting cancelled");
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    fn start_bot_session(
        &self,
        state: &mut HubState,
        connection_id: ConnectionId,
        username: String,
    ) {
        let session = Session::new(
            GameId::new(),
            Seat::human(username, connection_id),
            Seat::bot(),
            self.clock.now(),
        );
        self.start_session(state, session);
    }

    fn start_session(&self, state: &mut HubState, session: Session) {
        let session_id = session.id();
        for connection_id in session.connections() {
            if let Some(participant) = state.participants.get_mut(&connection_id) {
                participant.session_id = Some(session_id);
            }
        }
        let snapshot = frames::state_frame(&session);
        send_to_seats(&state.participants, &session, &snapshot);

        let [player1, player2] = session.seats();
        self.events.publish(events::game_start(
            self.clock.now(),
            session_id,
            player1.username(),
            player2.username(),
            session.has_bot(),
        ));
        tracing::info!(
            game_id = %session_id,
            player1 = %player1.username(),
            player2 = %player2.username(),
            "Session started"
        );

        let humans: Vec<String> = session
            .seats()
            .iter()
            .filter(|s| !s.is_bot())
            .map(|s| s.username().to_string())
            .collect();
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            for username in humans {
                if let Err(e) = store.get_or_create_player(&username).await {
                    tracing::warn!(username = %username, error = %e, "Failed to load player");
                }
            }
        });

        let bot_moves_first = session.current_seat().is_bot();
        state.sessions.insert(session_id, session);
        if bot_moves_first {
            self.schedule_bot_move(state, session_id);
        }
    }

    /// Play `column` for the participant if it is their turn in an active session.
    pub async fn apply_move(&self, connection_id: ConnectionId, column: i64) {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let Some(session_id) = state
            .participants
            .get(&connection_id)
            .and_then(|p| p.session_id)
        else {
            return;
        };
        let Some(session) = state.sessions.get_mut(&session_id) else {
            return;
        };
        if !session.is_active()
            || session.seat_of_connection(connection_id) != Some(session.game().current_turn())
        {
            tracing::debug!(connection_id = %connection_id, "Move ignored, not this player's turn");
            return;
        }

        match session.apply_move(column) {
            Ok(placed) => self.after_move(state, session_id, placed),
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, error = %e, "Move rejected");
                send_to(
                    &state.participants,
                    connection_id,
                    frames::scoped(
                        session,
                        ServerMessage::Error {
                            message: e.to_string(),
                        },
                    ),
                );
            }
        }
    }

    fn after_move(&self, state: &mut HubState, session_id: GameId, placed: LastMove) {
        let Some(session) = state.sessions.get(&session_id) else {
            return;
        };
        let now = self.clock.now();
        self.events.publish(events::game_move(
            now,
            session_id,
            session.seat(placed.player).username(),
            placed,
        ));
        send_to_seats(&state.participants, session, &frames::state_frame(session));

        if let Some(result) = session.result() {
            let payload = frames::result_payload(session, &result);
            send_to_seats(
                &state.participants,
                session,
                &frames::scoped(session, ServerMessage::GameFinished(payload.clone())),
            );
            self.events.publish(events::game_end(
                now,
                session_id,
                result.winner.as_deref(),
                result.is_draw,
                (now - session.started_at()).num_seconds(),
            ));
            tracing::info!(
                game_id = %session_id,
                winner = ?result.winner,
                is_draw = result.is_draw,
                bot_won = result.bot_won,
                "Game finished"
            );
            self.record_result(session, payload, now);
        } else if session.current_seat().is_bot() {
            self.schedule_bot_move(state, session_id);
        }
    }

    /// Persist a finished game off-lock and announce it to everyone once stored.
    fn record_result(
        &self,
        session: &Session,
        payload: GameResultPayload,
        ended_at: DateTime<Utc>,
    ) {
        let human = |seat: &Seat| (!seat.is_bot()).then(|| seat.username().to_string());
        let [player1, player2] = session.seats();
        let record = GameRecord {
            game_id: session.id(),
            player1: human(player1),
            player2: human(player2),
            winner: payload.winner.clone(),
            is_draw: payload.is_draw,
            is_bot_game: session.has_bot(),
            started_at: session.started_at(),
            ended_at,
            final_state: serde_json::to_value(frames::game_state(session)).unwrap_or_default(),
        };

        let store = Arc::clone(&self.store);
        let hub = self.this.clone();
        tokio::spawn(async move {
            if let Err(e) = store.record_game(record).await {
                tracing::warn!(game_id = %payload.game_id, error = %e, "Failed to record game");
                return;
            }
            if let Some(hub) = hub.upgrade() {
                let frame = ServerFrame::new(
                    payload.game_id.clone(),
                    ServerMessage::LeaderboardUpdate(payload),
                );
                hub.broadcast(frame).await;
            }
        });
    }

    /// Queue a frame for every connected participant.
    async fn broadcast(&self, frame: ServerFrame) {
        let state = self.state.lock().await;
        for participant in state.participants.values() {
            participant.send(frame.clone());
        }
    }

    // =========================================================================
    // Bot moves
    // =========================================================================

    /// Search off-lock after the configured pause, then apply through [`Self::apply_bot_move`].
    fn schedule_bot_move(&self, state: &HubState, session_id: GameId) {
        let Some(session) = state.sessions.get(&session_id) else {
            return;
        };
        let game = session.game();
        let board = *game.board();
        let player = game.current_turn();
        let moves_played = game.moves_played();
        let bot = self.bot;
        let delay = self.config.bot_move_delay;
        let hub = self.this.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let column =
                match tokio::task::spawn_blocking(move || bot.select_move(&board, player)).await {
                    Ok(column) => column,
                    Err(e) => {
                        tracing::error!(game_id = %session_id, error = %e, "Bot search failed");
                        return;
                    }
                };
            if let Some(hub) = hub.upgrade() {
                hub.apply_bot_move(session_id, player, moves_played, column)
                    .await;
            }
        });
    }

    async fn apply_bot_move(
        &self,
        session_id: GameId,
        player: PlayerNumber,
        moves_played: usize,
        column: usize,
    ) {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let Some(session) = state.sessions.get_mut(&session_id) else {
            return;
        };
        let game = session.game();
        if !session.is_active()
            || !session.current_seat().is_bot()
            || game.current_turn() != player
            || game.moves_played() != moves_played
        {
            tracing::debug!(game_id = %session_id, "Discarding stale bot move");
            return;
        }

        match session.apply_move(column as i64) {
            Ok(placed) => self.after_move(state, session_id, placed),
            Err(e) => {
                tracing::warn!(
                    game_id = %session_id,
                    column,
                    error = %e,
                    "Bot chose an illegal move"
                )
            }
        }
    }

    // =========================================================================
    // Rematch and exit
    // =========================================================================

    /// Record a rematch request; start the next session once every seat agreed.
    pub async fn request_rematch(&self, connection_id: ConnectionId) {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let Some((username, session_id)) = state
            .participants
            .get(&connection_id)
            .and_then(|p| Some((p.username.clone()?, p.session_id?)))
        else {
            return;
        };
        let Some(session) = state.sessions.get_mut(&session_id) else {
            return;
        };
        if !session.record_rematch_request(&username) {
            return;
        }

        let update = ServerMessage::PlayAgainUpdate {
            play_again_requests: session.rematch_requests().to_vec(),
        };
        let update = frames::scoped(session, update);
        send_to_seats(&state.participants, session, &update);
        if !session.both_rematch_ready() {
            return;
        }

        let next = session.rematch(GameId::new(), self.clock.now());
        state.sessions.remove(&session_id);
        for participant in state
            .participants
            .values_mut()
            .filter(|p| p.session_id == Some(session_id))
        {
            participant.session_id = None;
        }
        tracing::info!(
            previous_game_id = %session_id,
            game_id = %next.id(),
            "Rematch starting"
        );
        self.start_session(state, next);
    }

    /// Abandon the participant's session and tell the other side.
    pub async fn exit(&self, connection_id: ConnectionId) {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let Some(participant) = state.participants.get_mut(&connection_id) else {
            return;
        };
        let Some(session_id) = participant.session_id.take() else {
            return;
        };
        let username = participant.username.clone();
        if !self.close_session(state, session_id) {
            return;
        }

        if let Some(username) = username {
            self.events.publish(events::presence(
                GameEventKind::PlayerLeave,
                self.clock.now(),
                Some(session_id),
                &username,
            ));
        }
        tracing::info!(
            connection_id = %connection_id,
            game_id = %session_id,
            "Player exited session"
        );
    }

    // =========================================================================
    // Timers
    // =========================================================================

    fn arm_timer(
        &self,
        state: &mut HubState,
        connection_id: ConnectionId,
        kind: TimerKind,
        delay: Duration,
    ) -> ArmedTimer {
        state.next_timer_id += 1;
        ArmedTimer::spawn(
            self.this.clone(),
            connection_id,
            kind,
            state.next_timer_id,
            delay,
        )
    }

    pub(crate) async fn fire_timer(&self, connection_id: ConnectionId, kind: TimerKind, id: u64) {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let Some(participant) = state.participants.get_mut(&connection_id) else {
            return;
        };
        if !participant.claim_timer(kind, id) {
            tracing::debug!(connection_id = %connection_id, kind = ?kind, "Stale timer ignored");
            return;
        }

        match kind {
            TimerKind::MatchmakingFallback => self.matchmaking_expired(state, connection_id),
            TimerKind::BotTakeover => self.take_over_seat(state, connection_id),
            TimerKind::Teardown => self.tear_down(state, connection_id),
        }
    }

    fn matchmaking_expired(&self, state: &mut HubState, connection_id: ConnectionId) {
        if state.waiting != Some(connection_id) {
            return;
        }
        state.waiting = None;
        let Some(username) = state
            .participants
            .get(&connection_id)
            .and_then(|p| p.username.clone())
        else {
            return;
        };
        tracing::info!(connection_id = %connection_id, "No opponent found, seating the bot");
        self.start_bot_session(state, connection_id, username);
    }

    /// Hand a disconnected player's seat to the bot while a human opponent is still present.
    fn take_over_seat(&self, state: &mut HubState, connection_id: ConnectionId) {
        let Some(participant) = state.participants.get(&connection_id) else {
            return;
        };
        if participant.disconnected_at.is_none() {
            return;
        }
        let Some(session_id) = participant.session_id else {
            return;
        };
        let Some(session) = state.sessions.get_mut(&session_id) else {
            return;
        };
        if !session.is_active() {
            return;
        }
        let Some(seat) = session.seat_of_connection(connection_id) else {
            return;
        };
        let opponent_present = session.connections().any(|c| {
            c != connection_id
                && state
                    .participants
                    .get(&c)
                    .is_some_and(Participant::is_connected)
        });
        if !opponent_present {
            tracing::debug!(
                game_id = %session_id,
                "No one left to play against, skipping takeover"
            );
            return;
        }
        let Some(replaced) = session.replace_with_bot(seat) else {
            return;
        };

        let notice = ServerMessage::PlayerReplaced {
            replaced_player: replaced.clone(),
            new_player: BOT_USERNAME.to_string(),
            game_state: frames::game_state(session),
        };
        let notice = frames::scoped(session, notice);
        send_to_seats(&state.participants, session, &notice);
        tracing::info!(game_id = %session_id, replaced = %replaced, "Seat handed to the bot");

        if session.current_seat().is_bot() {
            self.schedule_bot_move(state, session_id);
        }
    }

    /// Grace expired without a reconnect: drop the participant and end its session.
    fn tear_down(&self, state: &mut HubState, connection_id: ConnectionId) {
        let still_disconnected = state
            .participants
            .get(&connection_id)
            .is_some_and(|p| p.disconnected_at.is_some());
        if !still_disconnected {
            return;
        }
        let Some(mut participant) = state.participants.remove(&connection_id) else {
            return;
        };
        participant.cancel_timers();
        tracing::info!(connection_id = %connection_id, "Reconnect grace expired");

        let Some(session_id) = participant.session_id else {
            return;
        };
        let Some(mut session) = state.sessions.remove(&session_id) else {
            return;
        };
        session.abandon();

        let final_state = frames::state_frame(&session);
        for other in state
            .participants
            .values_mut()
            .filter(|p| p.session_id == Some(session_id))
        {
            other.session_id = None;
            other.send(final_state.clone());
        }
        tracing::info!(game_id = %session_id, "Session torn down");
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Connected named players, sorted by username. Anyone not seated counts as waiting.
    pub async fn active_users(&self) -> Vec<ActiveUser> {
        let state = self.state.lock().await;
        let mut users: Vec<ActiveUser> = state
            .participants
            .values()
            .filter(|p| p.is_connected())
            .filter_map(|p| {
                let in_game = state.waiting != Some(p.connection_id)
                    && p
                        .session_id
                        .is_some_and(|id| state.sessions.contains_key(&id));
                let status = if in_game {
                    ActiveUserStatus::InGame
                } else {
                    ActiveUserStatus::Waiting
                };
                Some(ActiveUser {
                    username: p.username.clone()?,
                    status,
                })
            })
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users
    }

    /// Session the connection is attached to.
    #[cfg(test)]
    pub(crate) async fn session_of(&self, connection_id: ConnectionId) -> Option<GameId> {
        let state = self.state.lock().await;
        state
            .participants
            .get(&connection_id)
            .and_then(|p| p.session_id)
    }

    #[cfg(test)]
    pub(crate) async fn session_count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }
}
