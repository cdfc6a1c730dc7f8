//! Wire snapshots built from a session.

use connect4_domain::{Seat, Session, SessionResult, SessionStatus};
use connect4_shared::{
    GameResultPayload, GameStatePayload, LastMoveInfo, PlayerInfo, ServerFrame, ServerMessage,
    WireStatus,
};

pub(crate) fn player_info(seat: &Seat) -> PlayerInfo {
    PlayerInfo {
        id: seat.username().to_string(),
        username: seat.username().to_string(),
        is_bot: seat.is_bot(),
    }
}

fn wire_status(status: SessionStatus) -> WireStatus {
    match status {
        SessionStatus::InProgress => WireStatus::InProgress,
        SessionStatus::Completed => WireStatus::Completed,
        SessionStatus::Draw => WireStatus::Draw,
    }
}

pub(crate) fn game_state(session: &Session) -> GameStatePayload {
    let game = session.game();
    let [player1, player2] = session.seats();
    GameStatePayload {
        id: session.id().to_string(),
        board: game.board().to_grid(),
        current_turn: game.current_turn().as_u8(),
        status: wire_status(session.status()),
        player1: Some(player_info(player1)),
        player2: Some(player_info(player2)),
        winner: session.winner_seat().map(player_info),
        last_move: game.last_move().map(|m| LastMoveInfo {
            row: m.row,
            column: m.column,
            player: m.player.as_u8(),
        }),
        play_again_requests: session.rematch_requests().to_vec(),
    }
}

pub(crate) fn result_payload(session: &Session, result: &SessionResult) -> GameResultPayload {
    GameResultPayload {
        game_id: session.id().to_string(),
        is_draw: result.is_draw,
        winner: result.winner.clone(),
        bot_won: result.bot_won,
    }
}

pub(crate) fn scoped(session: &Session, message: ServerMessage) -> ServerFrame {
    ServerFrame::new(session.id().to_string(), message)
}

pub(crate) fn state_frame(session: &Session) -> ServerFrame {
    scoped(session, ServerMessage::GameState(game_state(session)))
}
