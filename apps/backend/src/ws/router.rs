//! Classifies inbound envelopes and hands them to the component that owns the action.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::domain::{Position, TimeControl};
use crate::services::game_session::{EndCause, GameOutcome, Release, SessionStatus};
use crate::services::matchmaker::{Enqueue, GameEnded, Matchmaker, Track};
use crate::state::app_state::AppState;
use crate::ws::connection::Connection;
use crate::ws::hub::Broadcast;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Parses a text frame; malformed payloads are dropped.
pub fn parse(conn: &Connection, text: &str) -> Option<ClientMsg> {
    match serde_json::from_str(text) {
        Ok(msg) => Some(msg),
        Err(err) => {
            debug!(
                conn_id = %conn.id(),
                error = %err,
                "[WS SESSION] dropping malformed message"
            );
            None
        }
    }
}

pub fn dispatch(state: &AppState, conn: &Arc<Connection>, msg: ClientMsg) {
    match msg {
        ClientMsg::FindMatch => find_match(state, conn),
        ClientMsg::CreateRoom {
            rule,
            total_time,
            increment,
            move_time_limit,
        } => {
            let defaults = state.config.default_time_control;
            let time_control = TimeControl::new(
                total_time.map_or(defaults.total, Duration::from_secs),
                increment.map_or(defaults.increment, Duration::from_secs),
                move_time_limit.map_or(defaults.move_limit, Duration::from_secs),
            );
            let rule = rule.unwrap_or(state.config.default_rule);
            let (_code, session) = state.rooms.create_room(conn, time_control, rule);
            state.matchmaker.do_send(Track { session });
        }
        ClientMsg::JoinRoom { code } => match state.rooms.join_room(&code, conn) {
            Ok(joined) => {
                if joined.started() {
                    joined
                        .session
                        .start_game(Matchmaker::timeout_hook(state.matchmaker.clone()));
                }
            }
            Err(err) => {
                conn.send(ServerMsg::error(err.to_string()));
            }
        },
        ClientMsg::Move { x, y } => make_move(state, conn, Position::new(x, y)),
        ClientMsg::WinClaim => win_claim(state, conn),
        ClientMsg::LeaveRoom => leave_room(state, conn),
        ClientMsg::ChatMessage { text, room_id } => {
            let msg = ServerMsg::ChatMessage {
                text,
                sender: conn.player_id().to_string(),
                room_id: room_id.clone(),
            };
            match room_id {
                Some(code) => {
                    if let Err(err) = state.rooms.broadcast(&code, &msg) {
                        conn.send(ServerMsg::error(err.to_string()));
                    }
                }
                None => state.hub.do_send(Broadcast { msg }),
            }
        }
    }
}

fn find_match(state: &AppState, conn: &Arc<Connection>) {
    let seated = conn.session().is_some_and(|session| {
        session.status() != SessionStatus::Complete && session.seat_of(conn.id()).is_some()
    });
    if seated {
        conn.send(ServerMsg::error("already in a game"));
        return;
    }
    state.matchmaker.do_send(Enqueue { conn: conn.clone() });
}

fn make_move(state: &AppState, conn: &Arc<Connection>, pos: Position) {
    let Some(session) = conn.session() else {
        return;
    };
    let Some(seat) = session.seat_of(conn.id()) else {
        return;
    };
    let Some(outcome) = session.make_move(seat, pos) else {
        debug!(conn_id = %conn.id(), x = pos.x, y = pos.y, "[WS SESSION] move ignored");
        return;
    };
    if let Some(finished) = outcome.finished {
        state.matchmaker.do_send(GameEnded {
            session,
            outcome: finished,
        });
    }
}

fn win_claim(state: &AppState, conn: &Arc<Connection>) {
    let Some(session) = conn.session() else {
        return;
    };
    let Some(seat) = session.seat_of(conn.id()) else {
        return;
    };
    if session.status() != SessionStatus::Active {
        return;
    }
    info!(
        session_id = %session.id(),
        player_id = %conn.player_id(),
        "[WS SESSION] win claimed"
    );
    state.matchmaker.do_send(GameEnded {
        session,
        outcome: GameOutcome {
            winner: Some(seat),
            cause: EndCause::WinClaim,
        },
    });
}

fn leave_room(state: &AppState, conn: &Arc<Connection>) {
    let Some(session) = conn.session() else {
        return;
    };

    match session.seat_of(conn.id()) {
        Some(seat) if session.status() == SessionStatus::Active => {
            info!(
                session_id = %session.id(),
                player_id = %conn.player_id(),
                "[WS SESSION] player left active game"
            );
            state.matchmaker.do_send(GameEnded {
                session,
                outcome: GameOutcome {
                    winner: Some(seat.opponent()),
                    cause: EndCause::Forfeit,
                },
            });
        }
        Some(_) => {
            if session.status() == SessionStatus::AwaitingOpponent {
                session.stop();
            }
            session.release_connection(conn.id());
            conn.clear_session_if(session.id());
        }
        None => {
            session.release_connection(conn.id());
            conn.clear_session_if(session.id());
        }
    }
}

/// Socket-closed path: leave the queue, and give a seated player time to return.
pub fn disconnect(state: &AppState, conn: &Arc<Connection>) {
    let Some(session) = conn.session() else {
        return;
    };
    match session.release_connection(conn.id()) {
        Release::Seat { seat, live: true } => {
            session.start_disconnect_timer(
                seat,
                state.config.disconnect_grace,
                Matchmaker::abandon_hook(state.matchmaker.clone()),
            );
        }
        Release::Seat { .. } | Release::Spectator | Release::NotBound => {}
    }
}
