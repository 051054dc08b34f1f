//! Code-addressable private lobbies.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;
use thiserror::Error;
use tracing::info;

use crate::config::ServerConfig;
use crate::domain::{GameRule, Seat, TimeControl};
use crate::services::game_session::{Admission, GameSession};
use crate::ws::connection::Connection;
use crate::ws::protocol::ServerMsg;

const CODE_LENGTH: usize = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoomError {
    #[error("room not found")]
    NotFound,
}

/// What a successful join did for the caller.
#[derive(Debug, Clone)]
pub struct JoinedRoom {
    pub session: Arc<GameSession>,
    pub admission: Admission,
}

impl JoinedRoom {
    /// True when this join paired the room and the first turn timer must be armed.
    pub fn started(&self) -> bool {
        matches!(
            self.admission,
            Admission::Seated { started: true, .. } | Admission::Reconnected { started: true, .. }
        )
    }
}

pub struct RoomDirectory {
    rows: usize,
    columns: usize,
    rooms: RwLock<HashMap<String, Arc<GameSession>>>,
}

impl RoomDirectory {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            rows: config.board_rows,
            columns: config.board_columns,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a new room with `host` in seat X and sends them ROOM_CREATED.
    pub fn create_room(
        &self,
        host: &Arc<Connection>,
        time_control: TimeControl,
        rule: GameRule,
    ) -> (String, Arc<GameSession>) {
        let session = GameSession::new(self.rows, self.columns, rule, time_control);
        session.bind_seat(Seat::X, host);

        let code = {
            let mut rooms = self.rooms.write();
            let mut code = generate_code();
            while rooms.contains_key(&code) {
                code = generate_code();
            }
            rooms.insert(code.clone(), session.clone());
            code
        };

        info!(
            code = %code,
            player_id = %host.player_id(),
            rule = %rule,
            session_id = %session.id(),
            "[ROOMS] room created"
        );
        host.send(ServerMsg::RoomCreated { code: code.clone() });
        (code, session)
    }

    /// Reconnects a known identity, fills the open seat, or adds a spectator.
    pub fn join_room(&self, code: &str, conn: &Arc<Connection>) -> Result<JoinedRoom, RoomError> {
        let session = self.get(code).ok_or(RoomError::NotFound)?;
        let admission = session.admit(conn);

        match admission {
            Admission::Reconnected { seat, started } => {
                info!(
                    code = %code,
                    player_id = %conn.player_id(),
                    seat = %seat,
                    started,
                    "[ROOMS] player reconnected"
                );
                if started {
                    // Returning host completed the pairing: both seats learn the game began.
                    session.announce_start();
                } else {
                    let snapshot = session.snapshot();
                    conn.send(ServerMsg::GameSync {
                        color: seat,
                        history: snapshot.history,
                        turn: snapshot.turn,
                    });
                }
            }
            Admission::Seated { seat, started } => {
                info!(
                    code = %code,
                    player_id = %conn.player_id(),
                    seat = %seat,
                    "[ROOMS] player seated"
                );
                if started {
                    session.announce_start();
                }
            }
            Admission::Spectating => {
                let snapshot = session.snapshot();
                info!(
                    code = %code,
                    player_id = %conn.player_id(),
                    "[ROOMS] spectator joined"
                );
                conn.send(ServerMsg::SpectatorJoined {
                    history: snapshot.history,
                    player_x: snapshot.player_x,
                    player_o: snapshot.player_o,
                });
            }
        }

        Ok(JoinedRoom { session, admission })
    }

    /// Fans out to both seats and every spectator of the room.
    pub fn broadcast(&self, code: &str, msg: &ServerMsg) -> Result<(), RoomError> {
        let session = self.get(code).ok_or(RoomError::NotFound)?;
        session.broadcast(msg);
        Ok(())
    }

    pub fn get(&self, code: &str) -> Option<Arc<GameSession>> {
        self.rooms.read().get(&code.to_ascii_uppercase()).cloned()
    }
}

fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| char::from(rng.random_range(b'A'..=b'Z')))
        .collect()
}
