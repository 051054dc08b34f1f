use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;
use uuid::Uuid;

use crate::services::game_session::GameSession;
use crate::ws::protocol::ServerMsg;

/// Per-socket handle shared between the socket actor, sessions and the registries.
///
/// Outbound delivery never blocks: messages go into a bounded queue drained by the
/// socket's writer, and a full queue drops the message.
#[derive(Debug)]
pub struct Connection {
    id: Uuid,
    player_id: String,
    outbound: mpsc::Sender<ServerMsg>,
    session: Mutex<Option<Weak<GameSession>>>,
}

impl Connection {
    pub fn new(
        player_id: impl Into<String>,
        capacity: usize,
    ) -> (Arc<Self>, mpsc::Receiver<ServerMsg>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let conn = Arc::new(Self {
            id: Uuid::new_v4(),
            player_id: player_id.into(),
            outbound: tx,
            session: Mutex::new(None),
        });
        (conn, rx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// Queues a message, logging when it had to be dropped.
    pub fn send(&self, msg: ServerMsg) -> bool {
        match self.outbound.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(msg)) => {
                warn!(
                    conn_id = %self.id,
                    player_id = %self.player_id,
                    kind = msg.kind(),
                    "[CONNECTION] outbound queue full, dropping message"
                );
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Best-effort delivery with no logging; used for spectators and global chat.
    pub fn try_send(&self, msg: ServerMsg) -> bool {
        self.outbound.try_send(msg).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }

    pub fn session(&self) -> Option<Arc<GameSession>> {
        self.session.lock().as_ref().and_then(Weak::upgrade)
    }

    pub fn bind_session(&self, session: &Arc<GameSession>) {
        *self.session.lock() = Some(Arc::downgrade(session));
    }

    /// Clears the binding only if it still points at `session_id`.
    pub fn clear_session_if(&self, session_id: Uuid) {
        let mut slot = self.session.lock();
        let matches = slot
            .as_ref()
            .and_then(Weak::upgrade)
            .map_or(true, |s| s.id() == session_id);
        if matches {
            *slot = None;
        }
    }
}
