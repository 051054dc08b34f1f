//! Quick-match pairing and the single game-end path.
//!
//! The actor's mailbox serializes every pairing, settlement and reaper sweep, so the
//! pending slot and the tracked-session map need no locks. Settlement runs as an
//! [`AtomicResponse`]: no other message is handled until the storage calls finish.

use std::collections::HashMap;
use std::sync::Arc;

use actix::prelude::*;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::domain::Seat;
use crate::repos::ratings::RatingStore;
use crate::services::game_session::{
    EndCause, GameOutcome, GameSession, SessionStatus, TurnTimeoutHook,
};
use crate::services::settlement::settle;
use crate::ws::connection::Connection;
use crate::ws::protocol::{ServerMsg, WINNER_ABANDONED, WINNER_DRAW};

#[derive(Message)]
#[rtype(result = "()")]
pub struct Enqueue {
    pub conn: Arc<Connection>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Dequeue {
    pub conn_id: Uuid,
}

/// Puts a session under the reaper's watch.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Track {
    pub session: Arc<GameSession>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct GameEnded {
    pub session: Arc<GameSession>,
    pub outcome: GameOutcome,
}

/// Runs one reaper sweep immediately; returns how many sessions were stopped.
#[derive(Message)]
#[rtype(result = "usize")]
pub struct Reap;

/// Player id currently waiting in the pending slot.
#[derive(Message)]
#[rtype(result = "Option<String>")]
pub struct PendingPlayer;

#[derive(Message)]
#[rtype(result = "usize")]
pub struct TrackedSessions;

pub struct Matchmaker {
    config: Arc<ServerConfig>,
    store: Arc<dyn RatingStore>,
    pending: Option<Arc<Connection>>,
    sessions: HashMap<Uuid, Arc<GameSession>>,
}

impl Matchmaker {
    pub fn new(config: Arc<ServerConfig>, store: Arc<dyn RatingStore>) -> Self {
        Self {
            config,
            store,
            pending: None,
            sessions: HashMap::new(),
        }
    }

    /// Turn-timeout callback routing the result back through this actor.
    pub fn timeout_hook(addr: Addr<Matchmaker>) -> TurnTimeoutHook {
        Arc::new(move |session, winner| {
            addr.do_send(GameEnded {
                session,
                outcome: GameOutcome {
                    winner: Some(winner),
                    cause: EndCause::Timeout,
                },
            });
        })
    }

    /// Disconnect-grace callback awarding the game to the remaining seat.
    pub fn abandon_hook(
        addr: Addr<Matchmaker>,
    ) -> impl FnOnce(Arc<GameSession>, Seat) + Send + 'static {
        move |session, winner| {
            addr.do_send(GameEnded {
                session,
                outcome: GameOutcome {
                    winner: Some(winner),
                    cause: EndCause::Abandoned,
                },
            });
        }
    }

    /// A waiting connection that closed or sat down elsewhere no longer counts.
    fn take_live_pending(&mut self) -> Option<Arc<Connection>> {
        let pending = self.pending.take()?;
        let busy = pending
            .session()
            .is_some_and(|s| s.status() != SessionStatus::Complete);
        if pending.is_closed() || busy {
            debug!(player_id = %pending.player_id(), "[MATCHMAKER] discarding stale pending entry");
            return None;
        }
        Some(pending)
    }

    fn pair(&mut self, x: Arc<Connection>, o: Arc<Connection>, addr: Addr<Matchmaker>) {
        let session = GameSession::new(
            self.config.board_rows,
            self.config.board_columns,
            self.config.default_rule,
            self.config.default_time_control,
        );
        session.bind_seat(Seat::X, &x);
        session.bind_seat(Seat::O, &o);
        session.announce_start();
        session.start_game(Self::timeout_hook(addr));

        info!(
            session_id = %session.id(),
            player_x = %x.player_id(),
            player_o = %o.player_id(),
            "[MATCHMAKER] players paired"
        );
        self.sessions.insert(session.id(), session);
    }

    fn reap(&mut self) -> usize {
        let grace = self.config.disconnect_grace;
        let mut reaped = 0;
        self.sessions.retain(|id, session| {
            if session.status() == SessionStatus::Complete {
                return false;
            }
            if session.is_abandoned(grace) {
                session.stop();
                session.release_bindings();
                info!(session_id = %id, "[MATCHMAKER] reaped abandoned session");
                reaped += 1;
                return false;
            }
            true
        });
        reaped
    }
}

/// GAME_OVER fan-out for each way a game can end.
fn announce_game_over(session: &GameSession, outcome: &GameOutcome) {
    let label = outcome
        .winner
        .map(|seat| seat.as_str().to_string())
        .unwrap_or_else(|| WINNER_DRAW.to_string());
    let game_over = |winner: String, winning_line, reason: Option<&str>| ServerMsg::GameOver {
        winner,
        winning_line,
        reason: reason.map(str::to_string),
    };

    match (&outcome.cause, outcome.winner) {
        (EndCause::RuleResult { winning_line }, _) => {
            session.broadcast(&game_over(label, winning_line.clone(), None));
        }
        (EndCause::Timeout, _) => {
            session.broadcast(&game_over(label, None, Some("timeout")));
        }
        (EndCause::WinClaim, _) => {
            session.broadcast(&game_over(label, None, Some("win_claim")));
        }
        (EndCause::Forfeit, Some(winner)) => {
            let msg = game_over(label, None, Some("opponent_left"));
            session.send_to_seat(winner, msg.clone());
            session.broadcast_spectators(&msg);
        }
        (EndCause::Abandoned, Some(winner)) => {
            session.send_to_seat(
                winner,
                game_over(WINNER_ABANDONED.to_string(), None, Some("abandoned")),
            );
            session.broadcast_spectators(&game_over(label, None, Some("abandoned")));
        }
        (EndCause::Forfeit | EndCause::Abandoned, None) => {
            session.broadcast(&game_over(label, None, None));
        }
    }
}

impl Actor for Matchmaker {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("[MATCHMAKER] started");
        ctx.run_interval(self.config.reaper_interval, |actor, _ctx| {
            let reaped = actor.reap();
            if reaped > 0 {
                info!(reaped, "[MATCHMAKER] reaper sweep finished");
            }
        });
    }
}

impl Handler<Enqueue> for Matchmaker {
    type Result = ();

    fn handle(&mut self, msg: Enqueue, ctx: &mut Self::Context) -> Self::Result {
        let conn = msg.conn;
        match self.take_live_pending() {
            Some(waiting) if waiting.id() == conn.id() => {
                self.pending = Some(waiting);
            }
            Some(waiting) => {
                self.pair(waiting, conn, ctx.address());
            }
            None => {
                info!(player_id = %conn.player_id(), "[MATCHMAKER] player waiting for opponent");
                self.pending = Some(conn);
            }
        }
    }
}

impl Handler<Dequeue> for Matchmaker {
    type Result = ();

    fn handle(&mut self, msg: Dequeue, _ctx: &mut Self::Context) -> Self::Result {
        if self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.id() == msg.conn_id)
        {
            self.pending = None;
            debug!(conn_id = %msg.conn_id, "[MATCHMAKER] pending entry removed");
        }
    }
}

impl Handler<Track> for Matchmaker {
    type Result = ();

    fn handle(&mut self, msg: Track, _ctx: &mut Self::Context) -> Self::Result {
        self.sessions.insert(msg.session.id(), msg.session);
    }
}

impl Handler<GameEnded> for Matchmaker {
    type Result = AtomicResponse<Self, ()>;

    fn handle(&mut self, msg: GameEnded, _ctx: &mut Self::Context) -> Self::Result {
        let GameEnded { session, outcome } = msg;

        if !session.begin_settlement() {
            debug!(session_id = %session.id(), "[MATCHMAKER] game already settled");
            return AtomicResponse::new(Box::pin(async {}.into_actor(self)));
        }
        self.sessions.remove(&session.id());

        info!(
            session_id = %session.id(),
            winner = outcome.winner.map(Seat::as_str).unwrap_or(WINNER_DRAW),
            cause = ?outcome.cause,
            "[MATCHMAKER] game ended"
        );
        announce_game_over(&session, &outcome);

        let store = self.store.clone();
        AtomicResponse::new(Box::pin(
            async move {
                settle(store.as_ref(), &session, outcome.winner).await;
            }
            .into_actor(self),
        ))
    }
}

impl Handler<Reap> for Matchmaker {
    type Result = usize;

    fn handle(&mut self, _msg: Reap, _ctx: &mut Self::Context) -> Self::Result {
        self.reap()
    }
}

impl Handler<PendingPlayer> for Matchmaker {
    type Result = Option<String>;

    fn handle(&mut self, _msg: PendingPlayer, _ctx: &mut Self::Context) -> Self::Result {
        self.pending.as_ref().map(|c| c.player_id().to_string())
    }
}

impl Handler<TrackedSessions> for Matchmaker {
    type Result = usize;

    fn handle(&mut self, _msg: TrackedSessions, _ctx: &mut Self::Context) -> Self::Result {
        self.sessions.len()
    }
}
