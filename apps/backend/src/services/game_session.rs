//! One live game: seat bindings, spectators, clocks and timers around a `GameEngine`.
//!
//! Every public operation takes the session lock for its whole read-modify-write.
//! Timer tasks take the same lock when they fire and re-check that the condition they
//! were armed for still holds; each arm bumps an epoch so a superseded timer that was
//! already past its sleep becomes a no-op.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{GameEngine, GameRule, Position, Seat, TimeControl};
use crate::ws::connection::Connection;
use crate::ws::protocol::ServerMsg;

/// Called with the winning seat when the side to move runs out of time.
pub type TurnTimeoutHook = Arc<dyn Fn(Arc<GameSession>, Seat) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    AwaitingOpponent,
    Active,
    Complete,
}

/// Why a game ended; drives the GAME_OVER notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndCause {
    /// The engine reached a terminal position (win or full board).
    RuleResult { winning_line: Option<Vec<Position>> },
    Timeout,
    /// A seat left the room explicitly.
    Forfeit,
    WinClaim,
    /// A seat's disconnect grace period ran out.
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOutcome {
    /// `None` is a draw.
    pub winner: Option<Seat>,
    pub cause: EndCause,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub position: Position,
    pub mover: Seat,
    /// Present when this move ended the game.
    pub finished: Option<GameOutcome>,
}

/// Result of admitting a connection through a room code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Same identity as a known seat occupant; the seat was rebound. `started` is true
    /// when the rebind completed the pairing.
    Reconnected { seat: Seat, started: bool },
    /// Took the open seat. `started` is true when this completed the pairing.
    Seated { seat: Seat, started: bool },
    Spectating,
}

/// What a closing socket was doing in this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Seat unbound; `live` is true when the game had not finished.
    Seat { seat: Seat, live: bool },
    Spectator,
    NotBound,
}

#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub rule: GameRule,
    pub history: Vec<Position>,
    pub turn: Seat,
    pub player_x: Option<String>,
    pub player_o: Option<String>,
}

#[derive(Default)]
struct SeatSlot {
    player_id: Option<String>,
    conn: Option<Arc<Connection>>,
    disconnect_timer: Option<JoinHandle<()>>,
    disconnect_epoch: u64,
}

impl SeatSlot {
    fn cancel_disconnect_timer(&mut self) {
        if let Some(handle) = self.disconnect_timer.take() {
            handle.abort();
        }
        self.disconnect_epoch += 1;
    }
}

struct SessionState {
    status: SessionStatus,
    seats: [SeatSlot; 2],
    spectators: Vec<Arc<Connection>>,
    engine: GameEngine,
    time_control: TimeControl,
    remaining: [Duration; 2],
    last_move_at: Instant,
    turn: Seat,
    turn_timer: Option<JoinHandle<()>>,
    turn_epoch: u64,
    on_turn_timeout: Option<TurnTimeoutHook>,
    settled: bool,
    abandoned_since: Option<Instant>,
}

impl SessionState {
    fn seat(&self, seat: Seat) -> &SeatSlot {
        &self.seats[seat.index()]
    }

    fn seat_mut(&mut self, seat: Seat) -> &mut SeatSlot {
        &mut self.seats[seat.index()]
    }

    fn seat_of_conn(&self, conn_id: Uuid) -> Option<Seat> {
        [Seat::X, Seat::O].into_iter().find(|&seat| {
            self.seat(seat)
                .conn
                .as_ref()
                .is_some_and(|c| c.id() == conn_id)
        })
    }

    fn seat_of_player(&self, player_id: &str) -> Option<Seat> {
        [Seat::X, Seat::O]
            .into_iter()
            .find(|&seat| self.seat(seat).player_id.as_deref() == Some(player_id))
    }

    fn cancel_turn_timer(&mut self) {
        if let Some(handle) = self.turn_timer.take() {
            handle.abort();
        }
        self.turn_epoch += 1;
    }

    fn cancel_all_timers(&mut self) {
        self.cancel_turn_timer();
        for slot in &mut self.seats {
            slot.cancel_disconnect_timer();
        }
    }

    fn refresh_abandoned(&mut self) {
        let unbound = self.seats.iter().all(|slot| slot.conn.is_none());
        match (unbound, self.abandoned_since) {
            (true, None) => self.abandoned_since = Some(Instant::now()),
            (false, Some(_)) => self.abandoned_since = None,
            _ => {}
        }
    }

    fn broadcast(&self, msg: &ServerMsg) {
        for conn in self.seats.iter().filter_map(|slot| slot.conn.as_ref()) {
            conn.send(msg.clone());
        }
        for spectator in &self.spectators {
            spectator.try_send(msg.clone());
        }
    }
}

pub struct GameSession {
    id: Uuid,
    state: Mutex<SessionState>,
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.id)
            .field("status", &self.status())
            .finish()
    }
}

impl GameSession {
    pub fn new(rows: usize, columns: usize, rule: GameRule, time_control: TimeControl) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            state: Mutex::new(SessionState {
                status: SessionStatus::AwaitingOpponent,
                seats: [SeatSlot::default(), SeatSlot::default()],
                spectators: Vec::new(),
                engine: GameEngine::new(rows, columns, rule),
                time_control,
                remaining: [time_control.total; 2],
                last_move_at: Instant::now(),
                turn: Seat::X,
                turn_timer: None,
                turn_epoch: 0,
                on_turn_timeout: None,
                settled: false,
                abandoned_since: None,
            }),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.state.lock().status
    }

    pub fn rule(&self) -> GameRule {
        self.state.lock().engine.rule()
    }

    pub fn turn(&self) -> Seat {
        self.state.lock().turn
    }

    pub fn history(&self) -> Vec<Position> {
        self.state.lock().engine.history().to_vec()
    }

    pub fn remaining(&self, seat: Seat) -> Duration {
        self.state.lock().remaining[seat.index()]
    }

    pub fn player_id(&self, seat: Seat) -> Option<String> {
        self.state.lock().seat(seat).player_id.clone()
    }

    pub fn seat_connection(&self, seat: Seat) -> Option<Arc<Connection>> {
        self.state.lock().seat(seat).conn.clone()
    }

    pub fn seat_of(&self, conn_id: Uuid) -> Option<Seat> {
        self.state.lock().seat_of_conn(conn_id)
    }

    pub fn spectator_count(&self) -> usize {
        self.state.lock().spectators.len()
    }

    pub fn has_disconnect_timer(&self, seat: Seat) -> bool {
        self.state.lock().seat(seat).disconnect_timer.is_some()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock();
        SessionSnapshot {
            status: state.status,
            rule: state.engine.rule(),
            history: state.engine.history().to_vec(),
            turn: state.turn,
            player_x: state.seat(Seat::X).player_id.clone(),
            player_o: state.seat(Seat::O).player_id.clone(),
        }
    }

    /// Binds `conn` to `seat`, fixing the seat identity on first bind.
    ///
    /// Cancels that seat's disconnect timer. Moves the session to `Active` when this
    /// leaves both seats bound for the first time; returns whether that happened.
    pub fn bind_seat(self: &Arc<Self>, seat: Seat, conn: &Arc<Connection>) -> bool {
        let mut state = self.state.lock();
        self.bind_locked(&mut state, seat, conn)
    }

    fn bind_locked(
        self: &Arc<Self>,
        state: &mut SessionState,
        seat: Seat,
        conn: &Arc<Connection>,
    ) -> bool {
        let slot = state.seat_mut(seat);
        slot.cancel_disconnect_timer();
        slot.player_id
            .get_or_insert_with(|| conn.player_id().to_string());
        slot.conn = Some(conn.clone());
        conn.bind_session(self);
        state.refresh_abandoned();

        let both_bound = state.seats.iter().all(|s| s.conn.is_some());
        if state.status == SessionStatus::AwaitingOpponent && both_bound {
            state.status = SessionStatus::Active;
            info!(session_id = %self.id, "[GAME SESSION] both seats bound, session active");
            return true;
        }
        false
    }

    /// Admits a connection arriving by room code: reconnect by identity, else take the
    /// open seat, else spectate.
    pub fn admit(self: &Arc<Self>, conn: &Arc<Connection>) -> Admission {
        let mut state = self.state.lock();

        if let Some(seat) = state.seat_of_player(conn.player_id()) {
            let started = self.bind_locked(&mut state, seat, conn);
            return Admission::Reconnected { seat, started };
        }

        let open = [Seat::X, Seat::O]
            .into_iter()
            .find(|&seat| state.seat(seat).player_id.is_none());
        if let Some(seat) = open {
            let started = self.bind_locked(&mut state, seat, conn);
            return Admission::Seated { seat, started };
        }

        if !state.spectators.iter().any(|s| s.id() == conn.id()) {
            state.spectators.push(conn.clone());
        }
        conn.bind_session(self);
        Admission::Spectating
    }

    /// Stamps the start time and arms the first turn timer.
    pub fn start_game(self: &Arc<Self>, on_timeout: TurnTimeoutHook) {
        let mut state = self.state.lock();
        if state.status != SessionStatus::Active {
            return;
        }
        state.on_turn_timeout = Some(on_timeout);
        state.last_move_at = Instant::now();
        self.arm_turn_timer(&mut state);
    }

    fn arm_turn_timer(self: &Arc<Self>, state: &mut SessionState) {
        state.cancel_turn_timer();
        let seat = state.turn;
        let epoch = state.turn_epoch;
        let budget = state
            .time_control
            .turn_budget(state.remaining[seat.index()]);

        let weak: Weak<GameSession> = Arc::downgrade(self);
        state.turn_timer = Some(tokio::spawn(async move {
            sleep(budget).await;
            if let Some(session) = weak.upgrade() {
                session.turn_timer_fired(seat, epoch);
            }
        }));
        debug!(
            session_id = %self.id,
            seat = %seat,
            budget_ms = budget.as_millis() as u64,
            "[GAME SESSION] turn timer armed"
        );
    }

    fn turn_timer_fired(self: &Arc<Self>, seat: Seat, epoch: u64) {
        let hook = {
            let mut state = self.state.lock();
            let still_waiting = state.status == SessionStatus::Active
                && !state.settled
                && state.turn_epoch == epoch
                && state.turn == seat;
            if !still_waiting {
                return;
            }
            state.turn_timer = None;
            state.remaining[seat.index()] = Duration::ZERO;
            state.on_turn_timeout.clone()
        };
        info!(session_id = %self.id, seat = %seat, "[GAME SESSION] turn timed out");
        if let Some(hook) = hook {
            hook(self.clone(), seat.opponent());
        }
    }

    /// Applies a move for `seat` and fans MOVE_MADE out while still holding the lock, so
    /// every recipient sees moves in commit order. Returns `None` when the move is not
    /// accepted; rejected moves produce no message.
    pub fn make_move(self: &Arc<Self>, seat: Seat, pos: Position) -> Option<MoveOutcome> {
        let mut state = self.state.lock();
        if state.status != SessionStatus::Active || state.settled || state.turn != seat {
            return None;
        }
        if !state.engine.place_piece(pos) {
            return None;
        }

        let now = Instant::now();
        let elapsed = now.saturating_duration_since(state.last_move_at);
        let idx = seat.index();
        state.remaining[idx] = state.time_control.bank_after_move(state.remaining[idx], elapsed);
        state.last_move_at = now;
        state.turn = state.engine.current_player();
        state.broadcast(&ServerMsg::move_made(pos));

        let finished = if state.engine.is_game_over() {
            state.status = SessionStatus::Complete;
            state.cancel_all_timers();
            Some(GameOutcome {
                winner: state.engine.winner(),
                cause: EndCause::RuleResult {
                    winning_line: state.engine.winning_line().map(<[_]>::to_vec),
                },
            })
        } else {
            self.arm_turn_timer(&mut state);
            None
        };

        Some(MoveOutcome {
            position: pos,
            mover: seat,
            finished,
        })
    }

    /// Arms (or re-arms) the grace timer for an unbound seat.
    ///
    /// `on_expire` runs with the winning seat only if, when the timer fires, the seat is
    /// still unbound, the game is unfinished and the opposing seat is still connected.
    pub fn start_disconnect_timer<F>(self: &Arc<Self>, seat: Seat, duration: Duration, on_expire: F)
    where
        F: FnOnce(Arc<GameSession>, Seat) + Send + 'static,
    {
        let mut state = self.state.lock();
        if state.status == SessionStatus::Complete {
            return;
        }
        let slot = state.seat_mut(seat);
        slot.cancel_disconnect_timer();
        let epoch = slot.disconnect_epoch;

        let weak: Weak<GameSession> = Arc::downgrade(self);
        slot.disconnect_timer = Some(tokio::spawn(async move {
            sleep(duration).await;
            let Some(session) = weak.upgrade() else {
                return;
            };
            if let Some(winner) = session.disconnect_timer_fired(seat, epoch) {
                on_expire(session, winner);
            }
        }));
        info!(
            session_id = %self.id,
            seat = %seat,
            grace_secs = duration.as_secs(),
            "[GAME SESSION] disconnect timer armed"
        );
    }

    pub fn stop_disconnect_timer(&self, seat: Seat) {
        self.state.lock().seat_mut(seat).cancel_disconnect_timer();
    }

    fn disconnect_timer_fired(&self, seat: Seat, epoch: u64) -> Option<Seat> {
        let mut state = self.state.lock();
        let slot = state.seat_mut(seat);
        if slot.disconnect_epoch != epoch || slot.conn.is_some() {
            return None;
        }
        slot.disconnect_timer = None;
        if state.status == SessionStatus::Complete || state.settled {
            return None;
        }

        let remaining = seat.opponent();
        if state.seat(remaining).conn.is_some() {
            info!(
                session_id = %self.id,
                seat = %seat,
                "[GAME SESSION] seat abandoned, forfeiting to remaining player"
            );
            Some(remaining)
        } else {
            info!(
                session_id = %self.id,
                seat = %seat,
                "[GAME SESSION] grace expired with no player connected"
            );
            None
        }
    }

    /// Detaches a closing connection from its seat or the spectator set.
    pub fn release_connection(&self, conn_id: Uuid) -> Release {
        let mut state = self.state.lock();
        if let Some(seat) = state.seat_of_conn(conn_id) {
            state.seat_mut(seat).conn = None;
            state.refresh_abandoned();
            let live = state.status != SessionStatus::Complete && !state.settled;
            return Release::Seat { seat, live };
        }
        let before = state.spectators.len();
        state.spectators.retain(|s| s.id() != conn_id);
        if state.spectators.len() != before {
            Release::Spectator
        } else {
            Release::NotBound
        }
    }

    /// Marks the session for settlement. Returns false if settlement already began,
    /// so each game is settled exactly once.
    pub fn begin_settlement(&self) -> bool {
        let mut state = self.state.lock();
        if state.settled {
            return false;
        }
        state.settled = true;
        state.status = SessionStatus::Complete;
        state.cancel_all_timers();
        true
    }

    /// Cancels every timer and closes the session to further moves.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        state.status = SessionStatus::Complete;
        state.cancel_all_timers();
    }

    /// True when neither seat has been connected for at least `grace` and the game
    /// never finished.
    pub fn is_abandoned(&self, grace: Duration) -> bool {
        let state = self.state.lock();
        state.status != SessionStatus::Complete
            && !state.settled
            && state
                .abandoned_since
                .is_some_and(|since| since.elapsed() >= grace)
    }

    /// Seats get logged drops on a full queue; spectators are dropped silently.
    pub fn broadcast(&self, msg: &ServerMsg) {
        self.state.lock().broadcast(msg);
    }

    pub fn broadcast_spectators(&self, msg: &ServerMsg) {
        for spectator in &self.state.lock().spectators {
            spectator.try_send(msg.clone());
        }
    }

    pub fn send_to_seat(&self, seat: Seat, msg: ServerMsg) -> bool {
        let conn = self.state.lock().seat(seat).conn.clone();
        conn.is_some_and(|c| c.send(msg))
    }

    /// MATCH_FOUND to both seats, or a GAME_SYNC replay to each when moves exist.
    pub fn announce_start(&self) {
        let state = self.state.lock();
        let rule = state.engine.rule();
        let history = state.engine.history();
        for seat in [Seat::X, Seat::O] {
            let Some(conn) = state.seat(seat).conn.as_ref() else {
                continue;
            };
            if history.is_empty() {
                conn.send(ServerMsg::MatchFound { color: seat, rule });
            } else {
                conn.send(ServerMsg::GameSync {
                    color: seat,
                    history: history.to_vec(),
                    turn: state.turn,
                });
            }
        }
    }

    /// Detaches every seat and spectator connection's weak link to this session.
    pub fn release_bindings(&self) {
        let state = self.state.lock();
        let conns = state
            .seats
            .iter()
            .filter_map(|slot| slot.conn.as_ref())
            .chain(state.spectators.iter());
        for conn in conns {
            conn.clear_session_if(self.id);
        }
    }
}
