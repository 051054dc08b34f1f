//! End-of-game bookkeeping: ratings, records, rank notifications, seat release.

use time::OffsetDateTime;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{calculate_ratings, GameScore, Seat};
use crate::repos::ratings::{MatchRecord, MoveRecord, PlayerRecord, RatingStore};
use crate::services::game_session::GameSession;
use crate::ws::protocol::ServerMsg;

/// Ratings after settlement, `[X, O]`. `None` when the rows could not be loaded.
pub type SettledRatings = Option<[i32; 2]>;

/// Settles a finished game. `winner == None` is a draw.
///
/// Each storage step is attempted independently; a failure is logged and the remaining
/// steps still run, so both players are always released for a new game.
pub async fn settle(
    store: &dyn RatingStore,
    session: &GameSession,
    winner: Option<Seat>,
) -> SettledRatings {
    let session_id = session.id();
    let ids = [session.player_id(Seat::X), session.player_id(Seat::O)];

    let ratings = match ids {
        [Some(x_id), Some(o_id)] => {
            let ratings = update_ratings(store, &x_id, &o_id, winner, session_id).await;
            save_match(store, session, &x_id, &o_id, winner).await;
            ratings
        }
        _ => {
            warn!(session_id = %session_id, "[SETTLEMENT] seat identity missing, skipping ratings");
            None
        }
    };

    if let Some(elos) = ratings {
        for seat in [Seat::X, Seat::O] {
            if let Some(conn) = session.seat_connection(seat) {
                conn.send(ServerMsg::UpdateRank {
                    elo: elos[seat.index()],
                });
            }
        }
    }

    session.release_bindings();
    info!(
        session_id = %session_id,
        winner = winner.map(Seat::as_str).unwrap_or("draw"),
        "[SETTLEMENT] game settled"
    );
    ratings
}

async fn update_ratings(
    store: &dyn RatingStore,
    x_id: &str,
    o_id: &str,
    winner: Option<Seat>,
    session_id: Uuid,
) -> SettledRatings {
    let (mut x, mut o) = match (store.get_or_create(x_id).await, store.get_or_create(o_id).await) {
        (Ok(x), Ok(o)) => (x, o),
        (Err(err), _) | (_, Err(err)) => {
            error!(
                session_id = %session_id,
                error = %err,
                "[SETTLEMENT] failed to load player rows, ratings unchanged"
            );
            return None;
        }
    };

    let score_x = match winner {
        Some(Seat::X) => GameScore::Win,
        Some(Seat::O) => GameScore::Loss,
        None => GameScore::Draw,
    };
    let (new_x, new_o) = calculate_ratings(x.elo, o.elo, score_x.value());
    apply_result(&mut x, new_x, score_x);
    apply_result(&mut o, new_o, score_x.reversed());

    for record in [&x, &o] {
        if let Err(err) = store.save_player(record).await {
            error!(
                session_id = %session_id,
                player_id = %record.id,
                error = %err,
                "[SETTLEMENT] failed to save player row"
            );
        }
    }

    Some([x.elo, o.elo])
}

fn apply_result(record: &mut PlayerRecord, elo: i32, score: GameScore) {
    record.elo = elo;
    record.games_played += 1;
    match score {
        GameScore::Win => record.wins += 1,
        GameScore::Loss => record.losses += 1,
        GameScore::Draw => record.draws += 1,
    }
}

async fn save_match(
    store: &dyn RatingStore,
    session: &GameSession,
    x_id: &str,
    o_id: &str,
    winner: Option<Seat>,
) {
    let moves = session
        .history()
        .into_iter()
        .enumerate()
        .map(|(order, pos)| MoveRecord {
            x: pos.x,
            y: pos.y,
            player: Seat::for_move(order),
            order,
        })
        .collect();

    let record = MatchRecord {
        id: Uuid::new_v4().to_string(),
        player_x_id: x_id.to_string(),
        player_o_id: o_id.to_string(),
        winner_id: winner.map(|seat| match seat {
            Seat::X => x_id.to_string(),
            Seat::O => o_id.to_string(),
        }),
        moves,
        timestamp: OffsetDateTime::now_utc(),
    };

    if let Err(err) = store.save_match(&record).await {
        error!(
            session_id = %session.id(),
            error = %err,
            "[SETTLEMENT] failed to save match record"
        );
    }
}
