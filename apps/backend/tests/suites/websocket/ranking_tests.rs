// Game-end paths and their rating settlement.

use std::time::Duration;

use backend_test_support::unique_helpers::unique_player_id;
use caro_backend::config::ServerConfig;
use serde_json::{json, Value};

use crate::support::{TestResult, TestServer, WebSocketClient};

struct Pair {
    host: WebSocketClient,
    guest: WebSocketClient,
    host_id: String,
    guest_id: String,
}

/// Host takes X, guest takes O, both past MATCH_FOUND.
async fn paired_room(server: &TestServer, create: Value) -> TestResult<Pair> {
    let host_id = unique_player_id("host");
    let guest_id = unique_player_id("guest");
    let mut host = WebSocketClient::connect(&server.ws_url(&host_id)).await?;
    let mut guest = WebSocketClient::connect(&server.ws_url(&guest_id)).await?;

    host.send_json(create).await?;
    let code = host.recv_type("ROOM_CREATED").await?["code"].clone();
    guest.send_json(json!({"type": "JOIN_ROOM", "code": code})).await?;
    host.recv_type("MATCH_FOUND").await?;
    guest.recv_type("MATCH_FOUND").await?;

    Ok(Pair {
        host,
        guest,
        host_id,
        guest_id,
    })
}

#[actix_web::test]
async fn win_claim_updates_both_ratings() -> TestResult {
    let server = TestServer::start_default().await?;
    let mut pair = paired_room(&server, json!({"type": "CREATE_ROOM"})).await?;

    pair.guest.send_json(json!({"type": "WIN_CLAIM"})).await?;

    for client in [&mut pair.host, &mut pair.guest] {
        let over = client.recv_type("GAME_OVER").await?;
        assert_eq!(over["winner"], "O");
        assert_eq!(over["reason"], "win_claim");
    }
    assert_eq!(pair.guest.recv_type("UPDATE_RANK").await?["elo"], 1216);
    assert_eq!(pair.host.recv_type("UPDATE_RANK").await?["elo"], 1184);

    let guest_row = server.store.player(&pair.guest_id).ok_or("guest row missing")?;
    assert_eq!((guest_row.elo, guest_row.wins, guest_row.games_played), (1216, 1, 1));
    let host_row = server.store.player(&pair.host_id).ok_or("host row missing")?;
    assert_eq!((host_row.elo, host_row.losses), (1184, 1));

    let matches = server.store.matches();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].winner_id.as_deref(), Some(pair.guest_id.as_str()));

    // Seats are released: a fresh FIND_MATCH is accepted.
    pair.host.send_json(json!({"type": "FIND_MATCH"})).await?;
    server
        .wait_for_pending(Some(&pair.host_id), Duration::from_secs(2))
        .await?;

    server.stop().await;
    Ok(())
}

#[actix_web::test]
async fn five_in_a_row_ends_with_winning_line() -> TestResult {
    let server = TestServer::start_default().await?;
    let mut pair = paired_room(&server, json!({"type": "CREATE_ROOM"})).await?;

    // Every accepted move is echoed to both seats.
    for col in 0..5 {
        pair.host
            .send_json(json!({"type": "MOVE", "x": col, "y": 0}))
            .await?;
        pair.host.recv_type("MOVE_MADE").await?;
        pair.guest.recv_type("MOVE_MADE").await?;
        if col < 4 {
            pair.guest
                .send_json(json!({"type": "MOVE", "x": col, "y": 5}))
                .await?;
            pair.guest.recv_type("MOVE_MADE").await?;
            pair.host.recv_type("MOVE_MADE").await?;
        }
    }

    let over = pair.guest.recv_type("GAME_OVER").await?;
    assert_eq!(over["winner"], "X");
    let line = over["winningLine"].as_array().ok_or("missing winningLine")?;
    assert_eq!(line.len(), 5);
    assert!(line.iter().all(|cell| cell["y"] == 0));
    assert_eq!(pair.host.recv_type("UPDATE_RANK").await?["elo"], 1216);

    server.stop().await;
    Ok(())
}

#[actix_web::test]
async fn leaving_an_active_game_forfeits() -> TestResult {
    let server = TestServer::start_default().await?;
    let mut pair = paired_room(&server, json!({"type": "CREATE_ROOM"})).await?;

    pair.host.send_json(json!({"type": "LEAVE_ROOM"})).await?;

    let over = pair.guest.recv_type("GAME_OVER").await?;
    assert_eq!(over["winner"], "O");
    assert_eq!(over["reason"], "opponent_left");
    assert_eq!(pair.guest.recv_type("UPDATE_RANK").await?["elo"], 1216);

    server.stop().await;
    Ok(())
}

#[actix_web::test]
async fn idle_player_loses_on_time() -> TestResult {
    let server = TestServer::start(ServerConfig::default()).await?;
    let mut pair = paired_room(
        &server,
        json!({"type": "CREATE_ROOM", "total_time": 60, "move_time_limit": 1}),
    )
    .await?;

    let over = pair.guest.recv_type("GAME_OVER").await?;
    assert_eq!(over["winner"], "O");
    assert_eq!(over["reason"], "timeout");
    assert_eq!(pair.host.recv_type("GAME_OVER").await?["reason"], "timeout");

    server.stop().await;
    Ok(())
}
