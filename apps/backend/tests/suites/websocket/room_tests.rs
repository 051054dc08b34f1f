// Room creation, joining, spectating and error reporting.

use std::time::Duration;

use backend_test_support::unique_helpers::unique_player_id;
use serde_json::{json, Value};

use crate::support::{TestResult, TestServer, WebSocketClient};

async fn create_room(client: &mut WebSocketClient, body: Value) -> TestResult<String> {
    client.send_json(body).await?;
    let created = client.recv_type("ROOM_CREATED").await?;
    let code = created["code"].as_str().ok_or("missing code")?.to_string();
    Ok(code)
}

#[actix_web::test]
async fn full_room_turns_third_joiner_into_spectator() -> TestResult {
    let server = TestServer::start_default().await?;
    let host_id = unique_player_id("host");
    let guest_id = unique_player_id("guest");
    let mut host = WebSocketClient::connect(&server.ws_url(&host_id)).await?;
    let mut guest = WebSocketClient::connect(&server.ws_url(&guest_id)).await?;
    let mut watcher = WebSocketClient::connect(&server.ws_url(&unique_player_id("watcher"))).await?;

    let code = create_room(&mut host, json!({"type": "CREATE_ROOM"})).await?;
    assert_eq!(code.len(), 4);
    assert!(code.chars().all(|c| c.is_ascii_uppercase()));

    guest.send_json(json!({"type": "JOIN_ROOM", "code": code})).await?;
    assert_eq!(host.recv_type("MATCH_FOUND").await?["color"], "X");
    assert_eq!(guest.recv_type("MATCH_FOUND").await?["color"], "O");

    watcher.send_json(json!({"type": "JOIN_ROOM", "code": code})).await?;
    let joined = watcher.recv_type("SPECTATOR_JOINED").await?;
    assert_eq!(joined["history"], json!([]));
    assert_eq!(joined["player_x"], host_id.as_str());
    assert_eq!(joined["player_o"], guest_id.as_str());

    host.send_json(json!({"type": "MOVE", "x": 0, "y": 0})).await?;
    let made = watcher.recv_type("MOVE_MADE").await?;
    assert_eq!(made, json!({"type": "MOVE_MADE", "x": 0, "y": 0}));

    // Spectators cannot move.
    watcher.send_json(json!({"type": "MOVE", "x": 5, "y": 5})).await?;
    guest.recv_type("MOVE_MADE").await?;
    guest.expect_silence(Duration::from_millis(300)).await?;

    server.stop().await;
    Ok(())
}

#[actix_web::test]
async fn unknown_code_reports_error_and_keeps_socket() -> TestResult {
    let server = TestServer::start_default().await?;
    let mut client = WebSocketClient::connect(&server.ws_url(&unique_player_id("p"))).await?;

    client.send_json(json!({"type": "JOIN_ROOM", "code": "QQQQ"})).await?;
    let err = client.recv_json().await?;
    assert_eq!(err, json!({"type": "ERROR", "message": "room not found"}));

    // Malformed payloads are dropped without closing the socket.
    client.send_text("{not json").await?;
    client.send_json(json!({"type": "DANCE"})).await?;
    create_room(&mut client, json!({"type": "CREATE_ROOM"})).await?;

    server.stop().await;
    Ok(())
}

#[actix_web::test]
async fn room_options_reach_match_found() -> TestResult {
    let server = TestServer::start_default().await?;
    let mut host = WebSocketClient::connect(&server.ws_url(&unique_player_id("host"))).await?;
    let mut guest = WebSocketClient::connect(&server.ws_url(&unique_player_id("guest"))).await?;

    let code = create_room(
        &mut host,
        json!({"type": "CREATE_ROOM", "rule": "caro", "total_time": 300, "increment": 2}),
    )
    .await?;
    guest.send_json(json!({"type": "JOIN_ROOM", "code": code.to_lowercase()})).await?;

    let found = guest.recv_type("MATCH_FOUND").await?;
    assert_eq!(found["rule"], "caro");
    assert_eq!(host.recv_type("MATCH_FOUND").await?["rule"], "caro");

    server.stop().await;
    Ok(())
}
