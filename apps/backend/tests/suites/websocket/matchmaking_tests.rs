// Quick-match pairing, move relay and pending-slot cleanup.

use std::time::Duration;

use backend_test_support::unique_helpers::unique_player_id;
use serde_json::json;

use crate::support::{TestResult, TestServer, WebSocketClient};

const WAIT: Duration = Duration::from_secs(2);

#[actix_web::test]
async fn quick_match_pairs_and_relays_moves() -> TestResult {
    let server = TestServer::start_default().await?;
    let alice = unique_player_id("alice");
    let bob = unique_player_id("bob");
    let mut a = WebSocketClient::connect(&server.ws_url(&alice)).await?;
    let mut b = WebSocketClient::connect(&server.ws_url(&bob)).await?;
    server.wait_for_connections(2, WAIT).await?;

    a.send_json(json!({"type": "FIND_MATCH"})).await?;
    server.wait_for_pending(Some(&alice), WAIT).await?;
    b.send_json(json!({"type": "FIND_MATCH"})).await?;

    let found_a = a.recv_type("MATCH_FOUND").await?;
    let found_b = b.recv_type("MATCH_FOUND").await?;
    assert_eq!(found_a["color"], "X");
    assert_eq!(found_b["color"], "O");
    assert_eq!(found_a["rule"], "standard");
    server.wait_for_pending(None, WAIT).await?;

    a.send_json(json!({"type": "MOVE", "x": 7, "y": 7})).await?;
    for client in [&mut a, &mut b] {
        let made = client.recv_json().await?;
        assert_eq!(made, json!({"type": "MOVE_MADE", "x": 7, "y": 7}));
    }

    // Occupied cell: no message to anyone.
    b.send_json(json!({"type": "MOVE", "x": 7, "y": 7})).await?;
    a.expect_silence(Duration::from_millis(300)).await?;
    b.expect_silence(Duration::from_millis(100)).await?;

    // Out of turn: ignored as well.
    a.send_json(json!({"type": "MOVE", "x": 1, "y": 1})).await?;
    b.expect_silence(Duration::from_millis(300)).await?;

    a.close().await?;
    b.close().await?;
    server.stop().await;
    Ok(())
}

#[actix_web::test]
async fn waiting_player_disconnect_clears_queue() -> TestResult {
    let server = TestServer::start_default().await?;
    let carol = unique_player_id("carol");
    let mut c = WebSocketClient::connect(&server.ws_url(&carol)).await?;

    c.send_json(json!({"type": "FIND_MATCH"})).await?;
    server.wait_for_pending(Some(&carol), WAIT).await?;

    c.close().await?;
    server.wait_for_pending(None, WAIT).await?;
    server.wait_for_connections(0, WAIT).await?;

    server.stop().await;
    Ok(())
}
