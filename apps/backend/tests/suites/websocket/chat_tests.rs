// Room-scoped and global chat delivery.

use std::time::Duration;

use backend_test_support::unique_helpers::unique_player_id;
use serde_json::json;

use crate::support::{TestResult, TestServer, WebSocketClient};

#[actix_web::test]
async fn room_chat_stays_in_its_room() -> TestResult {
    let server = TestServer::start_default().await?;
    let host_id = unique_player_id("host");
    let mut host = WebSocketClient::connect(&server.ws_url(&host_id)).await?;
    let mut guest = WebSocketClient::connect(&server.ws_url(&unique_player_id("guest"))).await?;
    let mut other = WebSocketClient::connect(&server.ws_url(&unique_player_id("other"))).await?;

    host.send_json(json!({"type": "CREATE_ROOM"})).await?;
    let code = host.recv_type("ROOM_CREATED").await?["code"].clone();
    guest.send_json(json!({"type": "JOIN_ROOM", "code": code})).await?;
    guest.recv_type("MATCH_FOUND").await?;
    other.send_json(json!({"type": "CREATE_ROOM"})).await?;
    other.recv_type("ROOM_CREATED").await?;

    host.send_json(json!({
        "type": "CHAT_MESSAGE",
        "text": "gl hf",
        "room_id": code,
        "sender": "mallory",
    }))
    .await?;

    let chat = guest.recv_type("CHAT_MESSAGE").await?;
    assert_eq!(chat["text"], "gl hf");
    assert_eq!(chat["sender"], host_id.as_str());
    assert_eq!(chat["room_id"], code);
    other.expect_silence(Duration::from_millis(300)).await?;

    server.stop().await;
    Ok(())
}

#[actix_web::test]
async fn chat_without_room_reaches_everyone() -> TestResult {
    let server = TestServer::start_default().await?;
    let sender_id = unique_player_id("sender");
    let mut sender = WebSocketClient::connect(&server.ws_url(&sender_id)).await?;
    let mut listener = WebSocketClient::connect(&server.ws_url(&unique_player_id("l"))).await?;
    server.wait_for_connections(2, Duration::from_secs(2)).await?;

    sender
        .send_json(json!({"type": "CHAT_MESSAGE", "text": "anyone?"}))
        .await?;

    for client in [&mut sender, &mut listener] {
        let chat = client.recv_type("CHAT_MESSAGE").await?;
        assert_eq!(chat, json!({"type": "CHAT_MESSAGE", "text": "anyone?", "sender": sender_id}));
    }

    server.stop().await;
    Ok(())
}

#[actix_web::test]
async fn chat_to_unknown_room_is_an_error() -> TestResult {
    let server = TestServer::start_default().await?;
    let mut client = WebSocketClient::connect(&server.ws_url(&unique_player_id("p"))).await?;

    client
        .send_json(json!({"type": "CHAT_MESSAGE", "text": "hi", "room_id": "NOPE"}))
        .await?;
    assert_eq!(client.recv_json().await?["message"], "room not found");

    server.stop().await;
    Ok(())
}
