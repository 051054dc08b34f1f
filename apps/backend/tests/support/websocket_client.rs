// WebSocket client utilities for testing

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::websocket::TestResult;

pub const RECV_TIMEOUT: Duration = Duration::from_secs(3);

/// WebSocket test client speaking the JSON envelope protocol.
pub struct WebSocketClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WebSocketClient {
    /// Connect to a WebSocket endpoint, retrying until success or timeout.
    pub async fn connect_retry(url: &str, timeout: Duration) -> TestResult<Self> {
        let start = tokio::time::Instant::now();
        loop {
            match connect_async(url).await {
                Ok((stream, _)) => return Ok(Self { stream }),
                Err(err) => {
                    if start.elapsed() >= timeout {
                        return Err(Box::new(err));
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            }
        }
    }

    pub async fn connect(url: &str) -> TestResult<Self> {
        Self::connect_retry(url, Duration::from_secs(1)).await
    }

    pub async fn send_json(&mut self, value: Value) -> TestResult {
        self.send_text(&value.to_string()).await
    }

    pub async fn send_text(&mut self, text: &str) -> TestResult {
        self.stream.send(Message::text(text)).await?;
        Ok(())
    }

    /// Next text frame as JSON; control frames are skipped.
    pub async fn recv_json_timeout(&mut self, timeout: Duration) -> TestResult<Value> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let frame = tokio::time::timeout_at(deadline, self.stream.next())
                .await
                .map_err(|_| "Timeout waiting for message")?;
            match frame {
                Some(Ok(Message::Text(text))) => return Ok(serde_json::from_str(&text)?),
                Some(Ok(Message::Close(_))) | None => return Err("connection closed".into()),
                Some(Ok(_)) => continue,
                Some(Err(err)) => return Err(Box::new(err)),
            }
        }
    }

    pub async fn recv_json(&mut self) -> TestResult<Value> {
        self.recv_json_timeout(RECV_TIMEOUT).await
    }

    /// Skips envelopes until one with `type == kind` arrives.
    pub async fn recv_type(&mut self, kind: &str) -> TestResult<Value> {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let msg = self.recv_json_timeout(remaining).await?;
            if msg["type"] == kind {
                return Ok(msg);
            }
        }
    }

    /// Asserts that no text frame arrives within `window`.
    pub async fn expect_silence(&mut self, window: Duration) -> TestResult {
        match self.recv_json_timeout(window).await {
            Ok(msg) => Err(format!("expected no message, got {msg}").into()),
            Err(_) => Ok(()),
        }
    }

    pub async fn close(&mut self) -> TestResult {
        self.stream.close(None).await?;
        Ok(())
    }
}
