#![allow(dead_code)]

pub mod websocket;
pub mod websocket_client;

pub use websocket::{TestResult, TestServer};
pub use websocket_client::WebSocketClient;
