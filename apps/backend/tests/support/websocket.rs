// WebSocket test utilities

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::{web, App, HttpServer};
use caro_backend::config::ServerConfig;
use caro_backend::infra::memory_store::MemoryStore;
use caro_backend::infra::state::build_state;
use caro_backend::routes;
use caro_backend::services::matchmaker::PendingPlayer;
use caro_backend::state::app_state::AppState;
use caro_backend::ws::hub::ConnectionCount;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// App state backed by an in-memory store the test can inspect.
pub async fn build_test_state(config: ServerConfig) -> TestResult<(AppState, Arc<MemoryStore>)> {
    let store = Arc::new(MemoryStore::new(config.default_rating));
    let state = build_state()
        .with_config(config)
        .with_store(store.clone())
        .build()
        .await?;
    Ok((state, store))
}

/// A running server on an ephemeral port.
pub struct TestServer {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub addr: SocketAddr,
    handle: ServerHandle,
    join: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub async fn start(config: ServerConfig) -> TestResult<Self> {
        let (state, store) = build_test_state(config).await?;
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        let data = web::Data::new(state.clone());

        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .configure(routes::configure)
        })
        .workers(2)
        .listen(listener)?
        .run();

        let handle = server.handle();
        let join = actix_web::rt::spawn(server);
        Ok(Self {
            state,
            store,
            addr,
            handle,
            join,
        })
    }

    pub async fn start_default() -> TestResult<Self> {
        Self::start(ServerConfig::default()).await
    }

    pub fn ws_url(&self, player_id: &str) -> String {
        format!("ws://{}/ws?id={}", self.addr, player_id)
    }

    pub async fn stop(self) {
        self.handle.stop(true).await;
        let _ = self.join.await;
    }

    pub async fn wait_for_connections(&self, expected: usize, timeout: Duration) -> TestResult {
        let start = tokio::time::Instant::now();
        loop {
            let count = self.state.hub.send(ConnectionCount).await?;
            if count == expected {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(format!(
                    "timeout waiting for connection count == {expected} (got {count})"
                )
                .into());
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Waits until the matchmaker's pending slot holds `expected`.
    pub async fn wait_for_pending(&self, expected: Option<&str>, timeout: Duration) -> TestResult {
        let start = tokio::time::Instant::now();
        loop {
            let pending = self.state.matchmaker.send(PendingPlayer).await?;
            if pending.as_deref() == expected {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(format!("timeout waiting for pending == {expected:?} (got {pending:?})").into());
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}
