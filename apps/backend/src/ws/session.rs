use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::extractors::player_identity::PlayerIdentity;
use crate::services::matchmaker::Dequeue;
use crate::state::app_state::AppState;
use crate::ws::connection::Connection;
use crate::ws::hub::{Register, Unregister};
use crate::ws::protocol::ServerMsg;
use crate::ws::router;

pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    identity: PlayerIdentity,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let (conn, outbound) = Connection::new(identity.0, app_state.config.outbound_capacity);
    let session = WsSession::new(conn, outbound, app_state);
    ws::start(session, &req, stream)
}

/// One socket: reads and routes inbound frames, drains the connection's outbound
/// queue, and probes the peer on a fixed interval.
pub struct WsSession {
    conn: Arc<Connection>,
    outbound: Option<mpsc::Receiver<ServerMsg>>,
    app_state: web::Data<AppState>,
    ping_interval: Duration,
    ping_timeout: Duration,
    last_heartbeat: Instant,
}

impl WsSession {
    fn new(
        conn: Arc<Connection>,
        outbound: mpsc::Receiver<ServerMsg>,
        app_state: web::Data<AppState>,
    ) -> Self {
        Self {
            ping_interval: app_state.config.ping_interval,
            ping_timeout: app_state.config.ping_timeout,
            conn,
            outbound: Some(outbound),
            app_state,
            last_heartbeat: Instant::now(),
        }
    }

    fn send_json(ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMsg) {
        match serde_json::to_string(msg) {
            Ok(payload) => ctx.text(payload),
            Err(err) => warn!(error = %err, "[WS SESSION] failed to serialize outbound message"),
        }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(self.ping_interval, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > actor.ping_timeout {
                warn!(
                    conn_id = %actor.conn.id(),
                    player_id = %actor.conn.player_id(),
                    "[WS SESSION] heartbeat timed out"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(
            conn_id = %self.conn.id(),
            player_id = %self.conn.player_id(),
            "[WS SESSION] started"
        );

        self.app_state.hub.do_send(Register {
            conn: self.conn.clone(),
        });
        if let Some(outbound) = self.outbound.take() {
            ctx.add_stream(ReceiverStream::new(outbound));
        }
        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        let conn_id = self.conn.id();
        self.app_state.hub.do_send(Unregister { conn_id });
        self.app_state.matchmaker.do_send(Dequeue { conn_id });
        router::disconnect(&self.app_state, &self.conn);
        info!(
            conn_id = %conn_id,
            player_id = %self.conn.player_id(),
            "[WS SESSION] stopped"
        );
    }
}

/// Outbound queue drain.
impl StreamHandler<ServerMsg> for WsSession {
    fn handle(&mut self, msg: ServerMsg, ctx: &mut Self::Context) {
        Self::send_json(ctx, &msg);
    }

    fn finished(&mut self, _ctx: &mut Self::Context) {}
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                if let Some(cmd) = router::parse(&self.conn, &text) {
                    router::dispatch(&self.app_state, &self.conn, cmd);
                }
            }
            Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {
                self.last_heartbeat = Instant::now();
            }
            Err(err) => {
                warn!(
                    conn_id = %self.conn.id(),
                    player_id = %self.conn.player_id(),
                    error = %err,
                    "[WS SESSION] protocol error"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                ctx.stop();
            }
        }
    }
}
