use std::collections::HashMap;
use std::sync::Arc;

use actix::prelude::*;
use tracing::{debug, info};
use uuid::Uuid;

use crate::ws::connection::Connection;
use crate::ws::protocol::ServerMsg;

#[derive(Message)]
#[rtype(result = "()")]
pub struct Register {
    pub conn: Arc<Connection>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Unregister {
    pub conn_id: Uuid,
}

/// Global fallback delivery to every registered connection.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct Broadcast {
    pub msg: ServerMsg,
}

#[derive(Message)]
#[rtype(result = "usize")]
pub struct ConnectionCount;

/// Registry of every live connection, mutated only from its own mailbox.
#[derive(Default)]
pub struct Hub {
    connections: HashMap<Uuid, Arc<Connection>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Actor for Hub {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!("[HUB] started");
    }
}

impl Handler<Register> for Hub {
    type Result = ();

    fn handle(&mut self, msg: Register, _ctx: &mut Self::Context) -> Self::Result {
        debug!(
            conn_id = %msg.conn.id(),
            player_id = %msg.conn.player_id(),
            "[HUB] connection registered"
        );
        self.connections.insert(msg.conn.id(), msg.conn);
    }
}

impl Handler<Unregister> for Hub {
    type Result = ();

    fn handle(&mut self, msg: Unregister, _ctx: &mut Self::Context) -> Self::Result {
        if self.connections.remove(&msg.conn_id).is_some() {
            debug!(conn_id = %msg.conn_id, "[HUB] connection unregistered");
        }
    }
}

impl Handler<Broadcast> for Hub {
    type Result = ();

    fn handle(&mut self, msg: Broadcast, _ctx: &mut Self::Context) -> Self::Result {
        let mut dropped = 0usize;
        for conn in self.connections.values() {
            if !conn.try_send(msg.msg.clone()) {
                dropped += 1;
            }
        }
        if dropped > 0 {
            debug!(dropped, kind = msg.msg.kind(), "[HUB] broadcast skipped busy connections");
        }
    }
}

impl Handler<ConnectionCount> for Hub {
    type Result = usize;

    fn handle(&mut self, _msg: ConnectionCount, _ctx: &mut Self::Context) -> Self::Result {
        self.connections.len()
    }
}
