use serde::{Deserialize, Serialize};

use crate::domain::{GameRule, Position, Seat};

/// `winner` value sent when the remaining player wins by abandonment.
pub const WINNER_ABANDONED: &str = "OPPONENT_ABANDONED";
/// `winner` value sent for a drawn game.
pub const WINNER_DRAW: &str = "DRAW";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMsg {
    FindMatch,
    CreateRoom {
        #[serde(default)]
        rule: Option<GameRule>,
        /// Seconds in each seat's bank.
        #[serde(default)]
        total_time: Option<u64>,
        /// Seconds credited after every completed move.
        #[serde(default)]
        increment: Option<u64>,
        /// Per-move cap in seconds.
        #[serde(default)]
        move_time_limit: Option<u64>,
    },
    JoinRoom {
        code: String,
    },
    Move {
        x: i32,
        y: i32,
    },
    WinClaim,
    LeaveRoom,
    ChatMessage {
        text: String,
        #[serde(default)]
        room_id: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMsg {
    RoomCreated {
        code: String,
    },
    MatchFound {
        color: Seat,
        rule: GameRule,
    },
    GameSync {
        color: Seat,
        history: Vec<Position>,
        turn: Seat,
    },
    SpectatorJoined {
        history: Vec<Position>,
        player_x: Option<String>,
        player_o: Option<String>,
    },
    MoveMade {
        x: i32,
        y: i32,
    },
    GameOver {
        /// Seat label, `DRAW`, or `OPPONENT_ABANDONED`.
        winner: String,
        #[serde(rename = "winningLine")]
        winning_line: Option<Vec<Position>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    ChatMessage {
        text: String,
        sender: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
    },
    UpdateRank {
        elo: i32,
    },
    Error {
        message: String,
    },
}

impl ServerMsg {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMsg::Error {
            message: message.into(),
        }
    }

    pub fn move_made(pos: Position) -> Self {
        ServerMsg::MoveMade { x: pos.x, y: pos.y }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMsg::RoomCreated { .. } => "ROOM_CREATED",
            ServerMsg::MatchFound { .. } => "MATCH_FOUND",
            ServerMsg::GameSync { .. } => "GAME_SYNC",
            ServerMsg::SpectatorJoined { .. } => "SPECTATOR_JOINED",
            ServerMsg::MoveMade { .. } => "MOVE_MADE",
            ServerMsg::GameOver { .. } => "GAME_OVER",
            ServerMsg::ChatMessage { .. } => "CHAT_MESSAGE",
            ServerMsg::UpdateRank { .. } => "UPDATE_RANK",
            ServerMsg::Error { .. } => "ERROR",
        }
    }
}
