//! WebSocket Protocol Types
//!
//! JSON text frames carrying an externally tagged envelope: exactly one
//! top-level key names the message, e.g. `{"Move":{"row":1,"col":2}}`.
//! Unit messages are bare strings (`"Status"`, `"ServerShutdown"`).

use serde::{Deserialize, Serialize};
use tictactoe::{Cell, MoveOutcome, Phase, Placement, SIZE, Symbol};

/// Messages sent FROM the client TO the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Request to place the sender's symbol. Signed so that negative
    /// coordinates are reported as out of range rather than malformed.
    Move { row: i64, col: i64 },
    /// Ask for a board snapshot, answered only to the asker.
    Status,
}

/// Messages sent FROM the server TO the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// First message on every registered connection: the symbol it controls.
    Connect { player: Symbol },

    /// An accepted, non-final move, broadcast to both players.
    Move {
        row: usize,
        col: usize,
        /// Omitted when `protocol.announce_mover` is off; clients then infer
        /// the mover as "the symbol that is not mine".
        #[serde(default, skip_serializing_if = "Option::is_none")]
        player: Option<Symbol>,
    },

    /// A rejected request, sent only to the connection that made it.
    Error(String),

    /// The game ended. `winner` is `null` for a draw.
    ///
    /// A terminal move produces this message instead of a `Move` broadcast.
    /// With `announce_mover` off, `final_move` is never sent, so clients in
    /// that mode do not see the last mark placed. They render it by sending
    /// `Status`, which still works once the game is finished.
    GameOver {
        winner: Option<Symbol>,
        /// The move that ended the game; absent for a forfeit or when the
        /// mover is not announced.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        final_move: Option<Placement>,
    },

    /// Sent to the waiting player when the opponent binds and the game starts.
    PlayerJoined { player: Symbol },

    /// Reply to `ClientMessage::Status`.
    Status(SessionStatus),

    /// The server is going away; no further messages follow.
    ServerShutdown,
}

/// Point-in-time view of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub board: [[Cell; SIZE]; SIZE],
    pub turn: Symbol,
    pub phase: Phase,
    pub moves: usize,
}

impl ServerMessage {
    /// The single broadcast an accepted move produces.
    pub fn from_move(outcome: MoveOutcome, announce_mover: bool) -> Self {
        match outcome {
            MoveOutcome::Continue(placement) => ServerMessage::Move {
                row: placement.row,
                col: placement.col,
                player: announce_mover.then_some(placement.player),
            },
            MoveOutcome::Finished { placement, outcome } => ServerMessage::GameOver {
                winner: outcome.winner(),
                final_move: announce_mover.then_some(placement),
            },
        }
    }

    pub fn error(err: &impl std::fmt::Display) -> Self {
        ServerMessage::Error(err.to_string())
    }
}

/// Frame payload that is not any known client message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(String),
}

impl ProtocolError {
    pub fn error_code(&self) -> &str {
        match self {
            Self::Malformed(_) => "malformed_message",
        }
    }
}

pub fn decode_client(text: &str) -> Result<ClientMessage, ProtocolError> {
    serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

pub fn encode_server(msg: &ServerMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(msg)
}
