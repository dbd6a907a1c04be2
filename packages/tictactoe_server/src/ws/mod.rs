//! Game WebSocket
//!
//! One socket per player. Each connection runs its own reader and writer and
//! talks to its session only through the session actor's handle.

pub(crate) mod dispatch;
mod handler;
mod protocol;

pub use handler::handle_game_ws;
pub use protocol::{
    ClientMessage, ProtocolError, ServerMessage, SessionStatus, decode_client, encode_server,
};
