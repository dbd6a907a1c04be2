use tictactoe::{GameError, JoinError};

use crate::ws::ProtocolError;

/// Everything that can go wrong while handling one client message. Always
/// reported to the originating connection only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("session is no longer available")]
    SessionGone,
}

impl DispatchError {
    pub fn error_code(&self) -> &str {
        match self {
            Self::Game(e) => e.error_code(),
            Self::Protocol(e) => e.error_code(),
            Self::SessionGone => "session_gone",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("server is shutting down")]
    ShuttingDown,

    #[error("could not join session: {0}")]
    Join(#[from] JoinError),

    #[error("session is no longer available")]
    SessionGone,
}
