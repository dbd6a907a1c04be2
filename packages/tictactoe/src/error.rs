//! Error types for board and session operations.

/// Reasons a move is rejected. The session is never mutated when one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("move ({row}, {col}) is outside the 3x3 board")]
    OutOfRange { row: i64, col: i64 },

    #[error("cell ({row}, {col}) is already occupied")]
    CellOccupied { row: usize, col: usize },

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("the game is not in progress")]
    GameNotInProgress,
}

impl GameError {
    pub fn error_code(&self) -> &str {
        match self {
            Self::OutOfRange { .. } => "out_of_range",
            Self::CellOccupied { .. } => "cell_occupied",
            Self::NotYourTurn => "not_your_turn",
            Self::GameNotInProgress => "game_not_in_progress",
        }
    }
}

/// Reasons a connection cannot be bound to a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("session already has two players")]
    Full,

    #[error("connection is already bound to this session")]
    AlreadyBound,

    #[error("session has finished")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(GameError::NotYourTurn.error_code(), "not_your_turn");
        assert_eq!(
            GameError::GameNotInProgress.error_code(),
            "game_not_in_progress"
        );
        assert_eq!(
            GameError::OutOfRange { row: 3, col: 0 }.error_code(),
            "out_of_range"
        );
        assert_eq!(
            GameError::CellOccupied { row: 1, col: 1 }.error_code(),
            "cell_occupied"
        );
    }

    #[test]
    fn messages_are_human_readable() {
        assert_eq!(
            GameError::OutOfRange { row: -1, col: 2 }.to_string(),
            "move (-1, 2) is outside the 3x3 board"
        );
        assert_eq!(
            GameError::CellOccupied { row: 0, col: 2 }.to_string(),
            "cell (0, 2) is already occupied"
        );
        assert_eq!(JoinError::Full.to_string(), "session already has two players");
    }
}
