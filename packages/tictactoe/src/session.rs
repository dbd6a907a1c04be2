//! One game's authoritative state: two player slots, the board, the turn and
//! the lifecycle phase.
//!
//! Phases only move forward:
//! `WaitingForPlayers -> InProgress -> Finished`. Every rejected call leaves the
//! session exactly as it was; validation always runs before the board is replaced.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::board::{Board, Outcome, Symbol};
use crate::error::{GameError, JoinError};

/// Identity of one client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "outcome", rename_all = "snake_case")]
pub enum Phase {
    WaitingForPlayers,
    InProgress,
    /// Carries the evaluation at the moment the game ended.
    Finished(Outcome),
}

impl Phase {
    fn rank(&self) -> u8 {
        match self {
            Phase::WaitingForPlayers => 0,
            Phase::InProgress => 1,
            Phase::Finished(_) => 2,
        }
    }
}

/// An accepted mark on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub row: usize,
    pub col: usize,
    pub player: Symbol,
}

/// What an accepted move did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Continue(Placement),
    Finished {
        placement: Placement,
        outcome: Outcome,
    },
}

impl MoveOutcome {
    pub fn placement(&self) -> Placement {
        match self {
            MoveOutcome::Continue(placement) => *placement,
            MoveOutcome::Finished { placement, .. } => *placement,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    board: Board,
    /// Indexed by `Symbol::index`: X then O.
    players: [Option<ConnectionId>; 2],
    turn: Symbol,
    phase: Phase,
    moves_played: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            players: [None, None],
            turn: Symbol::X,
            phase: Phase::WaitingForPlayers,
            moves_played: 0,
        }
    }

    /// Bind a connection to the next free symbol. X is handed out first; binding
    /// O starts the game.
    pub fn bind(&mut self, connection: ConnectionId) -> Result<Symbol, JoinError> {
        if matches!(self.phase, Phase::Finished(_)) {
            return Err(JoinError::Closed);
        }
        if self.symbol_of(connection).is_some() {
            return Err(JoinError::AlreadyBound);
        }

        let symbol = [Symbol::X, Symbol::O]
            .into_iter()
            .find(|s| self.players[s.index()].is_none())
            .ok_or(JoinError::Full)?;
        self.players[symbol.index()] = Some(connection);

        if self.players.iter().all(Option::is_some) {
            self.advance(Phase::InProgress);
        }
        Ok(symbol)
    }

    /// Coordinates are signed as they arrive from clients; range is checked
    /// only after the phase and turn checks.
    pub fn apply_move(
        &mut self,
        connection: ConnectionId,
        row: i64,
        col: i64,
    ) -> Result<MoveOutcome, GameError> {
        if self.phase != Phase::InProgress {
            return Err(GameError::GameNotInProgress);
        }
        let player = match self.symbol_of(connection) {
            Some(symbol) if symbol == self.turn => symbol,
            _ => return Err(GameError::NotYourTurn),
        };
        let (Ok(row), Ok(col)) = (usize::try_from(row), usize::try_from(col)) else {
            return Err(GameError::OutOfRange { row, col });
        };
        let board = self.board.place(row, col, player)?;

        self.board = board;
        self.moves_played += 1;
        self.turn = player.other();

        let placement = Placement { row, col, player };
        let outcome = board.evaluate();
        if outcome.is_terminal() {
            self.advance(Phase::Finished(outcome));
            Ok(MoveOutcome::Finished { placement, outcome })
        } else {
            Ok(MoveOutcome::Continue(placement))
        }
    }

    /// End an in-progress game in favour of the opponent of `connection`.
    /// `None` if the game is not in progress or the connection is not a player.
    pub fn forfeit(&mut self, connection: ConnectionId) -> Option<Outcome> {
        if self.phase != Phase::InProgress {
            return None;
        }
        let loser = self.symbol_of(connection)?;
        let outcome = Outcome::Win(loser.other());
        self.advance(Phase::Finished(outcome));
        Some(outcome)
    }

    fn advance(&mut self, next: Phase) {
        debug_assert!(next.rank() > self.phase.rank(), "phase regression");
        self.phase = next;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn turn(&self) -> Symbol {
        self.turn
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn moves_played(&self) -> usize {
        self.moves_played
    }

    pub fn symbol_of(&self, connection: ConnectionId) -> Option<Symbol> {
        [Symbol::X, Symbol::O]
            .into_iter()
            .find(|s| self.players[s.index()] == Some(connection))
    }

    pub fn connection_of(&self, symbol: Symbol) -> Option<ConnectionId> {
        self.players[symbol.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> (Session, ConnectionId, ConnectionId) {
        let mut session = Session::new();
        let x = ConnectionId::new();
        let o = ConnectionId::new();
        assert_eq!(session.bind(x), Ok(Symbol::X));
        assert_eq!(session.bind(o), Ok(Symbol::O));
        (session, x, o)
    }

    #[test]
    fn test_bind_order_and_phase() {
        let mut session = Session::new();
        let x = ConnectionId::new();
        assert_eq!(session.bind(x), Ok(Symbol::X));
        assert_eq!(session.phase(), Phase::WaitingForPlayers);
        assert_eq!(session.bind(x), Err(JoinError::AlreadyBound));

        let o = ConnectionId::new();
        assert_eq!(session.bind(o), Ok(Symbol::O));
        assert_eq!(session.phase(), Phase::InProgress);
        assert_eq!(session.turn(), Symbol::X);

        assert_eq!(session.bind(ConnectionId::new()), Err(JoinError::Full));
        assert_eq!(session.connection_of(Symbol::X), Some(x));
        assert_eq!(session.connection_of(Symbol::O), Some(o));
    }

    #[test]
    fn test_no_moves_while_waiting() {
        let mut session = Session::new();
        let x = ConnectionId::new();
        session.bind(x).unwrap();

        assert_eq!(
            session.apply_move(x, 1, 1),
            Err(GameError::GameNotInProgress)
        );
        assert_eq!(session.board().occupied(), 0);
    }

    #[test]
    fn test_turns_alternate() {
        let (mut session, x, o) = started();

        let first = session.apply_move(x, 1, 1).unwrap();
        assert_eq!(
            first,
            MoveOutcome::Continue(Placement {
                row: 1,
                col: 1,
                player: Symbol::X
            })
        );
        assert_eq!(session.turn(), Symbol::O);

        // X again before O has moved
        assert_eq!(session.apply_move(x, 0, 0), Err(GameError::NotYourTurn));
        assert_eq!(session.moves_played(), 1);

        session.apply_move(o, 0, 0).unwrap();
        assert_eq!(session.turn(), Symbol::X);
        assert_eq!(session.moves_played(), 2);
    }

    #[test]
    fn test_stranger_cannot_move() {
        let (mut session, _, _) = started();
        assert_eq!(
            session.apply_move(ConnectionId::new(), 0, 0),
            Err(GameError::NotYourTurn)
        );
    }

    #[test]
    fn test_out_of_range_leaves_state_unchanged() {
        let (mut session, x, _) = started();
        let before = *session.board();

        assert_eq!(
            session.apply_move(x, 3, 0),
            Err(GameError::OutOfRange { row: 3, col: 0 })
        );
        assert_eq!(*session.board(), before);
        assert_eq!(session.turn(), Symbol::X);
        assert_eq!(session.moves_played(), 0);
    }

    #[test]
    fn test_occupied_cell_rejected() {
        let (mut session, x, o) = started();
        session.apply_move(x, 1, 1).unwrap();
        assert_eq!(
            session.apply_move(o, 1, 1),
            Err(GameError::CellOccupied { row: 1, col: 1 })
        );
        assert_eq!(session.turn(), Symbol::O);
    }

    #[test]
    fn test_top_row_win_finishes_session() {
        let (mut session, x, o) = started();
        session.apply_move(x, 0, 0).unwrap();
        session.apply_move(o, 1, 0).unwrap();
        session.apply_move(x, 0, 1).unwrap();
        session.apply_move(o, 1, 1).unwrap();
        let last = session.apply_move(x, 0, 2).unwrap();

        assert_eq!(
            last,
            MoveOutcome::Finished {
                placement: Placement {
                    row: 0,
                    col: 2,
                    player: Symbol::X
                },
                outcome: Outcome::Win(Symbol::X),
            }
        );
        assert_eq!(session.phase(), Phase::Finished(Outcome::Win(Symbol::X)));

        let before = *session.board();
        assert_eq!(
            session.apply_move(o, 2, 2),
            Err(GameError::GameNotInProgress)
        );
        assert_eq!(
            session.apply_move(x, 2, 2),
            Err(GameError::GameNotInProgress)
        );
        assert_eq!(*session.board(), before);
        assert_eq!(session.bind(ConnectionId::new()), Err(JoinError::Closed));
    }

    #[test]
    fn test_negative_coordinates_follow_check_order() {
        let mut waiting = Session::new();
        let lone = ConnectionId::new();
        waiting.bind(lone).unwrap();
        assert_eq!(
            waiting.apply_move(lone, -1, 0),
            Err(GameError::GameNotInProgress)
        );

        let (mut session, x, o) = started();
        assert_eq!(session.apply_move(o, -1, 0), Err(GameError::NotYourTurn));
        assert_eq!(
            session.apply_move(x, 0, -1),
            Err(GameError::OutOfRange { row: 0, col: -1 })
        );
        assert_eq!(session.moves_played(), 0);

        for (who, r, c) in [(x, 0, 0), (o, 1, 0), (x, 0, 1), (o, 1, 1), (x, 0, 2)] {
            session.apply_move(who, r, c).unwrap();
        }
        assert_eq!(
            session.apply_move(o, -1, 0),
            Err(GameError::GameNotInProgress)
        );
        assert_eq!(
            session.apply_move(x, i64::MIN, i64::MAX),
            Err(GameError::GameNotInProgress)
        );
    }

    #[test]
    fn test_draw_finishes_session() {
        let (mut session, x, o) = started();
        // X O X
        // X O O
        // O X X
        let moves = [
            (x, 0, 0),
            (o, 0, 1),
            (x, 0, 2),
            (o, 1, 1),
            (x, 1, 0),
            (o, 1, 2),
            (x, 2, 1),
            (o, 2, 0),
        ];
        for (who, r, c) in moves {
            assert!(matches!(
                session.apply_move(who, r, c),
                Ok(MoveOutcome::Continue(_))
            ));
        }
        let last = session.apply_move(x, 2, 2).unwrap();
        assert!(matches!(
            last,
            MoveOutcome::Finished {
                outcome: Outcome::Draw,
                ..
            }
        ));
        assert_eq!(session.phase(), Phase::Finished(Outcome::Draw));
        assert_eq!(session.moves_played(), 9);
    }

    #[test]
    fn test_forfeit() {
        let (mut session, x, o) = started();
        session.apply_move(x, 1, 1).unwrap();

        assert_eq!(session.forfeit(ConnectionId::new()), None);
        assert_eq!(session.forfeit(o), Some(Outcome::Win(Symbol::X)));
        assert_eq!(session.phase(), Phase::Finished(Outcome::Win(Symbol::X)));
        assert_eq!(session.forfeit(x), None);
    }

    #[test]
    fn test_forfeit_requires_game_in_progress() {
        let mut session = Session::new();
        let x = ConnectionId::new();
        session.bind(x).unwrap();
        assert_eq!(session.forfeit(x), None);
        assert_eq!(session.phase(), Phase::WaitingForPlayers);
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&Phase::Finished(Outcome::Win(Symbol::O))).unwrap();
        assert_eq!(json, r#"{"state":"finished","outcome":{"win":"O"}}"#);
        let json = serde_json::to_string(&Phase::InProgress).unwrap();
        assert_eq!(json, r#"{"state":"in_progress"}"#);
    }
}
