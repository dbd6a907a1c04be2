//! Tic-tac-toe game rules - pure board and session state machine
//!
//! This crate has no networking, async runtime or serialization format of its own.
//! It owns the rules: where a mark may go, whose turn it is, and when a game ends.
//!
//! # Example
//!
//! ```
//! use tictactoe::{ConnectionId, MoveOutcome, Outcome, Session, Symbol};
//!
//! let mut session = Session::new();
//! let alice = ConnectionId::new();
//! let bob = ConnectionId::new();
//!
//! assert_eq!(session.bind(alice).unwrap(), Symbol::X);
//! assert_eq!(session.bind(bob).unwrap(), Symbol::O);
//!
//! session.apply_move(alice, 0, 0).unwrap();
//! session.apply_move(bob, 1, 0).unwrap();
//! session.apply_move(alice, 0, 1).unwrap();
//! session.apply_move(bob, 1, 1).unwrap();
//!
//! match session.apply_move(alice, 0, 2).unwrap() {
//!     MoveOutcome::Finished { outcome, .. } => assert_eq!(outcome, Outcome::Win(Symbol::X)),
//!     MoveOutcome::Continue(_) => unreachable!(),
//! }
//! ```

mod board;
mod error;
mod session;

pub use board::{Board, Cell, Outcome, SIZE, Symbol};
pub use error::{GameError, JoinError};
pub use session::{ConnectionId, MoveOutcome, Phase, Placement, Session};
