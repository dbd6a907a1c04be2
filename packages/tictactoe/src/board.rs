//! The 3x3 board value type and terminal-state evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GameError;

/// Board side length.
pub const SIZE: usize = 3;

/// Every line that wins when filled by one symbol: 3 rows, 3 columns, 2 diagonals.
const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

/// A player's mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    pub fn other(self) -> Symbol {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Symbol::X => 0,
            Symbol::O => 1,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::X => write!(f, "X"),
            Symbol::O => write!(f, "O"),
        }
    }
}

/// `None` is an empty cell.
pub type Cell = Option<Symbol>;

/// Result of scanning the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    InProgress,
    Win(Symbol),
    Draw,
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }

    /// The winning symbol, `None` for a draw or an unfinished game.
    pub fn winner(&self) -> Option<Symbol> {
        match self {
            Outcome::Win(symbol) => Some(*symbol),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [[Cell; SIZE]; SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new board with `symbol` at (`row`, `col`). `self` is left untouched.
    pub fn place(&self, row: usize, col: usize, symbol: Symbol) -> Result<Board, GameError> {
        if row >= SIZE || col >= SIZE {
            return Err(GameError::OutOfRange {
                row: i64::try_from(row).unwrap_or(i64::MAX),
                col: i64::try_from(col).unwrap_or(i64::MAX),
            });
        }
        if self.cells[row][col].is_some() {
            return Err(GameError::CellOccupied { row, col });
        }

        let mut next = *self;
        next.cells[row][col] = Some(symbol);
        Ok(next)
    }

    pub fn evaluate(&self) -> Outcome {
        for line in LINES {
            let [a, b, c] = line.map(|(r, col)| self.cells[r][col]);
            if let Some(symbol) = a {
                if b == Some(symbol) && c == Some(symbol) {
                    return Outcome::Win(symbol);
                }
            }
        }

        if self.is_full() {
            Outcome::Draw
        } else {
            Outcome::InProgress
        }
    }

    /// `None` when the coordinates are off the board.
    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn occupied(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.occupied() == SIZE * SIZE
    }

    pub fn rows(&self) -> [[Cell; SIZE]; SIZE] {
        self.cells
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for cell in row {
                match cell {
                    Some(symbol) => write!(f, "{symbol}")?,
                    None => write!(f, ".")?,
                }
            }
        }
        Ok(())
    }
}
