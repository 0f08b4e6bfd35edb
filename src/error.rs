use std::io;

use thiserror::Error;

use crate::board::Point;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("a {size}x{size} board cannot hold {mines} mines")]
    InvalidConfiguration { size: usize, mines: usize },
    #[error("{0} is off the board")]
    OutOfBounds(Point),
    #[error("{0} is flagged, unflag it before revealing")]
    IllegalMove(Point),
    #[error("the game is already over")]
    GameOver,
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed data: {0}")]
    Format(#[from] serde_json::Error),
    #[error("corrupt save: {0}")]
    CorruptSave(String),
}

impl GameError {
    /// Errors the interactive loop reports and then keeps going.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GameError::OutOfBounds(_) | GameError::IllegalMove(_) | GameError::GameOver
        )
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
