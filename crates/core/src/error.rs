//! Error types for chess-coach-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The input could not be parsed as a position at all.
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    /// The input parsed, but describes a position that cannot arise in a game.
    #[error("Illegal position: {0}")]
    IllegalPosition(String),

    #[error("PGN parsing error: {0}")]
    Pgn(String),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
