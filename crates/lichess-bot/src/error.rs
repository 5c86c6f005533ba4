//! Bot error types

use chess_core::{PositionError, SearchError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Account {user_id} is playing neither side of game {game_id}")]
    ColorAssignment { game_id: String, user_id: String },

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Position error: {0}")]
    Position(#[from] PositionError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stockfish error: {0}")]
    Stockfish(String),

    #[error("Game stream for {0} closed before the game finished")]
    StreamClosed(String),

    #[error("Move list out of sync with local position: {0}")]
    Desync(String),

    #[error("No move available: {0}")]
    NoMove(String),

    #[error("Search task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
