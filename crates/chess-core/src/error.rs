use thiserror::Error;

#[derive(Error, Debug)]
pub enum PositionError {
    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("Unparsable UCI move: {0}")]
    InvalidUci(String),

    #[error("Illegal move {uci} in position {ply}")]
    IllegalMove { uci: String, ply: usize },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SearchError {
    /// Move enumeration was reached in a position with no legal moves.
    #[error("Search invariant violated: no legal moves after terminal checks at depth {depth}")]
    InvariantViolation { depth: u32 },
}
