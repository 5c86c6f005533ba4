//! Board state and game-tree search for the Lichess bot.
//!
//! `position` adapts shakmaty to the bot's needs (moves of record, repetition
//! history, notation), `eval` scores a board by material and `search` picks a
//! move with negamax and alpha-beta pruning.

pub mod error;
pub mod eval;
pub mod position;
pub mod search;

pub use error::{PositionError, SearchError};
pub use position::GamePosition;
pub use search::{best_continuation, search, SearchResult, INFINITY, MATE_SCORE};
