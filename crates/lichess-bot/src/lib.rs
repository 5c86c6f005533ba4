pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod lichess;
pub mod session;
pub mod stockfish;
pub mod strategy;
pub mod transport;
