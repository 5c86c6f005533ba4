//! Boundary between the bot and the game server.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::BotError;
use crate::events::{GameEvent, IncomingEvent};

/// Lazy, possibly unbounded sequence of server events.
pub type EventStream<T> = Pin<Box<dyn Stream<Item = Result<T, BotError>> + Send>>;

/// Operations the bot needs from the game server.
///
/// Submissions are fire-and-forget: their effect is observed on the
/// corresponding event stream.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Unique id of the bot account.
    async fn account_id(&self) -> Result<String, BotError>;

    /// Challenges and game starts addressed to the bot account.
    async fn stream_incoming_events(&self) -> Result<EventStream<IncomingEvent>, BotError>;

    async fn accept_challenge(&self, challenge_id: &str) -> Result<(), BotError>;

    /// State updates of one game, starting with a full snapshot.
    async fn stream_game_state(&self, game_id: &str) -> Result<EventStream<GameEvent>, BotError>;

    async fn make_move(&self, game_id: &str, uci: &str) -> Result<(), BotError>;

    async fn resign_game(&self, game_id: &str) -> Result<(), BotError>;
}
