//! Listens for challenges and game starts and supervises one session task per
//! game.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use tokio::task::{AbortHandle, JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::error::BotError;
use crate::events::IncomingEvent;
use crate::session::{abandon, GameOutcome, GameSession};
use crate::strategy::MoveStrategy;
use crate::transport::Transport;

type SessionResult = (String, Result<GameOutcome, BotError>);

pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    strategy: MoveStrategy,
    accept_challenges: bool,
    user_id: String,
    sessions: JoinSet<SessionResult>,
    active: HashMap<String, AbortHandle>,
}

impl Dispatcher {
    pub async fn new(
        transport: Arc<dyn Transport>,
        strategy: MoveStrategy,
        accept_challenges: bool,
    ) -> Result<Self, BotError> {
        let user_id = transport.account_id().await?;
        info!(user_id = %user_id, "Logged in");
        Ok(Self {
            transport,
            strategy,
            accept_challenges,
            user_id,
            sessions: JoinSet::new(),
            active: HashMap::new(),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn active_games(&self) -> usize {
        self.active.len()
    }

    /// Handle incoming events until the stream ends, then wait for every
    /// running session to finish.
    pub async fn run(&mut self) -> Result<(), BotError> {
        let mut events = self.transport.stream_incoming_events().await?;
        info!("Listening for challenges");

        loop {
            tokio::select! {
                event = events.next() => match event {
                    Some(Ok(event)) => self.handle_event(event).await,
                    Some(Err(e)) => warn!(error = %e, "Unreadable incoming event"),
                    None => break,
                },
                Some(joined) = self.sessions.join_next(), if !self.sessions.is_empty() => {
                    self.reap(joined);
                }
            }
        }

        info!(active = self.sessions.len(), "Event stream closed, waiting for running games");
        while let Some(joined) = self.sessions.join_next().await {
            self.reap(joined);
        }
        Ok(())
    }

    async fn handle_event(&mut self, event: IncomingEvent) {
        debug!(?event, "Incoming event");
        match event {
            IncomingEvent::Challenge { challenge } => {
                if !self.accept_challenges {
                    info!(challenge_id = %challenge.id, "Ignoring challenge");
                    return;
                }
                info!(challenge_id = %challenge.id, "Accepting challenge");
                if let Err(e) = self.transport.accept_challenge(&challenge.id).await {
                    warn!(challenge_id = %challenge.id, error = %e, "Failed to accept challenge");
                }
            }
            IncomingEvent::GameStart { game } => self.spawn_session(game.id),
            IncomingEvent::GameFinish { game } => {
                debug!(game_id = %game.id, "Game finish notification");
            }
            IncomingEvent::Other => {}
        }
    }

    fn spawn_session(&mut self, game_id: String) {
        if self
            .active
            .get(&game_id)
            .is_some_and(|handle| !handle.is_finished())
        {
            debug!(game_id = %game_id, "Session already running");
            return;
        }

        let transport = self.transport.clone();
        let strategy = self.strategy.clone();
        let user_id = self.user_id.clone();
        let task_game_id = game_id.clone();

        let handle = self.sessions.spawn(async move {
            let result = run_session(&task_game_id, user_id, transport, &strategy).await;
            (task_game_id, result)
        });
        info!(game_id = %game_id, "Session spawned");
        self.active.insert(game_id, handle);
    }

    fn reap(&mut self, joined: Result<SessionResult, JoinError>) {
        match joined {
            Ok((game_id, Ok(outcome))) => {
                info!(game_id = %game_id, status = ?outcome.status, "Session complete");
            }
            Ok((game_id, Err(e))) => {
                error!(game_id = %game_id, error = %e, "Session failed");
            }
            Err(e) => error!(error = %e, "Session task panicked"),
        }
        self.active.retain(|_, handle| !handle.is_finished());
    }
}

/// Build the move selector, start the session and play the game out.
pub async fn run_session(
    game_id: &str,
    user_id: String,
    transport: Arc<dyn Transport>,
    strategy: &MoveStrategy,
) -> Result<GameOutcome, BotError> {
    let selector = match strategy.build().await {
        Ok(selector) => selector,
        Err(e) => {
            abandon(transport.as_ref(), game_id, &e).await;
            return Err(e);
        }
    };
    let session = GameSession::start(game_id, user_id, transport, selector).await?;
    session.run().await
}
