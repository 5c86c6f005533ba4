//! One live game, driven by its state stream.
//!
//! The session owns the game's position. Moves reach the position only once
//! they are on record: opponent moves when the server lists them, own moves
//! once the server has accepted the submission. Every event's move list is
//! reconciled against the number of moves already applied, so duplicate or
//! overlapping events never apply a move twice.

use std::sync::Arc;

use chess_core::eval::to_pawns;
use chess_core::GamePosition;
use futures::StreamExt;
use shakmaty::Color;
use tracing::{debug, error, info, warn};

use crate::error::BotError;
use crate::events::{GameEvent, GameFull, GameState, GameStatus};
use crate::strategy::MoveSelector;
use crate::transport::{EventStream, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the game snapshot that names the players.
    AwaitingColorAssignment,
    ToMove,
    AwaitingOpponent,
    Finished(GameOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOutcome {
    pub status: GameStatus,
    /// `white` or `black`; absent for draws and aborted games.
    pub winner: Option<String>,
}

pub struct GameSession {
    game_id: String,
    user_id: String,
    color: Option<Color>,
    position: GamePosition,
    state: SessionState,
    transport: Arc<dyn Transport>,
    events: EventStream<GameEvent>,
    selector: Box<dyn MoveSelector>,
}

impl GameSession {
    /// Open the game's state stream and take the bot's color from its first
    /// snapshot, replaying any moves already on record.
    ///
    /// A failure here resigns the game, unless the bot turned out not to be
    /// one of its players.
    pub async fn start(
        game_id: impl Into<String>,
        user_id: impl Into<String>,
        transport: Arc<dyn Transport>,
        selector: Box<dyn MoveSelector>,
    ) -> Result<Self, BotError> {
        let game_id = game_id.into();
        let events = match transport.stream_game_state(&game_id).await {
            Ok(events) => events,
            Err(e) => {
                abandon(transport.as_ref(), &game_id, &e).await;
                return Err(e);
            }
        };
        let mut session = Self {
            game_id,
            user_id: user_id.into(),
            color: None,
            position: GamePosition::new(),
            state: SessionState::AwaitingColorAssignment,
            transport,
            events,
            selector,
        };
        if let Err(e) = session.assign_color().await {
            if !matches!(e, BotError::ColorAssignment { .. }) {
                abandon(session.transport.as_ref(), &session.game_id, &e).await;
            }
            return Err(e);
        }
        Ok(session)
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn position(&self) -> &GamePosition {
        &self.position
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Play the game to its end. On any error the game is resigned before the
    /// error is returned.
    pub async fn run(mut self) -> Result<GameOutcome, BotError> {
        let result = self.play().await;

        match &result {
            Ok(outcome) => info!(
                game_id = %self.game_id,
                status = ?outcome.status,
                winner = ?outcome.winner,
                "Game over"
            ),
            Err(e) => error!(game_id = %self.game_id, error = %e, "Session failed, resigning"),
        }
        if result.is_err() {
            resign(self.transport.as_ref(), &self.game_id).await;
        }

        self.selector.shutdown().await;
        result
    }

    async fn play(&mut self) -> Result<GameOutcome, BotError> {
        loop {
            match &self.state {
                SessionState::Finished(outcome) => return Ok(outcome.clone()),
                // `start` hands out sessions only once the color is known.
                SessionState::AwaitingColorAssignment => {
                    return Err(BotError::ColorAssignment {
                        game_id: self.game_id.clone(),
                        user_id: self.user_id.clone(),
                    })
                }
                SessionState::ToMove => {
                    self.perform_move().await?;
                    self.consume_confirmation().await?;
                }
                SessionState::AwaitingOpponent => {
                    let state = self.next_state().await?;
                    self.apply_state(&state)?;
                }
            }
        }
    }

    async fn assign_color(&mut self) -> Result<(), BotError> {
        let full = loop {
            match self.next_event().await? {
                GameEvent::GameFull(full) => break full,
                other => debug!(game_id = %self.game_id, ?other, "Skipping event before game snapshot"),
            }
        };

        let color = self.color_in(&full)?;
        self.color = Some(color);
        self.position = GamePosition::from_fen(&full.initial_fen)?;

        let opponent = match color {
            Color::White => &full.black,
            Color::Black => &full.white,
        };
        info!(
            game_id = %self.game_id,
            ?color,
            opponent = opponent.name.as_deref().unwrap_or("?"),
            selector = self.selector.name(),
            "Game session started"
        );

        self.apply_state(&full.state)
    }

    fn color_in(&self, full: &GameFull) -> Result<Color, BotError> {
        let me = Some(self.user_id.as_str());
        if full.white.id.as_deref() == me {
            Ok(Color::White)
        } else if full.black.id.as_deref() == me {
            Ok(Color::Black)
        } else {
            Err(BotError::ColorAssignment {
                game_id: self.game_id.clone(),
                user_id: self.user_id.clone(),
            })
        }
    }

    async fn next_event(&mut self) -> Result<GameEvent, BotError> {
        match self.events.next().await {
            Some(event) => event,
            None => Err(BotError::StreamClosed(self.game_id.clone())),
        }
    }

    /// Next event that carries a game state; chat lines and the like are skipped.
    async fn next_state(&mut self) -> Result<GameState, BotError> {
        loop {
            match self.next_event().await? {
                GameEvent::GameState(state) => return Ok(state),
                GameEvent::GameFull(full) => return Ok(full.state),
                GameEvent::Other => debug!(game_id = %self.game_id, "Skipping non-state event"),
            }
        }
    }

    fn apply_state(&mut self, state: &GameState) -> Result<(), BotError> {
        let moves = state.move_list();

        if !state.status.is_in_progress() {
            if let Err(e) = self.sync_moves(&moves) {
                warn!(game_id = %self.game_id, error = %e, "Final move list not applied");
            }
            self.state = SessionState::Finished(GameOutcome {
                status: state.status,
                winner: state.winner.clone(),
            });
            return Ok(());
        }

        self.sync_moves(&moves)?;
        self.state = if self.is_my_turn() {
            SessionState::ToMove
        } else {
            SessionState::AwaitingOpponent
        };
        Ok(())
    }

    /// Apply the moves of `moves` beyond those already on the local position.
    fn sync_moves(&mut self, moves: &[&str]) -> Result<(), BotError> {
        let applied = self.position.ply_count();
        if moves.len() < applied {
            return Err(BotError::Desync(format!(
                "game {} lists {} moves, {} already played",
                self.game_id,
                moves.len(),
                applied
            )));
        }
        for (ply, (listed, played)) in moves
            .iter()
            .zip(self.position.moves_of_record())
            .enumerate()
        {
            if *listed != played.as_str() {
                return Err(BotError::Desync(format!(
                    "game {} ply {} is {listed}, played {played}",
                    self.game_id,
                    ply + 1
                )));
            }
        }

        for uci in &moves[applied..] {
            let mv = self.position.parse_uci(uci)?;
            let san = self.position.to_san(&mv);
            self.position.play(&mv)?;
            info!(game_id = %self.game_id, ply = self.position.ply_count(), %san, "Move received");
        }
        Ok(())
    }

    fn is_my_turn(&self) -> bool {
        self.color == Some(self.position.turn())
    }

    async fn perform_move(&mut self) -> Result<(), BotError> {
        let selection = self.selector.select_move(&self.position).await?;
        if !self.position.legal_moves().contains(&selection.mv) {
            return Err(BotError::NoMove(format!(
                "{} chose illegal move {}",
                self.selector.name(),
                self.position.to_uci(&selection.mv)
            )));
        }

        let uci = self.position.to_uci(&selection.mv);
        let san = self.position.to_san(&selection.mv);
        match selection.score {
            Some(score) => info!(
                game_id = %self.game_id,
                %san,
                eval = %format!("{:.2}", to_pawns(score)),
                "Playing move"
            ),
            None => info!(game_id = %self.game_id, %san, "Playing move"),
        }

        self.transport.make_move(&self.game_id, &uci).await?;
        self.position.play(&selection.mv)?;
        self.state = SessionState::AwaitingOpponent;
        Ok(())
    }

    /// The server echoes every accepted move as a state event. Reconciling it
    /// through the applied-move count makes it a no-op unless the game ended.
    async fn consume_confirmation(&mut self) -> Result<(), BotError> {
        let state = self.next_state().await?;
        debug!(
            game_id = %self.game_id,
            listed = state.move_list().len(),
            "Move confirmation received"
        );
        self.apply_state(&state)
    }
}

/// Resign a game whose session could not be set up.
pub(crate) async fn abandon(transport: &dyn Transport, game_id: &str, cause: &BotError) {
    error!(game_id = %game_id, error = %cause, "Session start failed, resigning");
    resign(transport, game_id).await;
}

async fn resign(transport: &dyn Transport, game_id: &str) {
    if let Err(e) = transport.resign_game(game_id).await {
        warn!(game_id = %game_id, error = %e, "Failed to resign");
    }
}
