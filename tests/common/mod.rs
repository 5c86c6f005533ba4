//! In-memory stand-in for the Lichess Bot API, scripted per game.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::StreamExt;

use chess_core::GamePosition;
use lichess_bot::error::BotError;
use lichess_bot::events::{GameEvent, GameFull, GameState, GameStatus, IncomingEvent, Player};
use lichess_bot::strategy::{MoveSelector, Selection};
use lichess_bot::transport::{EventStream, Transport};

pub const BOT_ID: &str = "minimaxbot";
pub const OPPONENT_ID: &str = "someone";

type Sender = UnboundedSender<Result<GameEvent, BotError>>;

// ---------------------------------------------------------------------------
// Event builders
// ---------------------------------------------------------------------------

pub fn player(id: &str) -> Player {
    Player {
        id: Some(id.to_string()),
        name: Some(id.to_string()),
    }
}

pub fn state(moves: &str, status: GameStatus) -> GameState {
    GameState {
        moves: moves.to_string(),
        status,
        winner: None,
    }
}

pub fn game_full(game_id: &str, white: &str, black: &str, moves: &str) -> GameEvent {
    GameEvent::GameFull(GameFull {
        id: game_id.to_string(),
        white: player(white),
        black: player(black),
        initial_fen: "startpos".to_string(),
        state: state(moves, GameStatus::Started),
    })
}

// ---------------------------------------------------------------------------
// Scripted game
// ---------------------------------------------------------------------------

/// How the fake server answers the bot's moves in one game.
pub struct FakeGame {
    /// Sent as soon as the game stream is opened.
    pub opening_events: Vec<GameEvent>,
    /// Moves of record so far.
    pub moves: Vec<String>,
    /// Opponent answers, one per bot move.
    pub replies: VecDeque<String>,
    /// Echo each accepted bot move twice.
    pub duplicate_echo: bool,
    /// Once replies run out: end the game with this status, or close the
    /// stream when `None`.
    pub final_status: Option<GameStatus>,
    /// Reject every submitted move.
    pub reject_moves: bool,
    sender: Option<Sender>,
}

impl FakeGame {
    pub fn new(opening_events: Vec<GameEvent>, initial_moves: &[&str]) -> Self {
        Self {
            opening_events,
            moves: initial_moves.iter().map(|m| m.to_string()).collect(),
            replies: VecDeque::new(),
            duplicate_echo: false,
            final_status: Some(GameStatus::Resign),
            reject_moves: false,
            sender: None,
        }
    }

    pub fn with_replies(mut self, replies: &[&str]) -> Self {
        self.replies = replies.iter().map(|m| m.to_string()).collect();
        self
    }

    fn send(&self, event: GameEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.unbounded_send(Ok(event));
        }
    }

    fn send_state(&self, status: GameStatus) {
        self.send(GameEvent::GameState(state(&self.moves.join(" "), status)));
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ScriptedTransport {
    games: Mutex<HashMap<String, FakeGame>>,
    incoming: Mutex<Vec<IncomingEvent>>,
    pub submitted: Mutex<Vec<(String, String)>>,
    pub resigned: Mutex<Vec<String>>,
    pub accepted: Mutex<Vec<String>>,
    pub streams_opened: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_game(&self, game_id: &str, game: FakeGame) {
        self.games.lock().unwrap().insert(game_id.to_string(), game);
    }

    pub fn set_incoming(&self, events: Vec<IncomingEvent>) {
        *self.incoming.lock().unwrap() = events;
    }

    pub fn submitted_moves(&self, game_id: &str) -> Vec<String> {
        self.submitted
            .lock()
            .unwrap()
            .iter()
            .filter(|(g, _)| g == game_id)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn resigned(&self) -> Vec<String> {
        self.resigned.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn account_id(&self) -> Result<String, BotError> {
        Ok(BOT_ID.to_string())
    }

    async fn stream_incoming_events(&self) -> Result<EventStream<IncomingEvent>, BotError> {
        let events: Vec<Result<IncomingEvent, BotError>> = self
            .incoming
            .lock()
            .unwrap()
            .drain(..)
            .map(Ok)
            .collect();
        Ok(futures::stream::iter(events).boxed())
    }

    async fn accept_challenge(&self, challenge_id: &str) -> Result<(), BotError> {
        self.accepted.lock().unwrap().push(challenge_id.to_string());
        Ok(())
    }

    async fn stream_game_state(&self, game_id: &str) -> Result<EventStream<GameEvent>, BotError> {
        self.streams_opened.lock().unwrap().push(game_id.to_string());
        let mut games = self.games.lock().unwrap();
        let game = games
            .get_mut(game_id)
            .ok_or_else(|| BotError::Transport(format!("unknown game {game_id}")))?;

        let (sender, receiver) = unbounded();
        for event in game.opening_events.drain(..) {
            let _ = sender.unbounded_send(Ok(event));
        }
        game.sender = Some(sender);
        Ok(receiver.boxed())
    }

    async fn make_move(&self, game_id: &str, uci: &str) -> Result<(), BotError> {
        let mut games = self.games.lock().unwrap();
        let game = games
            .get_mut(game_id)
            .ok_or_else(|| BotError::Transport(format!("unknown game {game_id}")))?;
        if game.reject_moves {
            return Err(BotError::Transport("HTTP 400 on move".into()));
        }
        self.submitted
            .lock()
            .unwrap()
            .push((game_id.to_string(), uci.to_string()));

        game.moves.push(uci.to_string());
        game.send_state(GameStatus::Started);
        if game.duplicate_echo {
            game.send_state(GameStatus::Started);
        }

        match game.replies.pop_front() {
            Some(reply) => {
                game.send(GameEvent::Other);
                game.moves.push(reply);
                game.send_state(GameStatus::Started);
            }
            None => match game.final_status {
                Some(status) => game.send_state(status),
                None => game.sender = None,
            },
        }
        Ok(())
    }

    async fn resign_game(&self, game_id: &str) -> Result<(), BotError> {
        self.resigned.lock().unwrap().push(game_id.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// Plays the first legal move and records how many moves were on the
/// position each time it was asked.
#[derive(Default, Clone)]
pub struct RecordingSelector {
    pub seen_plies: Arc<Mutex<Vec<usize>>>,
    pub seen_moves: Arc<Mutex<Vec<Vec<String>>>>,
}

#[async_trait]
impl MoveSelector for RecordingSelector {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn select_move(&mut self, position: &GamePosition) -> Result<Selection, BotError> {
        self.seen_plies.lock().unwrap().push(position.ply_count());
        self.seen_moves
            .lock()
            .unwrap()
            .push(position.moves_of_record().to_vec());
        let mv = position
            .legal_moves()
            .first()
            .cloned()
            .ok_or_else(|| BotError::NoMove("no legal moves".into()))?;
        Ok(Selection { mv, score: Some(0) })
    }
}
