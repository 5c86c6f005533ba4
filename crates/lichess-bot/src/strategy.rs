//! Move selection strategies, chosen once per session from configuration.

use async_trait::async_trait;
use chess_core::{best_continuation, search, GamePosition, MATE_SCORE};
use rand::seq::IndexedRandom;
use shakmaty::Move;
use tracing::{debug, info};

use crate::error::BotError;
use crate::stockfish::StockfishEngine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveStrategy {
    /// Negamax search to a fixed depth.
    Minimax { depth: u32 },
    /// External engine at a reduced skill level.
    Stockfish {
        path: String,
        skill_level: u8,
        movetime_ms: u64,
    },
    /// Uniformly random legal move.
    Random,
}

impl MoveStrategy {
    pub async fn build(&self) -> Result<Box<dyn MoveSelector>, BotError> {
        Ok(match self {
            MoveStrategy::Minimax { depth } => Box::new(SearchSelector::new(*depth)),
            MoveStrategy::Stockfish {
                path,
                skill_level,
                movetime_ms,
            } => {
                let engine = StockfishEngine::new(path, *skill_level).await?;
                info!(path = %path, skill_level, "Stockfish engine ready");
                Box::new(StockfishSelector {
                    engine,
                    movetime_ms: *movetime_ms,
                })
            }
            MoveStrategy::Random => Box::new(RandomSelector),
        })
    }
}

/// A chosen move with the selector's evaluation of it, if it has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub mv: Move,
    /// Centipawns from the mover's perspective.
    pub score: Option<i32>,
}

#[async_trait]
pub trait MoveSelector: Send {
    fn name(&self) -> &'static str;

    /// Pick a move for the side to move. Must not be called in a position
    /// without legal moves.
    async fn select_move(&mut self, position: &GamePosition) -> Result<Selection, BotError>;

    /// Release any resources held by the selector.
    async fn shutdown(&mut self) {}
}

pub struct SearchSelector {
    depth: u32,
}

impl SearchSelector {
    pub fn new(depth: u32) -> Self {
        Self { depth }
    }
}

#[async_trait]
impl MoveSelector for SearchSelector {
    fn name(&self) -> &'static str {
        "minimax"
    }

    async fn select_move(&mut self, position: &GamePosition) -> Result<Selection, BotError> {
        let snapshot = position.clone();
        let depth = self.depth;

        // The tree walk is CPU bound; keep it off the async workers.
        let result = tokio::task::spawn_blocking(move || {
            let result = search(&snapshot, depth)?;
            if result.best_move.is_none() && !snapshot.legal_moves().is_empty() {
                // Claimable draw nobody has claimed yet: the game goes on.
                return best_continuation(&snapshot, depth);
            }
            Ok(result)
        })
        .await??;

        debug!(depth, nodes = result.nodes, score = result.score, "Minimax search done");
        let mv = result
            .best_move
            .ok_or_else(|| BotError::NoMove("search found no legal move".into()))?;
        Ok(Selection {
            mv,
            score: Some(result.score),
        })
    }
}

pub struct StockfishSelector {
    engine: StockfishEngine,
    movetime_ms: u64,
}

#[async_trait]
impl MoveSelector for StockfishSelector {
    fn name(&self) -> &'static str {
        "stockfish"
    }

    async fn select_move(&mut self, position: &GamePosition) -> Result<Selection, BotError> {
        let reply = self.engine.best_move(position, self.movetime_ms).await?;
        let mv = position.parse_uci(&reply.best_move)?;
        let score = match (reply.cp, reply.mate) {
            (_, Some(mate)) => Some(MATE_SCORE * mate.signum()),
            (cp, None) => cp,
        };
        Ok(Selection { mv, score })
    }

    async fn shutdown(&mut self) {
        self.engine.quit().await;
    }
}

pub struct RandomSelector;

#[async_trait]
impl MoveSelector for RandomSelector {
    fn name(&self) -> &'static str {
        "random"
    }

    async fn select_move(&mut self, position: &GamePosition) -> Result<Selection, BotError> {
        let moves = position.legal_moves();
        let mv = {
            let mut rng = rand::rng();
            moves.choose(&mut rng).cloned()
        };
        let mv = mv.ok_or_else(|| BotError::NoMove("no legal moves".into()))?;
        Ok(Selection { mv, score: None })
    }
}
