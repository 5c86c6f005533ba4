//! Negamax search with alpha-beta pruning.
//!
//! Every node scores the position from the perspective of its side to move;
//! a parent negates its child's score. Boards are cloned per branch, and the
//! repetition history is pushed before descending and popped right after the
//! recursive call returns, before any cutoff decision is made.
//!
//! Mate scores shrink with the distance to the mate, so a faster mate always
//! outscores a slower one. A mate delivered by the root move scores exactly
//! [`MATE_SCORE`].

use shakmaty::zobrist::Zobrist64;
use shakmaty::{Chess, Move, Position};
use tracing::debug;

use crate::error::SearchError;
use crate::eval::evaluate;
use crate::position::{can_claim_draw, zobrist, GamePosition};

/// Score of a won position. Larger than any material balance.
pub const MATE_SCORE: i32 = 10_000_000;

/// Bound of the alpha-beta window, strictly outside every attainable score.
pub const INFINITY: i32 = MATE_SCORE + 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Score for the side to move, in centipawns.
    pub score: i32,
    /// `None` when the position is terminal or `depth` was zero.
    pub best_move: Option<Move>,
    /// Nodes visited.
    pub nodes: u64,
}

/// Search `position` to a fixed `depth` in plies.
pub fn search(position: &GamePosition, depth: u32) -> Result<SearchResult, SearchError> {
    let mut history = position.history().to_vec();
    let mut nodes = 0u64;
    let (score, best_move) = negamax(
        position.chess(),
        &mut history,
        depth,
        0,
        -INFINITY,
        INFINITY,
        &mut nodes,
    )?;
    debug!(depth, nodes, score, "Search finished");
    Ok(SearchResult {
        score,
        best_move,
        nodes,
    })
}

/// Search the moves of `position` without first checking whether the root
/// itself is a claimable draw.
///
/// Lichess does not end a game on threefold repetition or the fifty-move rule
/// until someone claims it, so a bot may still have to move in a position
/// where [`search`] reports a draw and no move.
pub fn best_continuation(
    position: &GamePosition,
    depth: u32,
) -> Result<SearchResult, SearchError> {
    let mut history = position.history().to_vec();
    let mut nodes = 1u64;
    let (score, best_move) = expand(
        position.chess(),
        &mut history,
        depth.max(1),
        0,
        -INFINITY,
        INFINITY,
        &mut nodes,
    )?;
    Ok(SearchResult {
        score,
        best_move,
        nodes,
    })
}

/// Score of the side to move when it is checkmated `ply` plies below the root.
fn mated_score(ply: u32) -> i32 {
    let distance = i32::try_from(ply.saturating_sub(1)).unwrap_or(i32::MAX);
    -MATE_SCORE.saturating_sub(distance).max(0)
}

fn negamax(
    pos: &Chess,
    history: &mut Vec<Zobrist64>,
    depth: u32,
    ply: u32,
    alpha: i32,
    beta: i32,
    nodes: &mut u64,
) -> Result<(i32, Option<Move>), SearchError> {
    *nodes += 1;

    // Terminal checks come before the depth check: a leaf without legal moves
    // must not be scored by material.
    if is_draw(pos, history) {
        return Ok((0, None));
    }
    if pos.is_checkmate() {
        return Ok((mated_score(ply), None));
    }
    if depth == 0 {
        return Ok((evaluate(pos), None));
    }

    expand(pos, history, depth, ply, alpha, beta, nodes)
}

fn expand(
    pos: &Chess,
    history: &mut Vec<Zobrist64>,
    depth: u32,
    ply: u32,
    mut alpha: i32,
    beta: i32,
    nodes: &mut u64,
) -> Result<(i32, Option<Move>), SearchError> {
    let moves = pos.legal_moves();
    if moves.is_empty() {
        return Err(SearchError::InvariantViolation { depth });
    }

    let mut best_score = -INFINITY;
    let mut best_move = None;

    for mv in moves {
        let mut child = pos.clone();
        child.play_unchecked(&mv);

        history.push(zobrist(&child));
        let child_result = negamax(&child, history, depth - 1, ply + 1, -beta, -alpha, nodes);
        history.pop();

        let score = -child_result?.0;
        if score > best_score {
            best_score = score;
            best_move = Some(mv);
            alpha = alpha.max(score);
        }
        if best_score >= beta {
            break;
        }
    }

    Ok((best_score, best_move))
}

fn is_draw(pos: &Chess, history: &[Zobrist64]) -> bool {
    can_claim_draw(pos, history) || pos.is_stalemate() || pos.is_insufficient_material()
}
