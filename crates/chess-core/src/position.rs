//! Live game position: the shakmaty board plus everything a game of record
//! needs on top of it (moves played so far, repetition history, notation).

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, MoveList, Position};

use crate::error::PositionError;

/// Halfmove clock value from which a fifty-move draw may be claimed.
pub const FIFTY_MOVE_PLIES: u32 = 100;

/// Occurrences of the same position that make a repetition draw claimable.
const REPETITION_CLAIM: usize = 3;

#[derive(Debug, Clone)]
pub struct GamePosition {
    chess: Chess,
    /// `None` for the standard starting position.
    initial_fen: Option<String>,
    /// Moves of record in UCI notation.
    moves: Vec<String>,
    /// Hash of every position reached, the current one last.
    history: Vec<Zobrist64>,
}

impl Default for GamePosition {
    fn default() -> Self {
        Self::new()
    }
}

impl GamePosition {
    /// Standard starting position.
    pub fn new() -> Self {
        Self::from_chess(Chess::default(), None)
    }

    /// Position from a FEN string. `startpos` (or an empty string) is the
    /// standard starting position, matching what Lichess sends as `initialFen`.
    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        let fen = fen.trim();
        if fen.is_empty() || fen == "startpos" {
            return Ok(Self::new());
        }

        let parsed: Fen = fen.parse().map_err(|e: shakmaty::fen::ParseFenError| {
            PositionError::InvalidFen {
                fen: fen.to_string(),
                reason: e.to_string(),
            }
        })?;
        let chess: Chess =
            parsed
                .into_position(CastlingMode::Standard)
                .map_err(|e| PositionError::InvalidFen {
                    fen: fen.to_string(),
                    reason: e.to_string(),
                })?;

        Ok(Self::from_chess(chess, Some(fen.to_string())))
    }

    fn from_chess(chess: Chess, initial_fen: Option<String>) -> Self {
        let history = vec![zobrist(&chess)];
        Self {
            chess,
            initial_fen,
            moves: Vec::new(),
            history,
        }
    }

    pub fn chess(&self) -> &Chess {
        &self.chess
    }

    pub fn turn(&self) -> Color {
        self.chess.turn()
    }

    pub fn legal_moves(&self) -> MoveList {
        self.chess.legal_moves()
    }

    /// Number of moves applied since the initial position.
    pub fn ply_count(&self) -> usize {
        self.moves.len()
    }

    pub fn moves_of_record(&self) -> &[String] {
        &self.moves
    }

    pub fn initial_fen(&self) -> Option<&str> {
        self.initial_fen.as_deref()
    }

    pub(crate) fn history(&self) -> &[Zobrist64] {
        &self.history
    }

    /// Resolve a UCI move string against the current position.
    pub fn parse_uci(&self, uci: &str) -> Result<Move, PositionError> {
        let parsed: UciMove = uci
            .parse()
            .map_err(|_| PositionError::InvalidUci(uci.to_string()))?;
        parsed
            .to_move(&self.chess)
            .map_err(|_| PositionError::IllegalMove {
                uci: uci.to_string(),
                ply: self.moves.len(),
            })
    }

    /// Apply a move given in UCI notation and return the resolved move.
    pub fn play_uci(&mut self, uci: &str) -> Result<Move, PositionError> {
        let mv = self.parse_uci(uci)?;
        self.push(&mv);
        Ok(mv)
    }

    pub fn play(&mut self, mv: &Move) -> Result<(), PositionError> {
        if !self.chess.is_legal(mv) {
            return Err(PositionError::IllegalMove {
                uci: self.to_uci(mv),
                ply: self.moves.len(),
            });
        }
        self.push(mv);
        Ok(())
    }

    fn push(&mut self, mv: &Move) {
        let uci = self.to_uci(mv);
        self.chess.play_unchecked(mv);
        self.moves.push(uci);
        self.history.push(zobrist(&self.chess));
    }

    pub fn to_uci(&self, mv: &Move) -> String {
        mv.to_uci(CastlingMode::Standard).to_string()
    }

    pub fn to_san(&self, mv: &Move) -> String {
        San::from_move(&self.chess, mv).to_string()
    }

    pub fn is_checkmate(&self) -> bool {
        self.chess.is_checkmate()
    }

    pub fn is_stalemate(&self) -> bool {
        self.chess.is_stalemate()
    }

    pub fn is_insufficient_material(&self) -> bool {
        self.chess.is_insufficient_material()
    }

    /// Fifty-move rule or threefold repetition of the current position.
    pub fn can_claim_draw(&self) -> bool {
        can_claim_draw(&self.chess, &self.history)
    }
}

pub(crate) fn zobrist(chess: &Chess) -> Zobrist64 {
    chess.zobrist_hash(EnPassantMode::Legal)
}

pub(crate) fn can_claim_draw(chess: &Chess, history: &[Zobrist64]) -> bool {
    chess.halfmoves() >= FIFTY_MOVE_PLIES || is_repeated(history, chess.halfmoves())
}

/// Whether the last entry of `history` has been reached often enough to claim
/// a draw. Only positions since the last capture or pawn move can repeat, and
/// only every other ply has the same side to move.
fn is_repeated(history: &[Zobrist64], halfmoves: u32) -> bool {
    let Some(current) = history.last() else {
        return false;
    };
    let occurrences = history
        .iter()
        .rev()
        .take(halfmoves as usize + 1)
        .step_by(2)
        .filter(|h| *h == current)
        .count();
    occurrences >= REPETITION_CLAIM
}
