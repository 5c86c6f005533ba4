//! Static material evaluation.

use shakmaty::{Chess, Position, Role};

// Centipawns.
pub const PAWN_VALUE: i32 = 100;
pub const KNIGHT_VALUE: i32 = 300;
pub const BISHOP_VALUE: i32 = 325;
pub const ROOK_VALUE: i32 = 500;
pub const QUEEN_VALUE: i32 = 900;
pub const KING_VALUE: i32 = 1_000_000;

pub fn piece_value(role: Role) -> i32 {
    match role {
        Role::Pawn => PAWN_VALUE,
        Role::Knight => KNIGHT_VALUE,
        Role::Bishop => BISHOP_VALUE,
        Role::Rook => ROOK_VALUE,
        Role::Queen => QUEEN_VALUE,
        Role::King => KING_VALUE,
    }
}

/// Material balance from the perspective of the side to move.
pub fn evaluate(pos: &Chess) -> i32 {
    let us = pos.turn();
    let board = pos.board();
    let mut balance = 0i32;
    for sq in board.occupied() {
        if let Some(piece) = board.piece_at(sq) {
            let val = piece_value(piece.role);
            if piece.color == us {
                balance += val;
            } else {
                balance -= val;
            }
        }
    }
    balance
}

/// Centipawn score as pawns, for logging.
pub fn to_pawns(score: i32) -> f64 {
    f64::from(score) / 100.0
}
