//! Static evaluation: material plus piece-square tables.
//!
//! Scores are from the computer's point of view (black): positive favours
//! the computer, negative favours the human.

use shakmaty::{Chess, Color, Position, Role, Square};

use crate::board::{Game, TerminalStatus};
use crate::side::Side;

/// Larger than any material swing the board can hold.
pub const MATE_SCORE: i32 = 1_000_000;

pub const fn piece_value(role: Role) -> i32 {
    match role {
        Role::Pawn => 100,
        Role::Knight => 320,
        Role::Bishop => 330,
        Role::Rook => 500,
        Role::Queen => 900,
        Role::King => 20_000,
    }
}

// Rows are ranks counted from the owner's back rank, columns are files a..h.
type Table = [[i32; 8]; 8];

const PAWN_TABLE: Table = [
    [0, 0, 0, 0, 0, 0, 0, 0],
    [5, 10, 10, -20, -20, 10, 10, 5],
    [5, -5, -10, 0, 0, -10, -5, 5],
    [0, 0, 0, 20, 20, 0, 0, 0],
    [5, 5, 10, 25, 25, 10, 5, 5],
    [10, 10, 20, 30, 30, 20, 10, 10],
    [50, 50, 50, 50, 50, 50, 50, 50],
    [0, 0, 0, 0, 0, 0, 0, 0],
];

const KNIGHT_TABLE: Table = [
    [-50, -40, -30, -30, -30, -30, -40, -50],
    [-40, -20, 0, 5, 5, 0, -20, -40],
    [-30, 5, 10, 15, 15, 10, 5, -30],
    [-30, 0, 15, 20, 20, 15, 0, -30],
    [-30, 5, 15, 20, 20, 15, 5, -30],
    [-30, 0, 10, 15, 15, 10, 0, -30],
    [-40, -20, 0, 0, 0, 0, -20, -40],
    [-50, -40, -30, -30, -30, -30, -40, -50],
];

const BISHOP_TABLE: Table = [
    [-20, -10, -10, -10, -10, -10, -10, -20],
    [-10, 5, 0, 0, 0, 0, 5, -10],
    [-10, 10, 10, 10, 10, 10, 10, -10],
    [-10, 0, 10, 10, 10, 10, 0, -10],
    [-10, 5, 5, 10, 10, 5, 5, -10],
    [-10, 0, 5, 10, 10, 5, 0, -10],
    [-10, 0, 0, 0, 0, 0, 0, -10],
    [-20, -10, -10, -10, -10, -10, -10, -20],
];

const ROOK_TABLE: Table = [
    [0, 0, 0, 5, 5, 0, 0, 0],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [5, 10, 10, 10, 10, 10, 10, 5],
    [0, 0, 0, 0, 0, 0, 0, 0],
];

const QUEEN_TABLE: Table = [
    [-20, -10, -10, -5, -5, -10, -10, -20],
    [-10, 0, 5, 0, 0, 0, 0, -10],
    [-10, 5, 5, 5, 5, 5, 0, -10],
    [0, 0, 5, 5, 5, 5, 0, -5],
    [-5, 0, 5, 5, 5, 5, 0, -5],
    [-10, 0, 5, 5, 5, 5, 0, -10],
    [-10, 0, 0, 0, 0, 0, 0, -10],
    [-20, -10, -10, -5, -5, -10, -10, -20],
];

const KING_TABLE: Table = [
    [20, 30, 10, 0, 0, 10, 30, 20],
    [20, 20, 0, 0, 0, 0, 20, 20],
    [-10, -20, -20, -20, -20, -20, -20, -10],
    [-20, -30, -30, -40, -40, -30, -30, -20],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
];

const fn table(role: Role) -> &'static Table {
    match role {
        Role::Pawn => &PAWN_TABLE,
        Role::Knight => &KNIGHT_TABLE,
        Role::Bishop => &BISHOP_TABLE,
        Role::Rook => &ROOK_TABLE,
        Role::Queen => &QUEEN_TABLE,
        Role::King => &KING_TABLE,
    }
}

/// Positional bonus for `role` of `color` on `sq`, oriented to that
/// color's forward direction.
pub fn square_bonus(role: Role, color: Color, sq: Square) -> i32 {
    let rank = sq.rank() as usize;
    let relative_rank = match color {
        Color::White => rank,
        Color::Black => 7 - rank,
    };
    table(role)[relative_rank][sq.file() as usize]
}

/// Material and position only; the caller is responsible for terminal
/// positions.
pub fn static_score(pos: &Chess) -> i32 {
    let board = pos.board();
    let computer = Side::Computer.color();
    let mut score = 0;
    for sq in board.occupied() {
        if let Some(piece) = board.piece_at(sq) {
            let value = piece_value(piece.role) + square_bonus(piece.role, piece.color, sq);
            if piece.color == computer {
                score += value;
            } else {
                score -= value;
            }
        }
    }
    score
}

/// Full evaluation: mates and draws short-circuit, everything else is
/// [`static_score`].
pub fn evaluate(game: &Game) -> i32 {
    match game.terminal_status() {
        TerminalStatus::Checkmate { winner } => match Side::from_color(winner) {
            Side::Computer => MATE_SCORE,
            Side::Human => -MATE_SCORE,
        },
        TerminalStatus::Stalemate | TerminalStatus::Draw(_) => 0,
        TerminalStatus::Ongoing => static_score(game.position()),
    }
}
