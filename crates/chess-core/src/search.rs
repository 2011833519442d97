//! Iterative deepening minimax with alpha-beta pruning under a wall-clock
//! deadline.
//!
//! The computer (black) maximizes and the human (white) minimizes, so scores
//! read the same way as [`crate::eval`]. Every node checks the deadline; an
//! expired deadline unwinds the current depth as `None` and the result of
//! the last fully completed depth is kept.

use std::cmp::Reverse;
use std::time::{Duration, Instant};

use rand::prelude::IndexedRandom;
use rand::Rng;
use shakmaty::zobrist::Zobrist64;
use shakmaty::{Chess, Move, Position};

use crate::board::{draw_reason, position_key, BoardMove, Game};
use crate::eval::{piece_value, static_score, MATE_SCORE};
use crate::side::Side;

/// Iterative deepening stops here even with time left.
pub const MAX_DEPTH: u32 = 6;

const INFINITY: i32 = MATE_SCORE + 1_000;

/// Mate scores within this many plies of `MATE_SCORE` are forced mates.
const MATE_WINDOW: i32 = 256;

#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    pub deadline: Instant,
    pub max_depth: u32,
}

impl SearchLimits {
    pub fn new(deadline: Instant) -> Self {
        Self {
            deadline,
            max_depth: MAX_DEPTH,
        }
    }

    /// Deadline `budget` from now.
    pub fn with_budget(budget: Duration) -> Self {
        Self::new(Instant::now() + budget)
    }

    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth.clamp(1, MAX_DEPTH);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub mv: BoardMove,
    pub score: i32,
    /// 0 when no depth completed and the move is a random fallback.
    pub depth_reached: u32,
    pub nodes: u64,
}

pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE_SCORE - MATE_WINDOW
}

/// Pick a move for the side to move in `game`.
///
/// Returns `None` only when there is no legal move. Ties at the best score
/// of the deepest completed iteration are broken with `rng`.
pub fn search<R: Rng + ?Sized>(
    game: &Game,
    limits: SearchLimits,
    rng: &mut R,
) -> Option<SearchResult> {
    let mut root_moves: Vec<Move> = game.position().legal_moves().into_iter().collect();
    let fallback = root_moves.choose(rng)?.clone();
    order_moves(&mut root_moves);

    let mut searcher = Searcher {
        deadline: limits.deadline,
        nodes: 0,
        history: game.history().to_vec(),
    };

    let mut result = SearchResult {
        mv: to_board_move(&fallback),
        score: static_score(game.position()),
        depth_reached: 0,
        nodes: 0,
    };

    for depth in 1..=limits.max_depth.min(MAX_DEPTH) {
        let Some((score, best)) = searcher.root(game.position(), &root_moves, depth) else {
            break;
        };
        if let Some(mv) = best.choose(rng) {
            result.mv = to_board_move(mv);
            result.score = score;
            result.depth_reached = depth;
        }
        if is_mate_score(score) {
            break;
        }
    }

    result.nodes = searcher.nodes;
    Some(result)
}

fn to_board_move(mv: &Move) -> BoardMove {
    BoardMove::from_move(mv).unwrap_or(BoardMove {
        from: mv.to(),
        to: mv.to(),
        promotion: None,
    })
}

/// Captures first, most valuable victim by least valuable attacker, then
/// promotions. The sort is stable so quiet moves keep generation order.
fn order_moves(moves: &mut [Move]) {
    moves.sort_by_key(|mv| {
        let capture = mv
            .capture()
            .map(|victim| piece_value(victim) * 10 - piece_value(mv.role()) / 10)
            .unwrap_or(0);
        let promotion = mv.promotion().map(piece_value).unwrap_or(0);
        Reverse(capture + promotion)
    });
}

struct Searcher {
    deadline: Instant,
    nodes: u64,
    /// Position keys from the game start to the node being searched.
    history: Vec<Zobrist64>,
}

impl Searcher {
    fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Score every root move at `depth` and return the best score with all
    /// moves that reach it. `None` if the deadline hit first.
    fn root(&mut self, pos: &Chess, moves: &[Move], depth: u32) -> Option<(i32, Vec<Move>)> {
        let maximizing = pos.turn() == Side::Computer.color();
        let mut best_score = if maximizing { -INFINITY } else { INFINITY };
        let mut best_moves = Vec::new();

        for mv in moves {
            if self.expired() {
                return None;
            }
            // One point of slack keeps ties exact while still pruning
            // anything strictly worse.
            let (alpha, beta) = if maximizing {
                (best_score - 1, INFINITY)
            } else {
                (-INFINITY, best_score + 1)
            };
            let score = self.child(pos, mv, depth - 1, alpha, beta, 1)?;

            let better = if maximizing {
                score > best_score
            } else {
                score < best_score
            };
            if better {
                best_score = score;
                best_moves.clear();
                best_moves.push(mv.clone());
            } else if score == best_score {
                best_moves.push(mv.clone());
            }
        }

        Some((best_score, best_moves))
    }

    fn child(
        &mut self,
        pos: &Chess,
        mv: &Move,
        depth: u32,
        alpha: i32,
        beta: i32,
        ply: i32,
    ) -> Option<i32> {
        let mut next = pos.clone();
        next.play_unchecked(mv.clone());
        self.history.push(position_key(&next));
        let score = self.alphabeta(&next, depth, alpha, beta, ply);
        self.history.pop();
        score
    }

    fn alphabeta(
        &mut self,
        pos: &Chess,
        depth: u32,
        mut alpha: i32,
        mut beta: i32,
        ply: i32,
    ) -> Option<i32> {
        if self.expired() {
            return None;
        }
        self.nodes += 1;

        let computer = Side::Computer.color();
        let mut moves: Vec<Move> = pos.legal_moves().into_iter().collect();
        if moves.is_empty() {
            if !pos.is_check() {
                return Some(0);
            }
            // Nearer mates score further from zero.
            let mate = MATE_SCORE - ply;
            return Some(if pos.turn() == computer { -mate } else { mate });
        }
        if draw_reason(pos, &self.history).is_some() {
            return Some(0);
        }
        if depth == 0 {
            return Some(static_score(pos));
        }

        order_moves(&mut moves);

        if pos.turn() == computer {
            let mut best = -INFINITY;
            for mv in &moves {
                let score = self.child(pos, mv, depth - 1, alpha, beta, ply + 1)?;
                best = best.max(score);
                alpha = alpha.max(best);
                if alpha >= beta {
                    break;
                }
            }
            Some(best)
        } else {
            let mut best = INFINITY;
            for mv in &moves {
                let score = self.child(pos, mv, depth - 1, alpha, beta, ply + 1)?;
                best = best.min(score);
                beta = beta.min(best);
                if alpha >= beta {
                    break;
                }
            }
            Some(best)
        }
    }
}
