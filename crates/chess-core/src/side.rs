//! Who is who in a jackpot match.
//!
//! The human always moves first (white) and the computer always replies
//! (black). Results are credited through [`Side`], not colors.

use serde::{Deserialize, Serialize};
use shakmaty::Color;

use crate::board::TerminalStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Human,
    #[serde(rename = "ai")]
    Computer,
}

impl Side {
    pub const fn color(self) -> Color {
        match self {
            Side::Human => Color::White,
            Side::Computer => Color::Black,
        }
    }

    pub const fn from_color(color: Color) -> Self {
        match color {
            Color::White => Side::Human,
            Color::Black => Side::Computer,
        }
    }

    pub const fn opponent(self) -> Self {
        match self {
            Side::Human => Side::Computer,
            Side::Computer => Side::Human,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Human => "human",
            Side::Computer => "ai",
        }
    }
}

/// Match result from the human's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    Active,
    Win,
    Loss,
    Draw,
}

impl GameResult {
    pub fn from_terminal(status: &TerminalStatus) -> Self {
        match status {
            TerminalStatus::Ongoing => GameResult::Active,
            TerminalStatus::Checkmate { winner } => match Side::from_color(*winner) {
                Side::Human => GameResult::Win,
                Side::Computer => GameResult::Loss,
            },
            TerminalStatus::Stalemate | TerminalStatus::Draw(_) => GameResult::Draw,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameResult::Active => "active",
            GameResult::Win => "win",
            GameResult::Loss => "loss",
            GameResult::Draw => "draw",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(GameResult::Active),
            "win" => Some(GameResult::Win),
            "loss" => Some(GameResult::Loss),
            "draw" => Some(GameResult::Draw),
            _ => None,
        }
    }

    /// PGN result token for a finished game.
    pub fn pgn_token(self) -> &'static str {
        match self {
            GameResult::Active => "*",
            GameResult::Win => "1-0",
            GameResult::Loss => "0-1",
            GameResult::Draw => "1/2-1/2",
        }
    }
}
