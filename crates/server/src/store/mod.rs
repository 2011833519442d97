//! Persistence for game records and the move ledger.
//!
//! The referee is the only writer. Every accepted exchange lands through
//! [`GameStore::commit_exchange`], which applies the game row update and the
//! ledger rows together or not at all, and only if the game is still at the
//! ply the referee read.

pub mod memory;

use std::future::Future;

use chess_core::{GameResult, Side};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Tier;

pub use memory::MemoryGameStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The game moved on or finished since it was read.
    #[error("game {0} was modified concurrently")]
    Conflict(String),

    #[error("game {0} already exists")]
    Duplicate(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("injected store failure")]
    Injected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Active,
    Completed,
}

impl GameStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::Active => "active",
            GameStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(GameStatus::Active),
            "completed" => Some(GameStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: String,
    pub tier: Tier,
    pub start_fen: String,
    pub current_fen: String,
    /// SAN of every ply played, in order.
    pub pgn_history: Vec<String>,
    pub status: GameStatus,
    pub result: GameResult,
    /// Half-moves played so far. Doubles as the optimistic-concurrency token.
    pub ply: i32,
    pub created_at: DateTime<Utc>,
}

impl GameRecord {
    pub fn is_active(&self) -> bool {
        self.status == GameStatus::Active
    }
}

#[derive(Debug, Clone)]
pub struct NewGame {
    pub id: String,
    pub tier: Tier,
    pub start_fen: String,
}

/// One applied move. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveLedgerEntry {
    pub game_id: String,
    pub ply: i32,
    pub mover: Side,
    pub san: String,
    pub from: String,
    pub to: String,
    pub fen_before: String,
    pub fen_after: String,
}

/// New state for a game after one exchange.
#[derive(Debug, Clone)]
pub struct GameUpdate {
    pub current_fen: String,
    pub pgn_history: Vec<String>,
    pub status: GameStatus,
    pub result: GameResult,
    pub ply: i32,
}

pub trait GameStore: Send + Sync + 'static {
    fn create_game(
        &self,
        game: NewGame,
    ) -> impl Future<Output = Result<GameRecord, StoreError>> + Send;

    fn get_game(
        &self,
        game_id: &str,
    ) -> impl Future<Output = Result<Option<GameRecord>, StoreError>> + Send;

    /// Write `update` and append `moves` atomically, provided the game is
    /// still active at `expected_ply`. Otherwise [`StoreError::Conflict`]
    /// and nothing is written.
    fn commit_exchange(
        &self,
        game_id: &str,
        expected_ply: i32,
        update: GameUpdate,
        moves: Vec<MoveLedgerEntry>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn list_moves(
        &self,
        game_id: &str,
    ) -> impl Future<Output = Result<Vec<MoveLedgerEntry>, StoreError>> + Send;
}
