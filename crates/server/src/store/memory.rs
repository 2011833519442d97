use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chess_core::GameResult;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{GameRecord, GameStatus, GameStore, GameUpdate, MoveLedgerEntry, NewGame, StoreError};

#[derive(Default)]
struct Inner {
    games: HashMap<String, GameRecord>,
    moves: HashMap<String, Vec<MoveLedgerEntry>>,
}

/// Process-local store with the same commit semantics as Postgres. Used when
/// no database is configured and in tests.
#[derive(Default)]
pub struct MemoryGameStore {
    inner: Mutex<Inner>,
    fail_next_commit: AtomicBool,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `commit_exchange` fail as if the database went away.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }
}

impl GameStore for MemoryGameStore {
    async fn create_game(&self, game: NewGame) -> Result<GameRecord, StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.games.contains_key(&game.id) {
            return Err(StoreError::Duplicate(game.id));
        }
        let record = GameRecord {
            id: game.id.clone(),
            tier: game.tier,
            current_fen: game.start_fen.clone(),
            start_fen: game.start_fen,
            pgn_history: Vec::new(),
            status: GameStatus::Active,
            result: GameResult::Active,
            ply: 0,
            created_at: Utc::now(),
        };
        inner.games.insert(game.id.clone(), record.clone());
        inner.moves.insert(game.id, Vec::new());
        Ok(record)
    }

    async fn get_game(&self, game_id: &str) -> Result<Option<GameRecord>, StoreError> {
        Ok(self.inner.lock().await.games.get(game_id).cloned())
    }

    async fn commit_exchange(
        &self,
        game_id: &str,
        expected_ply: i32,
        update: GameUpdate,
        moves: Vec<MoveLedgerEntry>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;

        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Injected);
        }

        let current = inner
            .games
            .get(game_id)
            .ok_or_else(|| StoreError::Conflict(game_id.to_string()))?;
        if current.ply != expected_ply || !current.is_active() {
            return Err(StoreError::Conflict(game_id.to_string()));
        }

        let ledger = inner.moves.get(game_id).map(Vec::as_slice).unwrap_or_default();
        let clashes = moves
            .iter()
            .any(|m| ledger.iter().any(|existing| existing.ply == m.ply));
        if clashes {
            return Err(StoreError::Conflict(game_id.to_string()));
        }

        // All checks passed; nothing below can fail.
        if let Some(record) = inner.games.get_mut(game_id) {
            record.current_fen = update.current_fen;
            record.pgn_history = update.pgn_history;
            record.status = update.status;
            record.result = update.result;
            record.ply = update.ply;
        }
        inner.moves.entry(game_id.to_string()).or_default().extend(moves);
        Ok(())
    }

    async fn list_moves(&self, game_id: &str) -> Result<Vec<MoveLedgerEntry>, StoreError> {
        let inner = self.inner.lock().await;
        let mut moves = inner.moves.get(game_id).cloned().unwrap_or_default();
        moves.sort_by_key(|m| m.ply);
        Ok(moves)
    }
}
