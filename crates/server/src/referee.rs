//! The referee: sole owner of game state transitions.
//!
//! One call to [`Referee::submit_move`] is one exchange. The human move is
//! validated and applied, the computer replies under the tier's time budget
//! unless the game already ended, and the result is committed atomically
//! against the ply that was read. Nothing is written when any step fails.

use std::sync::{Arc, Mutex};

use chess_core::board::STARTING_FEN;
use chess_core::{pgn, search, BoardMove, Game, GameResult, PlayedMove, SearchLimits, Side};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::clients::CompletionHook;
use crate::config::{Tier, TierTable};
use crate::error::AppError;
use crate::store::{GameRecord, GameStatus, GameStore, GameUpdate, MoveLedgerEntry, NewGame};

/// Wire form of a move: `{ "from": "e2", "to": "e4", "promotion": "q" }`.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub promotion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutcome {
    pub fen: String,
    pub is_game_over: bool,
    pub result: GameResult,
    /// SAN of the computer's reply; `None` when the human move ended the game.
    pub ai_move: Option<String>,
    pub pgn: String,
}

pub struct Referee<S> {
    store: Arc<S>,
    tiers: TierTable,
    hook: Arc<dyn CompletionHook>,
    /// Seeds a fresh RNG for each search.
    rng: Mutex<StdRng>,
}

impl<S: GameStore> Referee<S> {
    pub fn new(
        store: Arc<S>,
        tiers: TierTable,
        hook: Arc<dyn CompletionHook>,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            store,
            tiers,
            hook,
            rng: Mutex::new(rng),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    /// Start a game from the standard position or from `fen`, which must
    /// be a live position with the human (white) to move.
    pub async fn create_game(&self, tier: Tier, fen: Option<&str>) -> Result<GameRecord, AppError> {
        let game = match fen.map(str::trim).filter(|f| !f.is_empty()) {
            Some(fen) => Game::from_fen(fen)?,
            None => Game::from_fen(STARTING_FEN)?,
        };
        if game.side_to_move() != Side::Human {
            return Err(AppError::BadRequest(
                "Games must start with white (the human) to move".into(),
            ));
        }
        if game.terminal_status().is_terminal() {
            return Err(AppError::BadRequest("Starting position is already decided".into()));
        }

        let record = self
            .store
            .create_game(NewGame {
                id: uuid::Uuid::new_v4().to_string(),
                tier,
                start_fen: game.fen(),
            })
            .await?;

        tracing::info!("Created {} game {}", record.tier, record.id);
        Ok(record)
    }

    pub async fn get_game(&self, game_id: &str) -> Result<GameRecord, AppError> {
        self.store
            .get_game(game_id)
            .await?
            .ok_or_else(|| AppError::GameNotFound(game_id.to_string()))
    }

    pub async fn list_moves(&self, game_id: &str) -> Result<Vec<MoveLedgerEntry>, AppError> {
        // 404 for unknown games rather than an empty ledger
        self.get_game(game_id).await?;
        Ok(self.store.list_moves(game_id).await?)
    }

    pub async fn submit_move(
        &self,
        game_id: &str,
        request: &MoveRequest,
    ) -> Result<MoveOutcome, AppError> {
        let record = self.get_game(game_id).await?;
        if !record.is_active() {
            return Err(AppError::GameNotActive(game_id.to_string()));
        }

        let game = restore(&record)?;
        if game.side_to_move() != Side::Human {
            return Err(AppError::Internal(format!(
                "game {game_id} is waiting on the computer"
            )));
        }

        let human_move = BoardMove::parse(
            &request.from,
            &request.to,
            request.promotion.as_deref(),
        )?;
        let (mut current, played) = game.apply(&human_move)?;

        let mut history = record.pgn_history.clone();
        let mut ledger = Vec::with_capacity(2);
        let mut ply = record.ply + 1;
        ledger.push(ledger_entry(
            game_id,
            ply,
            &played,
            record.current_fen.clone(),
            current.fen(),
        ));
        history.push(played.san);

        let mut ai_move = None;
        if !current.terminal_status().is_terminal() {
            let budget = self.tiers.get(record.tier).ai_budget();
            let limits = SearchLimits::with_budget(budget);
            let mut rng = self.search_rng();
            let position = current.clone();

            let found = tokio::task::spawn_blocking(move || search(&position, limits, &mut rng))
                .await
                .map_err(|e| AppError::Internal(format!("search task failed: {e}")))?
                .ok_or_else(|| {
                    AppError::Internal(format!("no reply found in live game {game_id}"))
                })?;
            tracing::debug!(
                "Game {game_id}: AI plays {} (depth {}, score {}, {} nodes)",
                found.mv,
                found.depth_reached,
                found.score,
                found.nodes
            );

            let (next, reply) = current
                .apply(&found.mv)
                .map_err(|e| AppError::Internal(format!("search returned {e}")))?;
            let fen_before = current.fen();
            current = next;

            ply += 1;
            ledger.push(ledger_entry(game_id, ply, &reply, fen_before, current.fen()));
            history.push(reply.san.clone());
            ai_move = Some(reply.san);
        }

        let result = GameResult::from_terminal(&current.terminal_status());
        let status = if result == GameResult::Active {
            GameStatus::Active
        } else {
            GameStatus::Completed
        };
        let fen = current.fen();
        let pgn = pgn::render(&record.start_fen, &history, result);

        self.store
            .commit_exchange(
                game_id,
                record.ply,
                GameUpdate {
                    current_fen: fen.clone(),
                    pgn_history: history,
                    status,
                    result,
                    ply,
                },
                ledger,
            )
            .await?;

        if status == GameStatus::Completed {
            tracing::info!("Game {game_id} completed: {}", result.as_str());
            self.hook.game_completed(game_id);
        }

        Ok(MoveOutcome {
            fen,
            is_game_over: status == GameStatus::Completed,
            result,
            ai_move,
            pgn,
        })
    }

    fn search_rng(&self) -> StdRng {
        let mut master = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        StdRng::seed_from_u64(master.next_u64())
    }
}

/// Rebuild the game with its repetition history. The stored FEN is
/// authoritative when the replay disagrees with it.
fn restore(record: &GameRecord) -> Result<Game, AppError> {
    match Game::replay(&record.start_fen, &record.pgn_history) {
        Ok(game) if game.fen() == record.current_fen => Ok(game),
        Ok(game) => {
            tracing::warn!(
                "Game {}: replay ends at {} but stored FEN is {}; using stored FEN",
                record.id,
                game.fen(),
                record.current_fen
            );
            from_stored_fen(record)
        }
        Err(e) => {
            tracing::warn!("Game {}: history does not replay ({e}); using stored FEN", record.id);
            from_stored_fen(record)
        }
    }
}

fn from_stored_fen(record: &GameRecord) -> Result<Game, AppError> {
    Game::from_fen(&record.current_fen)
        .map_err(|e| AppError::Internal(format!("game {}: {e}", record.id)))
}

fn ledger_entry(
    game_id: &str,
    ply: i32,
    played: &PlayedMove,
    fen_before: String,
    fen_after: String,
) -> MoveLedgerEntry {
    MoveLedgerEntry {
        game_id: game_id.to_string(),
        ply,
        mover: Side::from_color(played.color),
        san: played.san.clone(),
        from: played.from_square(),
        to: played.to_square(),
        fen_before,
        fen_after,
    }
}
