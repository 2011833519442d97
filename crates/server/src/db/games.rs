use chess_core::{GameResult, Side};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use crate::store::{
    GameRecord, GameStatus, GameStore, GameUpdate, MoveLedgerEntry, NewGame, StoreError,
};

const GAME_COLUMNS: &str =
    "id, tier, start_fen, current_fen, pgn_history, status, result, ply, created_at";

/// Postgres-backed [`GameStore`].
#[derive(Clone)]
pub struct PgGameStore {
    pool: PgPool,
}

impl PgGameStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

fn row_to_game(r: &PgRow) -> Result<GameRecord, StoreError> {
    let id: String = r.try_get("id")?;
    let tier: String = r.try_get("tier")?;
    let status: String = r.try_get("status")?;
    let result: String = r.try_get("result")?;
    let Json(pgn_history): Json<Vec<String>> = r.try_get("pgn_history")?;
    let created_at: DateTime<Utc> = r.try_get("created_at")?;

    Ok(GameRecord {
        tier: tier
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("game {id}: {e}")))?,
        status: GameStatus::parse(&status)
            .ok_or_else(|| StoreError::Corrupt(format!("game {id}: status {status}")))?,
        result: GameResult::parse(&result)
            .ok_or_else(|| StoreError::Corrupt(format!("game {id}: result {result}")))?,
        start_fen: r.try_get("start_fen")?,
        current_fen: r.try_get("current_fen")?,
        pgn_history,
        ply: r.try_get("ply")?,
        created_at,
        id,
    })
}

fn row_to_move(r: &PgRow) -> Result<MoveLedgerEntry, StoreError> {
    let mover: String = r.try_get("mover")?;
    let mover = match mover.as_str() {
        "human" => Side::Human,
        "ai" => Side::Computer,
        other => return Err(StoreError::Corrupt(format!("mover {other}"))),
    };
    Ok(MoveLedgerEntry {
        game_id: r.try_get("game_id")?,
        ply: r.try_get("ply")?,
        mover,
        san: r.try_get("san")?,
        from: r.try_get("from_sq")?,
        to: r.try_get("to_sq")?,
        fen_before: r.try_get("fen_before")?,
        fen_after: r.try_get("fen_after")?,
    })
}

impl GameStore for PgGameStore {
    async fn create_game(&self, game: NewGame) -> Result<GameRecord, StoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO games (id, tier, start_fen, current_fen)
             VALUES ($1, $2, $3, $3)
             RETURNING {GAME_COLUMNS}"
        ))
        .bind(&game.id)
        .bind(game.tier.as_str())
        .bind(&game.start_fen)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Duplicate(game.id.clone())
            } else {
                StoreError::Database(e)
            }
        })?;

        row_to_game(&row)
    }

    async fn get_game(&self, game_id: &str) -> Result<Option<GameRecord>, StoreError> {
        let row = sqlx::query(&format!("SELECT {GAME_COLUMNS} FROM games WHERE id = $1"))
            .bind(game_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_game).transpose()
    }

    async fn commit_exchange(
        &self,
        game_id: &str,
        expected_ply: i32,
        update: GameUpdate,
        moves: Vec<MoveLedgerEntry>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // The ply/status guard makes a second writer for the same turn a no-op.
        let updated = sqlx::query(
            r#"UPDATE games SET
                current_fen = $1,
                pgn_history = $2,
                status = $3,
                result = $4,
                ply = $5,
                updated_at = NOW()
            WHERE id = $6 AND ply = $7 AND status = 'active'"#,
        )
        .bind(&update.current_fen)
        .bind(Json(&update.pgn_history))
        .bind(update.status.as_str())
        .bind(update.result.as_str())
        .bind(update.ply)
        .bind(game_id)
        .bind(expected_ply)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() != 1 {
            tx.rollback().await?;
            return Err(StoreError::Conflict(game_id.to_string()));
        }

        for m in &moves {
            sqlx::query(
                r#"INSERT INTO game_moves (
                    game_id, ply, mover, san, from_sq, to_sq, fen_before, fen_after
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
            )
            .bind(&m.game_id)
            .bind(m.ply)
            .bind(m.mover.as_str())
            .bind(&m.san)
            .bind(&m.from)
            .bind(&m.to)
            .bind(&m.fen_before)
            .bind(&m.fen_after)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict(game_id.to_string())
                } else {
                    StoreError::Database(e)
                }
            })?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_moves(&self, game_id: &str) -> Result<Vec<MoveLedgerEntry>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT game_id, ply, mover, san, from_sq, to_sq, fen_before, fen_after
               FROM game_moves
               WHERE game_id = $1
               ORDER BY ply"#,
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_move).collect()
    }
}
