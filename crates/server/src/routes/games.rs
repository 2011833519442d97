use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{extract::Path, Extension, Json};
use chess_core::pgn;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::config::Tier;
use crate::error::AppError;
use crate::referee::Referee;
use crate::store::GameStore;

#[derive(Deserialize)]
pub struct CreateGameBody {
    pub tier: String,
    pub fen: Option<String>,
}

/// POST /api/games
pub async fn create_game<S: GameStore>(
    Extension(referee): Extension<Arc<Referee<S>>>,
    body: Result<Json<CreateGameBody>, JsonRejection>,
) -> Result<Json<JsonValue>, AppError> {
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let tier: Tier = body.tier.parse().map_err(AppError::BadRequest)?;

    let game = referee.create_game(tier, body.fen.as_deref()).await?;
    let clock = referee.tiers().get(tier);

    Ok(Json(json!({
        "ok": true,
        "gameId": game.id,
        "tier": game.tier,
        "fen": game.current_fen,
        "clock": {
            "initialClockMs": clock.initial_clock_ms,
            "incrementMs": clock.increment_ms,
            "maxClockMs": clock.max_clock_ms,
        },
    })))
}

/// GET /api/games/{game_id}
pub async fn get_game<S: GameStore>(
    Extension(referee): Extension<Arc<Referee<S>>>,
    Path(game_id): Path<String>,
) -> Result<Json<JsonValue>, AppError> {
    let game = referee.get_game(&game_id).await?;
    let pgn = pgn::render(&game.start_fen, &game.pgn_history, game.result);

    Ok(Json(json!({
        "ok": true,
        "game": game,
        "pgn": pgn,
    })))
}

/// GET /api/games/{game_id}/moves
pub async fn get_moves<S: GameStore>(
    Extension(referee): Extension<Arc<Referee<S>>>,
    Path(game_id): Path<String>,
) -> Result<Json<JsonValue>, AppError> {
    let moves = referee.list_moves(&game_id).await?;

    Ok(Json(json!({
        "ok": true,
        "gameId": game_id,
        "moves": moves,
    })))
}
