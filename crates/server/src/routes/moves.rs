use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::error::AppError;
use crate::referee::{MoveRequest, Referee};
use crate::store::GameStore;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitMoveBody {
    #[serde(alias = "game_id")]
    pub game_id: String,
    #[serde(rename = "move")]
    pub mv: MoveRequest,
}

/// POST /api/submit-move
pub async fn submit_move<S: GameStore>(
    Extension(referee): Extension<Arc<Referee<S>>>,
    body: Result<Json<SubmitMoveBody>, JsonRejection>,
) -> Result<Json<JsonValue>, AppError> {
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let outcome = referee.submit_move(&body.game_id, &body.mv).await?;

    Ok(Json(json!({
        "ok": true,
        "fen": outcome.fen,
        "isGameOver": outcome.is_game_over,
        "result": outcome.result,
        "aiMove": outcome.ai_move,
        "pgn": outcome.pgn,
    })))
}
