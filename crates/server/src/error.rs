use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chess_core::BoardError;
use serde_json::json;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Illegal move: {0}")]
    IllegalMove(String),

    #[error("Game not found")]
    GameNotFound(String),

    #[error("Game is not active")]
    GameNotActive(String),

    #[error("Game was updated by another request; reload and retry")]
    StaleGame(String),

    #[error("Failed to save game")]
    Persistence(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::IllegalMove(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::GameNotFound(_) => StatusCode::NOT_FOUND,
            AppError::GameNotActive(_) | AppError::StaleGame(_) => StatusCode::CONFLICT,
            AppError::Persistence(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BoardError> for AppError {
    fn from(e: BoardError) -> Self {
        match e {
            BoardError::IllegalMove(mv) => AppError::IllegalMove(mv),
            BoardError::InvalidSquare(_)
            | BoardError::InvalidPromotion(_)
            | BoardError::InvalidFen(_) => AppError::BadRequest(e.to_string()),
            BoardError::InvalidHistory { .. } => AppError::Internal(e.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(game_id) => AppError::StaleGame(game_id),
            other => AppError::Persistence(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Persistence(detail) => tracing::error!("Persistence failure: {detail}"),
            AppError::Internal(detail) => tracing::error!("Internal error: {detail}"),
            AppError::IllegalMove(_) | AppError::GameNotActive(_) | AppError::StaleGame(_) => {
                tracing::warn!("Rejected submission: {self}")
            }
            AppError::GameNotFound(_) | AppError::BadRequest(_) => {}
        }

        (status, Json(json!({ "ok": false, "error": self.to_string() }))).into_response()
    }
}
