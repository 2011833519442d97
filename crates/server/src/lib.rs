pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod referee;
pub mod routes;
pub mod store;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::referee::Referee;
use crate::store::GameStore;

/// Build the HTTP router around a referee.
pub fn app<S: GameStore>(referee: Arc<Referee<S>>, config: Config) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/tiers", get(routes::tiers::list_tiers))
        .route("/api/games", post(routes::games::create_game::<S>))
        .route("/api/games/{game_id}", get(routes::games::get_game::<S>))
        .route("/api/games/{game_id}/moves", get(routes::games::get_moves::<S>))
        .route("/api/submit-move", post(routes::moves::submit_move::<S>))
        .layer(Extension(referee))
        .layer(Extension(config))
        .layer(cors)
}
