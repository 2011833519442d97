use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use jackpot_server::clients::{CompletionHook, LogCompletion, WebhookCompletion};
use jackpot_server::config::Config;
use jackpot_server::db;
use jackpot_server::referee::Referee;
use jackpot_server::store::{GameStore, MemoryGameStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();

    let hook: Arc<dyn CompletionHook> = match &config.completion_webhook_url {
        Some(url) => {
            tracing::info!("Completion webhook configured: {url}");
            Arc::new(WebhookCompletion::new(url.clone()).context("Failed to build webhook client")?)
        }
        None => {
            tracing::info!("No completion webhook configured - completions are logged only");
            Arc::new(LogCompletion)
        }
    };

    if config.ai_seed.is_some() {
        tracing::warn!("AI_SEED is set - computer play is reproducible");
    }

    let app = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = db::pool::create_pool(database_url)
                .await
                .context("Failed to connect to database")?;

            tracing::info!("Running migrations...");
            db::pool::run_migrations(&pool)
                .await
                .context("Failed to run migrations")?;

            build_app(db::PgGameStore::new(pool), hook, &config)
        }
        None => {
            tracing::warn!("DATABASE_URL not set - games are kept in memory and lost on restart");
            build_app(MemoryGameStore::new(), hook, &config)
        }
    };

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

fn build_app<S: GameStore>(store: S, hook: Arc<dyn CompletionHook>, config: &Config) -> Router {
    let referee = Referee::new(Arc::new(store), config.tiers, hook, config.ai_seed);
    jackpot_server::app(Arc::new(referee), config.clone())
}
