//! Notifies the payout subsystem that a game has finished.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;

/// Called once per game, after the final state is durably stored. Delivery
/// is fire-and-forget; receivers must be idempotent.
pub trait CompletionHook: Send + Sync {
    fn game_completed(&self, game_id: &str);
}

/// POSTs `{"gameId": ...}` to a configured URL.
pub struct WebhookCompletion {
    client: Client,
    url: String,
}

impl WebhookCompletion {
    pub fn new(url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent("JackpotChess/1.0")
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl CompletionHook for WebhookCompletion {
    fn game_completed(&self, game_id: &str) {
        let client = self.client.clone();
        let url = self.url.clone();
        let game_id = game_id.to_string();

        tokio::spawn(async move {
            let resp = client
                .post(&url)
                .json(&json!({ "gameId": game_id }))
                .send()
                .await;
            match resp {
                Ok(r) if r.status().is_success() => {
                    tracing::info!("Completion hook delivered for game {game_id}");
                }
                Ok(r) => {
                    tracing::warn!("Completion hook for game {game_id} returned HTTP {}", r.status());
                }
                Err(e) => {
                    tracing::warn!("Completion hook for game {game_id} failed: {e}");
                }
            }
        });
    }
}

/// Used when no webhook is configured.
pub struct LogCompletion;

impl CompletionHook for LogCompletion {
    fn game_completed(&self, game_id: &str) {
        tracing::info!("Game {game_id} completed (no completion webhook configured)");
    }
}
