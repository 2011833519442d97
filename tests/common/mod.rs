use std::sync::Arc;

use jackpot_server::clients::LogCompletion;
use jackpot_server::config::{Config, TierTable};
use jackpot_server::referee::Referee;
use jackpot_server::store::MemoryGameStore;
use reqwest::Client;
use serde_json::{json, Value};

/// A server bound to an ephemeral port, backed by the in-memory store.
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryGameStore>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Short think times keep the suite fast.
fn fast_tiers() -> TierTable {
    let mut tiers = TierTable::default();
    tiers.free.ai_time_budget_ms = 100;
    tiers.starter.ai_time_budget_ms = 100;
    tiers.world.ai_time_budget_ms = 100;
    tiers
}

pub async fn spawn_server() -> TestServer {
    let store = Arc::new(MemoryGameStore::new());
    let config = Config {
        tiers: fast_tiers(),
        ai_seed: Some(1),
        ..Config::default()
    };
    let referee = Referee::new(
        store.clone(),
        config.tiers,
        Arc::new(LogCompletion),
        config.ai_seed,
    );
    let app = jackpot_server::app(Arc::new(referee), config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server error");
    });

    TestServer {
        base_url: format!("http://{addr}"),
        store,
    }
}

/// Build a reqwest client for tests.
pub fn client() -> Client {
    Client::new()
}

/// Create a game and return its id.
pub async fn create_game(server: &TestServer, tier: &str, fen: Option<&str>) -> String {
    let resp = client()
        .post(server.url("/api/games"))
        .json(&json!({ "tier": tier, "fen": fen }))
        .send()
        .await
        .expect("Failed to send create request");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("Invalid JSON");
    body["gameId"].as_str().expect("Missing gameId").to_string()
}

/// POST /api/submit-move and return (status, body).
pub async fn submit_move(server: &TestServer, game_id: &str, mv: Value) -> (u16, Value) {
    let resp = client()
        .post(server.url("/api/submit-move"))
        .json(&json!({ "gameId": game_id, "move": mv }))
        .send()
        .await
        .expect("Failed to send move");
    let status = resp.status().as_u16();
    let body: Value = resp.json().await.expect("Invalid JSON");
    (status, body)
}
