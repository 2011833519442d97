use axum::{Extension, Json};
use serde_json::{json, Value as JsonValue};

use crate::config::{Config, Tier};

/// GET /api/tiers
pub async fn list_tiers(Extension(config): Extension<Config>) -> Json<JsonValue> {
    let tiers: Vec<JsonValue> = Tier::ALL
        .iter()
        .map(|tier| {
            let settings = config.tiers.get(*tier);
            json!({
                "tier": tier,
                "initialClockMs": settings.initial_clock_ms,
                "incrementMs": settings.increment_ms,
                "maxClockMs": settings.max_clock_ms,
                "aiTimeBudgetMs": settings.ai_time_budget_ms,
            })
        })
        .collect();

    Json(json!({ "tiers": tiers }))
}
