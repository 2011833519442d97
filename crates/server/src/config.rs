use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Competitive bracket a game is played in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Starter,
    World,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Free, Tier::Starter, Tier::World];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Starter => "starter",
            Tier::World => "world",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "starter" => Ok(Tier::Starter),
            "world" => Ok(Tier::World),
            other => Err(format!("Unknown tier: {other}")),
        }
    }
}

/// Clock settings and computer think time for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierConfig {
    pub initial_clock_ms: u64,
    pub increment_ms: u64,
    pub max_clock_ms: u64,
    pub ai_time_budget_ms: u64,
}

impl TierConfig {
    pub fn ai_budget(&self) -> Duration {
        Duration::from_millis(self.ai_time_budget_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierTable {
    pub free: TierConfig,
    pub starter: TierConfig,
    pub world: TierConfig,
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            free: TierConfig {
                initial_clock_ms: 40_000,
                increment_ms: 2_000,
                max_clock_ms: 50_000,
                ai_time_budget_ms: 500,
            },
            starter: TierConfig {
                initial_clock_ms: 30_000,
                increment_ms: 2_000,
                max_clock_ms: 35_000,
                ai_time_budget_ms: 1_000,
            },
            world: TierConfig {
                initial_clock_ms: 25_000,
                increment_ms: 1_000,
                max_clock_ms: 25_000,
                ai_time_budget_ms: 2_000,
            },
        }
    }
}

impl TierTable {
    pub fn get(&self, tier: Tier) -> &TierConfig {
        match tier {
            Tier::Free => &self.free,
            Tier::Starter => &self.starter,
            Tier::World => &self.world,
        }
    }

    fn get_mut(&mut self, tier: Tier) -> &mut TierConfig {
        match tier {
            Tier::Free => &mut self.free,
            Tier::Starter => &mut self.starter,
            Tier::World => &mut self.world,
        }
    }

    /// Defaults with `AI_BUDGET_<TIER>_MS` overrides applied.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut table = Self::default();
        for tier in Tier::ALL {
            let key = format!("AI_BUDGET_{}_MS", tier.as_str().to_ascii_uppercase());
            if let Some(ms) = lookup(&key).and_then(|v| v.trim().parse().ok()) {
                table.get_mut(tier).ai_time_budget_ms = ms;
            }
        }
        table
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Postgres connection string; the in-memory store is used without it.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub completion_webhook_url: Option<String>,
    /// Seeds the search tie-break RNG for reproducible play.
    pub ai_seed: Option<u64>,
    pub tiers: TierTable,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            database_url: non_empty("DATABASE_URL"),
            host: non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: non_empty("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            completion_webhook_url: non_empty("COMPLETION_WEBHOOK_URL"),
            ai_seed: non_empty("AI_SEED").and_then(|v| v.parse().ok()),
            tiers: TierTable::from_lookup(&lookup),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert!(config.database_url.is_none());
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert!(config.ai_seed.is_none());
        assert_eq!(config.tiers.get(Tier::Free).ai_time_budget_ms, 500);
        assert_eq!(config.tiers.get(Tier::Starter).ai_time_budget_ms, 1_000);
        assert_eq!(config.tiers.get(Tier::World).ai_time_budget_ms, 2_000);
    }

    #[test]
    fn test_higher_tiers_think_longer() {
        let tiers = TierTable::default();
        assert!(tiers.free.ai_time_budget_ms < tiers.starter.ai_time_budget_ms);
        assert!(tiers.starter.ai_time_budget_ms < tiers.world.ai_time_budget_ms);
    }

    #[test]
    fn test_env_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/jackpot"),
            ("PORT", "9100"),
            ("AI_SEED", "42"),
            ("AI_BUDGET_WORLD_MS", "3500"),
            ("AI_BUDGET_FREE_MS", "not-a-number"),
            ("COMPLETION_WEBHOOK_URL", ""),
        ]);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/jackpot"));
        assert_eq!(config.port, 9100);
        assert_eq!(config.ai_seed, Some(42));
        assert_eq!(config.tiers.world.ai_time_budget_ms, 3_500);
        assert_eq!(config.tiers.free.ai_time_budget_ms, 500);
        assert!(config.completion_webhook_url.is_none());
    }

    #[test]
    fn test_tier_parsing() {
        assert_eq!("World".parse::<Tier>(), Ok(Tier::World));
        assert_eq!(" free ".parse::<Tier>(), Ok(Tier::Free));
        assert!("platinum".parse::<Tier>().is_err());
        assert_eq!(serde_json::to_string(&Tier::Starter).unwrap(), "\"starter\"");
    }
}
