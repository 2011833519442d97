use sqlx::postgres::{PgPool, PgPoolOptions};

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Run the full Postgres schema migration inline.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- One row per match; updated only by the referee
CREATE TABLE IF NOT EXISTS games (
    id          TEXT PRIMARY KEY,
    tier        TEXT NOT NULL,
    start_fen   TEXT NOT NULL,
    current_fen TEXT NOT NULL,
    pgn_history JSONB NOT NULL DEFAULT '[]'::jsonb,
    status      TEXT NOT NULL DEFAULT 'active',
    result      TEXT NOT NULL DEFAULT 'active',
    ply         INTEGER NOT NULL DEFAULT 0,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_games_status ON games (status);

-- Move ledger (append-only audit trail)
CREATE TABLE IF NOT EXISTS game_moves (
    id          BIGSERIAL PRIMARY KEY,
    game_id     TEXT NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    ply         INTEGER NOT NULL,
    mover       TEXT NOT NULL,
    san         TEXT NOT NULL,
    from_sq     TEXT NOT NULL,
    to_sq       TEXT NOT NULL,
    fen_before  TEXT NOT NULL,
    fen_after   TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE(game_id, ply)
);

CREATE INDEX IF NOT EXISTS idx_game_moves_game_id ON game_moves (game_id);
"#;
