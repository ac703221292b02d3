//! Retired-players stats store.
//!
//! A thin client over Postgres: one bounded connection pool for the process,
//! one transaction per retirement batch or leaderboard read. The schema is
//! bootstrapped on connect so a fresh database works out of the box.

use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::registry::RetiredPlayer;

/// Name of the environment variable carrying the connection string.
pub const DB_URL_ENV: &str = "GAME_DB_URL";

/// Errors produced by the stats store.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("database request failed: {0}")]
    Db(#[from] sqlx::Error),
}

/// One leaderboard row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub name: String,
    pub score: i32,
    pub play_time_ms: i32,
}

/// Pooled Postgres client for the `retired_players` table.
#[derive(Debug, Clone)]
pub struct PlayerStatsStore {
    pool: PgPool,
}

impl PlayerStatsStore {
    /// Connect with a pool of `max_connections` and bootstrap the schema.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StatsError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(url)
            .await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS retired_players ( \
                id UUID PRIMARY KEY, \
                name varchar(100) NOT NULL, \
                score integer NOT NULL, \
                play_time_ms integer NOT NULL)",
        )
        .execute(&pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS retired_players_rating_idx \
                ON retired_players (score DESC, play_time_ms, name)",
        )
        .execute(&pool)
        .await?;
        tracing::info!(max_connections, "stats store connected");
        Ok(Self { pool })
    }

    /// Insert a retirement batch in a single transaction.
    pub async fn save_retired(&self, players: &[RetiredPlayer]) -> Result<(), StatsError> {
        if players.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for player in players {
            sqlx::query(
                "INSERT INTO retired_players (id, name, score, play_time_ms) \
                    VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(&player.name)
            .bind(clamp_to_i32(player.score, "score"))
            .bind(clamp_to_i32(player.play_time_ms, "play_time_ms"))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        tracing::debug!(count = players.len(), "retired players saved");
        Ok(())
    }

    /// Page of the leaderboard, best first: score descending, faster careers
    /// and lexicographically earlier names breaking ties.
    pub async fn list_top(&self, offset: u64, limit: u64) -> Result<Vec<LeaderboardRow>, StatsError> {
        let rows = sqlx::query(
            "SELECT name, score, play_time_ms FROM retired_players \
                ORDER BY score DESC, play_time_ms ASC, name ASC \
                LIMIT $1 OFFSET $2",
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| -> Result<LeaderboardRow, StatsError> {
                Ok(LeaderboardRow {
                    name: row.try_get("name")?,
                    score: row.try_get("score")?,
                    play_time_ms: row.try_get("play_time_ms")?,
                })
            })
            .collect()
    }
}

/// The table stores 32-bit integers; a value past `i32::MAX` is saturated
/// rather than rejected, since losing a row entirely would be worse.
fn clamp_to_i32(value: u64, field: &str) -> i32 {
    i32::try_from(value).unwrap_or_else(|_| {
        tracing::warn!(field, value, "saturating oversized value for storage");
        i32::MAX
    })
}
