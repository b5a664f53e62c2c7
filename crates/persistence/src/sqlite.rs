//! SQLite backend over `sqlx`.
//!
//! The pool holds a single connection so writes from concurrent callers are
//! serialized by the store, not the engine.

use crate::{rank_order, LeaderboardEntry, StoreError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sim_core::{Grade, SimulationContext, SimulationSnapshot};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{info, warn};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS simulations (
        simulation_id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        phase TEXT NOT NULL,
        snapshot_json TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS leaderboard (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        simulation_id TEXT NOT NULL UNIQUE,
        user_id TEXT NOT NULL,
        username TEXT NOT NULL,
        overall_score INTEGER NOT NULL,
        grade TEXT NOT NULL,
        roi REAL NOT NULL,
        total_revenue TEXT NOT NULL,
        submitted_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS leaderboard_score ON leaderboard (overall_score DESC, roi DESC)",
];

/// Open (creating if needed) the database at `url` and apply the schema.
pub async fn init_db(url: &str) -> Result<SqlitePool, StoreError> {
    let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await?;
    for stmt in SCHEMA {
        sqlx::query(stmt).execute(&pool).await?;
    }
    info!(url, "database ready");
    Ok(pool)
}

/// Insert or replace the snapshot for its simulation id.
pub async fn save_snapshot(pool: &SqlitePool, snapshot: &SimulationSnapshot) -> Result<(), StoreError> {
    let json = snapshot.to_json()?;
    let phase = serde_json::to_string(&snapshot.phase)?;
    let res = sqlx::query(
        "INSERT INTO simulations (simulation_id, user_id, phase, snapshot_json, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(simulation_id) DO UPDATE SET
            phase = excluded.phase,
            snapshot_json = excluded.snapshot_json,
            updated_at = excluded.updated_at",
    )
    .bind(&snapshot.context.simulation_id)
    .bind(&snapshot.context.user_id)
    .bind(phase)
    .bind(json)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await;
    if let Err(e) = &res {
        warn!(simulation = %snapshot.context.simulation_id, error = %e, "snapshot save failed");
    }
    res?;
    Ok(())
}

pub async fn load_snapshot(pool: &SqlitePool, simulation_id: &str) -> Result<SimulationSnapshot, StoreError> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT snapshot_json FROM simulations WHERE simulation_id = ?1")
            .bind(simulation_id)
            .fetch_optional(pool)
            .await?;
    let (json,) = row.ok_or_else(|| StoreError::NotFound(simulation_id.to_string()))?;
    Ok(SimulationSnapshot::from_json(&json)?)
}

/// Record (or replace) a scored run on the leaderboard.
pub async fn submit_leaderboard(
    pool: &SqlitePool,
    context: &SimulationContext,
    user_id: &str,
    username: &str,
) -> Result<LeaderboardEntry, StoreError> {
    let entry = LeaderboardEntry::from_context(context, user_id, username, Utc::now())?;
    sqlx::query(
        "INSERT INTO leaderboard
            (simulation_id, user_id, username, overall_score, grade, roi, total_revenue, submitted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(simulation_id) DO UPDATE SET
            username = excluded.username,
            overall_score = excluded.overall_score,
            grade = excluded.grade,
            roi = excluded.roi,
            total_revenue = excluded.total_revenue,
            submitted_at = excluded.submitted_at",
    )
    .bind(&entry.simulation_id)
    .bind(&entry.user_id)
    .bind(&entry.username)
    .bind(entry.overall_score)
    .bind(entry.grade.to_string())
    .bind(entry.roi)
    .bind(entry.total_revenue.to_string())
    .bind(entry.submitted_at.to_rfc3339())
    .execute(pool)
    .await?;
    info!(simulation = %entry.simulation_id, score = entry.overall_score, "leaderboard entry submitted");
    Ok(entry)
}

type LeaderboardRow = (String, String, String, i64, String, f64, String, String);

fn entry_from_row(row: LeaderboardRow) -> Result<LeaderboardEntry, StoreError> {
    let (simulation_id, user_id, username, overall_score, grade, roi, total_revenue, submitted_at) = row;
    let grade = Grade::from_str(&grade).map_err(StoreError::Corrupt)?;
    let total_revenue =
        Decimal::from_str(&total_revenue).map_err(|e| StoreError::Corrupt(e.to_string()))?;
    let submitted_at = DateTime::parse_from_rfc3339(&submitted_at)
        .map_err(|e| StoreError::Corrupt(e.to_string()))?
        .with_timezone(&Utc);
    Ok(LeaderboardEntry {
        simulation_id,
        user_id,
        username,
        overall_score,
        grade,
        roi,
        total_revenue,
        submitted_at,
    })
}

/// Top `limit` leaderboard rows in rank order.
pub async fn top_scores(pool: &SqlitePool, limit: i64) -> Result<Vec<LeaderboardEntry>, StoreError> {
    let rows: Vec<LeaderboardRow> = sqlx::query_as(
        "SELECT simulation_id, user_id, username, overall_score, grade, roi, total_revenue, submitted_at
         FROM leaderboard
         ORDER BY overall_score DESC, roi DESC, submitted_at ASC
         LIMIT ?1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    let mut entries = rows
        .into_iter()
        .map(entry_from_row)
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort_by(rank_order);
    Ok(entries)
}

/// Number of rows on the leaderboard.
pub async fn leaderboard_len(pool: &SqlitePool) -> Result<i64, StoreError> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM leaderboard")
        .fetch_one(pool)
        .await?;
    Ok(n)
}
