#![deny(warnings)]

//! Persistence layer: simulation snapshots and the leaderboard.
//!
//! The engine talks to storage only through [`SimulationStore`]. The
//! [`sqlite`] module provides the async SQLite backend used by the CLI.

pub mod sqlite;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{Grade, SimulationContext, SimulationSnapshot};
use std::cmp::Ordering;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

pub use sqlite::{
    init_db, leaderboard_len, load_snapshot, save_snapshot, submit_leaderboard, top_scores,
};

/// Returns the default SQLite URL used for local saves.
pub fn default_sqlite_url() -> &'static str {
    "sqlite://./saves/main.db"
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("simulation not found: {0}")]
    NotFound(String),
    #[error("simulation {0} has no final results to submit")]
    NotScored(String),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("corrupt record: {0}")]
    Corrupt(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// One row of the competitive leaderboard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub simulation_id: String,
    pub user_id: String,
    pub username: String,
    pub overall_score: i64,
    pub grade: Grade,
    pub roi: f64,
    pub total_revenue: Decimal,
    pub submitted_at: DateTime<Utc>,
}

impl LeaderboardEntry {
    /// Build an entry from a scored context.
    pub fn from_context(
        ctx: &SimulationContext,
        user_id: &str,
        username: &str,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self, StoreError> {
        let fr = ctx
            .final_results
            .as_ref()
            .ok_or_else(|| StoreError::NotScored(ctx.simulation_id.clone()))?;
        Ok(Self {
            simulation_id: ctx.simulation_id.clone(),
            user_id: user_id.to_string(),
            username: username.to_string(),
            overall_score: fr.overall_score,
            grade: fr.grade,
            roi: fr.roi,
            total_revenue: fr.total_revenue,
            submitted_at,
        })
    }
}

/// Leaderboard order: score, then ROI, both descending; earlier submissions first on ties.
pub fn rank_order(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.overall_score
        .cmp(&a.overall_score)
        .then(b.roi.partial_cmp(&a.roi).unwrap_or(Ordering::Equal))
        .then(a.submitted_at.cmp(&b.submitted_at))
}

/// Opaque snapshot store. Implementations never retry; callers decide.
pub trait SimulationStore {
    fn save(&mut self, snapshot: &SimulationSnapshot) -> Result<(), StoreError>;

    fn load(&self, simulation_id: &str) -> Result<SimulationSnapshot, StoreError>;

    /// Record a scored run. Resubmitting the same simulation replaces its row.
    fn submit_leaderboard(
        &mut self,
        context: &SimulationContext,
        user_id: &str,
        username: &str,
    ) -> Result<LeaderboardEntry, StoreError>;
}

/// In-process store keeping serialized JSON, as a real backend would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saves: HashMap<String, String>,
    leaderboard: Vec<LeaderboardEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.saves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saves.is_empty()
    }

    /// Top `limit` entries in rank order.
    pub fn leaderboard(&self, limit: usize) -> Vec<&LeaderboardEntry> {
        let mut rows: Vec<&LeaderboardEntry> = self.leaderboard.iter().collect();
        rows.sort_by(|a, b| rank_order(a, b));
        rows.truncate(limit);
        rows
    }
}

impl SimulationStore for MemoryStore {
    fn save(&mut self, snapshot: &SimulationSnapshot) -> Result<(), StoreError> {
        let json = snapshot.to_json()?;
        debug!(simulation = %snapshot.context.simulation_id, bytes = json.len(), "saved snapshot");
        self.saves
            .insert(snapshot.context.simulation_id.clone(), json);
        Ok(())
    }

    fn load(&self, simulation_id: &str) -> Result<SimulationSnapshot, StoreError> {
        let json = self
            .saves
            .get(simulation_id)
            .ok_or_else(|| StoreError::NotFound(simulation_id.to_string()))?;
        Ok(SimulationSnapshot::from_json(json)?)
    }

    fn submit_leaderboard(
        &mut self,
        context: &SimulationContext,
        user_id: &str,
        username: &str,
    ) -> Result<LeaderboardEntry, StoreError> {
        let entry = LeaderboardEntry::from_context(context, user_id, username, Utc::now())?;
        self.leaderboard
            .retain(|e| e.simulation_id != entry.simulation_id);
        self.leaderboard.push(entry.clone());
        Ok(entry)
    }
}
