//! Engine configuration. Every field has a default so partial YAML files work.

use crate::Kpis;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Simulation configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Budget for the whole year in USD.
    pub total_budget: Decimal,
    /// Time units available per quarter.
    pub quarter_time_budget: u32,
    /// Seed for the deterministic random source.
    pub rng_seed: u64,
    /// Maximum number of hires across the run.
    pub max_team_size: usize,
    /// KPIs at simulation start.
    pub starting_kpis: Kpis,
    pub momentum: MomentumConfig,
    pub big_bet: BigBetConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            total_budget: Decimal::new(500_000, 0),
            quarter_time_budget: 100,
            rng_seed: 42,
            max_team_size: 3,
            starting_kpis: Kpis::default(),
            momentum: MomentumConfig::default(),
            big_bet: BigBetConfig::default(),
        }
    }
}

/// Momentum bonus for enhanced wildcards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    /// Revenue from completed prior quarters above which momentum applies.
    pub revenue_threshold: Decimal,
    /// Multiplier applied to every impact field under momentum.
    pub multiplier: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            revenue_threshold: Decimal::new(200_000, 0),
            multiplier: 1.2,
        }
    }
}

/// Benchmarks and failure handling for big-bet resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BigBetConfig {
    /// Revenue at which the revenue factor saturates.
    pub revenue_benchmark: Decimal,
    /// Market share (points) at which the market factor saturates.
    pub market_share_benchmark: f64,
    /// Share of the potential impact realised on failure.
    pub failure_fraction: f64,
    /// Satisfaction points lost when a bet fails.
    pub failure_satisfaction_penalty: f64,
}

impl Default for BigBetConfig {
    fn default() -> Self {
        Self {
            revenue_benchmark: Decimal::new(1_000_000, 0),
            market_share_benchmark: 25.0,
            failure_fraction: 0.2,
            failure_satisfaction_penalty: 5.0,
        }
    }
}
