#![deny(warnings)]

//! Heuristic autoplayer: scores decisions by weighted utility and drives a
//! whole simulation run through the public command API.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{ImpactVector, Strategy, TacticCategory};

pub mod autoplay;
pub mod planner;

pub use autoplay::{autoplay, Autoplayer};
pub use planner::{choose_big_bet, choose_talent, choose_wildcard_choice, plan_quarter};

/// How much each KPI movement is worth to the autoplayer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    /// Utility per 1000 USD of revenue (and of cost).
    pub revenue_per_1k: f64,
    pub market_share: f64,
    pub customer_satisfaction: f64,
    pub brand_awareness: f64,
    /// Multiplier for tactics in the strategy's primary channels.
    pub channel_bonus: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            revenue_per_1k: 1.0,
            market_share: 8.0,
            customer_satisfaction: 2.0,
            brand_awareness: 1.5,
            channel_bonus: 1.25,
        }
    }
}

pub(crate) fn thousands(amount: Decimal) -> f64 {
    (amount / Decimal::from(1000)).to_f64().unwrap_or(0.0)
}

/// Weighted value of an impact. Higher is better; can be negative.
pub fn utility(impact: &ImpactVector, w: &Weights) -> f64 {
    thousands(impact.revenue) * w.revenue_per_1k
        + impact.market_share * w.market_share
        + impact.customer_satisfaction * w.customer_satisfaction
        + impact.brand_awareness * w.brand_awareness
}

/// Channel bonus when `category` is one of the strategy's primary channels.
pub fn channel_fit(strategy: &Strategy, category: TacticCategory, w: &Weights) -> f64 {
    if strategy.primary_channels.contains(&category) {
        w.channel_bonus
    } else {
        1.0
    }
}

/// Utility net of what it costs, in the same units.
pub fn net_utility(impact: &ImpactVector, cost: Decimal, w: &Weights) -> f64 {
    utility(impact, w) - thousands(cost) * w.revenue_per_1k
}
