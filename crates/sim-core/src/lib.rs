#![deny(warnings)]

//! Core domain models and invariants for the marketing quarters simulation.
//!
//! This crate defines serializable types used across the engine with
//! validation helpers to guarantee basic invariants of catalog content.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{Add, AddAssign};
use thiserror::Error;

pub mod config;
pub mod context;
pub mod rng;

pub use config::{BigBetConfig, MomentumConfig, SimConfig};
pub use context::{
    FinalResults, Grade, Phase, QuarterData, QuarterKey, QuarterResult, Quarters,
    ResolvedWildcard, SimulationContext, SimulationSnapshot,
};
pub use rng::{RandomSource, ScriptedRandom, SeededRandom};

/// Marketing channel family a tactic (or a hire's specialty) belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TacticCategory {
    Digital,
    Traditional,
    Content,
    Events,
    Partnerships,
}

impl TacticCategory {
    pub const ALL: [TacticCategory; 5] = [
        TacticCategory::Digital,
        TacticCategory::Traditional,
        TacticCategory::Content,
        TacticCategory::Events,
        TacticCategory::Partnerships,
    ];
}

impl fmt::Display for TacticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TacticCategory::Digital => "digital",
            TacticCategory::Traditional => "traditional",
            TacticCategory::Content => "content",
            TacticCategory::Events => "events",
            TacticCategory::Partnerships => "partnerships",
        };
        f.write_str(s)
    }
}

/// Clamp a percentage-type KPI into `[0, 100]`. NaN collapses to 0.
pub fn clamp_pct(v: f64) -> f64 {
    v.max(0.0).min(100.0)
}

/// Multiply an amount of money by a float factor, rounded to cents.
///
/// Non-finite factors and overflow leave the amount unchanged.
pub fn scale_money(amount: Decimal, factor: f64) -> Decimal {
    Decimal::from_f64(factor)
        .and_then(|f| amount.checked_mul(f))
        .map(|v| v.round_dp(2))
        .unwrap_or(amount)
}

/// Change applied to KPIs by a tactic, a wildcard choice or a big bet.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactVector {
    /// Revenue delta in USD.
    #[serde(default)]
    pub revenue: Decimal,
    /// Market share delta in percentage points.
    #[serde(default)]
    pub market_share: f64,
    /// Customer satisfaction delta in points.
    #[serde(default)]
    pub customer_satisfaction: f64,
    /// Brand awareness delta in points.
    #[serde(default)]
    pub brand_awareness: f64,
}

impl ImpactVector {
    pub fn new(
        revenue: Decimal,
        market_share: f64,
        customer_satisfaction: f64,
        brand_awareness: f64,
    ) -> Self {
        Self {
            revenue,
            market_share,
            customer_satisfaction,
            brand_awareness,
        }
    }

    /// Every field multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            revenue: scale_money(self.revenue, factor),
            market_share: self.market_share * factor,
            customer_satisfaction: self.customer_satisfaction * factor,
            brand_awareness: self.brand_awareness * factor,
        }
    }

    /// Positive fields amplified by `factor`, negative fields softened by it.
    pub fn talent_adjusted(&self, factor: f64) -> Self {
        if !(factor.is_finite() && factor > 0.0) {
            return self.clone();
        }
        let adj = |v: f64| if v >= 0.0 { v * factor } else { v / factor };
        let revenue = if self.revenue >= Decimal::ZERO {
            scale_money(self.revenue, factor)
        } else {
            scale_money(self.revenue, 1.0 / factor)
        };
        Self {
            revenue,
            market_share: adj(self.market_share),
            customer_satisfaction: adj(self.customer_satisfaction),
            brand_awareness: adj(self.brand_awareness),
        }
    }
}

impl Add for ImpactVector {
    type Output = ImpactVector;

    fn add(mut self, rhs: ImpactVector) -> ImpactVector {
        self += rhs;
        self
    }
}

impl AddAssign for ImpactVector {
    fn add_assign(&mut self, rhs: ImpactVector) {
        self.revenue += rhs.revenue;
        self.market_share += rhs.market_share;
        self.customer_satisfaction += rhs.customer_satisfaction;
        self.brand_awareness += rhs.brand_awareness;
    }
}

/// Cumulative key performance indicators.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    /// Revenue to date in USD.
    pub revenue: Decimal,
    /// Profit to date in USD (revenue minus spend).
    pub profit: Decimal,
    /// Market share in [0, 100].
    pub market_share: f64,
    /// Customer satisfaction in [0, 100].
    pub customer_satisfaction: f64,
    /// Brand awareness in [0, 100].
    pub brand_awareness: f64,
}

impl Kpis {
    /// Fold an impact into the KPIs. Revenue counts toward profit; spend is
    /// charged separately by the quarter ledger.
    pub fn apply(&mut self, impact: &ImpactVector) {
        self.revenue += impact.revenue;
        self.profit += impact.revenue;
        self.market_share = clamp_pct(self.market_share + impact.market_share);
        self.customer_satisfaction =
            clamp_pct(self.customer_satisfaction + impact.customer_satisfaction);
        self.brand_awareness = clamp_pct(self.brand_awareness + impact.brand_awareness);
    }
}

/// A selectable marketing action from the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tactic {
    pub id: String,
    pub name: String,
    pub category: TacticCategory,
    /// Cost in USD (>= 0).
    pub cost: Decimal,
    /// Time units consumed from the quarter's allotment.
    pub time_required: u32,
    pub expected_impact: ImpactVector,
}

/// Kinds of disruptive events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WildcardType {
    Crisis,
    Opportunity,
    MarketShift,
    CompetitorAction,
}

/// One answer to a wildcard event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WildcardChoice {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub cost: Decimal,
    #[serde(default)]
    pub time_required: u32,
    pub impact: ImpactVector,
}

/// Context sensitivity carried by enhanced wildcards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextSensitivity {
    /// Whether the momentum multiplier applies to this event.
    #[serde(default = "default_true")]
    pub momentum_sensitive: bool,
    /// Talent specialties that help with this event.
    #[serde(default)]
    pub relevant_talent: Vec<TacticCategory>,
    /// Amplification of gains (and softening of losses) when relevant talent is on the team.
    #[serde(default = "default_talent_factor")]
    pub talent_factor: f64,
}

fn default_true() -> bool {
    true
}

fn default_talent_factor() -> f64 {
    1.15
}

/// A disruptive event requiring a choice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WildcardEvent {
    pub id: String,
    pub kind: WildcardType,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub choices: Vec<WildcardChoice>,
    /// Present on enhanced wildcards only.
    #[serde(default)]
    pub sensitivity: Option<ContextSensitivity>,
}

impl WildcardEvent {
    pub fn choice(&self, choice_id: &str) -> Option<&WildcardChoice> {
        self.choices.iter().find(|c| c.id == choice_id)
    }

    pub fn is_enhanced(&self) -> bool {
        self.sensitivity.is_some()
    }
}

/// A hire that boosts tactics of its specialty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TalentCandidate {
    pub id: String,
    pub name: String,
    pub specialty: TacticCategory,
    pub cost: Decimal,
    /// Effectiveness multiplier (> 0) applied to tactics of `specialty`.
    pub skill_multiplier: f64,
}

/// A one-time high-risk Q4 investment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BigBetOption {
    pub id: String,
    pub name: String,
    /// Strategy description shown to the player.
    #[serde(default)]
    pub strategy: String,
    pub cost: Decimal,
    /// Risk in [0, 1].
    pub risk: f64,
    pub potential_impact: ImpactVector,
}

/// The resolved outcome of a big bet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BigBetOutcome {
    pub option_id: String,
    pub success: bool,
    pub success_probability: f64,
    pub roll: f64,
    pub actual_impact: ImpactVector,
}

/// Player strategy set during the strategy session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub company_name: String,
    pub industry: String,
    pub target_audience: String,
    pub brand_positioning: String,
    pub primary_channels: Vec<TacticCategory>,
    /// Planned share of budget per channel, in percent.
    pub budget_allocation: BTreeMap<TacticCategory, f64>,
}

/// Partial strategy update. `Some` fields overwrite.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyPatch {
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub target_audience: Option<String>,
    pub brand_positioning: Option<String>,
    pub primary_channels: Option<Vec<TacticCategory>>,
    pub budget_allocation: Option<BTreeMap<TacticCategory, f64>>,
}

impl Strategy {
    pub fn merge(&mut self, patch: StrategyPatch) {
        if let Some(v) = patch.company_name {
            self.company_name = v;
        }
        if let Some(v) = patch.industry {
            self.industry = v;
        }
        if let Some(v) = patch.target_audience {
            self.target_audience = v;
        }
        if let Some(v) = patch.brand_positioning {
            self.brand_positioning = v;
        }
        if let Some(v) = patch.primary_channels {
            self.primary_channels = v;
        }
        if let Some(v) = patch.budget_allocation {
            self.budget_allocation = v;
        }
    }
}

/// Validation errors for domain invariants.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Identifiers must be non-empty.
    #[error("empty identifier")]
    EmptyId,
    /// Numeric field must be finite.
    #[error("non-finite numeric value encountered")]
    NonFinite,
    /// Price or cost must be non-negative.
    #[error("negative monetary value is invalid")]
    NegativeMoney,
    /// Risk must be within [0, 1].
    #[error("risk {0} must be within [0,1]")]
    InvalidRisk(f64),
    /// Skill multiplier must be strictly positive.
    #[error("skill multiplier must be > 0")]
    NonPositiveMultiplier,
    /// A wildcard needs at least one choice.
    #[error("wildcard {0} has no choices")]
    NoChoices(String),
    /// An enhanced wildcard must carry context sensitivity.
    #[error("wildcard {0} has no context sensitivity")]
    MissingSensitivity(String),
    /// Duplicate identifier within one collection.
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    /// Budget allocation percentages out of range.
    #[error("budget allocation must be within [0,100] and sum to at most 100")]
    InvalidAllocation,
}

fn validate_impact(i: &ImpactVector) -> Result<(), ValidationError> {
    if !(i.market_share.is_finite()
        && i.customer_satisfaction.is_finite()
        && i.brand_awareness.is_finite())
    {
        return Err(ValidationError::NonFinite);
    }
    Ok(())
}

/// Validate a tactic.
pub fn validate_tactic(t: &Tactic) -> Result<(), ValidationError> {
    if t.id.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if t.cost < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney);
    }
    validate_impact(&t.expected_impact)
}

/// Validate a wildcard and its choices.
pub fn validate_wildcard(w: &WildcardEvent) -> Result<(), ValidationError> {
    if w.id.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if w.choices.is_empty() {
        return Err(ValidationError::NoChoices(w.id.clone()));
    }
    let mut ids = BTreeSet::new();
    for c in &w.choices {
        if c.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if !ids.insert(c.id.as_str()) {
            return Err(ValidationError::DuplicateId(c.id.clone()));
        }
        if c.cost < Decimal::ZERO {
            return Err(ValidationError::NegativeMoney);
        }
        validate_impact(&c.impact)?;
    }
    if let Some(s) = &w.sensitivity {
        if !(s.talent_factor.is_finite() && s.talent_factor > 0.0) {
            return Err(ValidationError::NonFinite);
        }
    }
    Ok(())
}

/// Validate a talent candidate.
pub fn validate_talent(t: &TalentCandidate) -> Result<(), ValidationError> {
    if t.id.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if t.cost < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney);
    }
    if !t.skill_multiplier.is_finite() {
        return Err(ValidationError::NonFinite);
    }
    if t.skill_multiplier <= 0.0 {
        return Err(ValidationError::NonPositiveMultiplier);
    }
    Ok(())
}

/// Validate a big-bet option.
pub fn validate_big_bet(b: &BigBetOption) -> Result<(), ValidationError> {
    if b.id.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if b.cost < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney);
    }
    if !(0.0..=1.0).contains(&b.risk) {
        return Err(ValidationError::InvalidRisk(b.risk));
    }
    validate_impact(&b.potential_impact)
}

/// Validate a strategy's budget allocation.
pub fn validate_strategy(s: &Strategy) -> Result<(), ValidationError> {
    let mut total = 0.0;
    for pct in s.budget_allocation.values() {
        if !pct.is_finite() {
            return Err(ValidationError::NonFinite);
        }
        if !(0.0..=100.0).contains(pct) {
            return Err(ValidationError::InvalidAllocation);
        }
        total += pct;
    }
    if total > 100.0 + 1e-9 {
        return Err(ValidationError::InvalidAllocation);
    }
    Ok(())
}
