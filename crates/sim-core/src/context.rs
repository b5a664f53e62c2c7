//! Simulation context: the root aggregate owned by the state machine.

use crate::{
    BigBetOption, BigBetOutcome, ImpactVector, Kpis, SimConfig, Strategy, Tactic,
    TalentCandidate, WildcardEvent,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four sequential decision periods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QuarterKey {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl QuarterKey {
    pub const ALL: [QuarterKey; 4] = [QuarterKey::Q1, QuarterKey::Q2, QuarterKey::Q3, QuarterKey::Q4];

    /// The following quarter, `None` after Q4.
    pub fn next(self) -> Option<QuarterKey> {
        match self {
            QuarterKey::Q1 => Some(QuarterKey::Q2),
            QuarterKey::Q2 => Some(QuarterKey::Q3),
            QuarterKey::Q3 => Some(QuarterKey::Q4),
            QuarterKey::Q4 => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            QuarterKey::Q1 => 0,
            QuarterKey::Q2 => 1,
            QuarterKey::Q3 => 2,
            QuarterKey::Q4 => 3,
        }
    }
}

impl fmt::Display for QuarterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.index() + 1)
    }
}

/// A wildcard answered during a quarter, with the impact that was applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedWildcard {
    pub wildcard_id: String,
    pub choice_id: String,
    pub cost: Decimal,
    pub time_required: u32,
    pub impact: ImpactVector,
}

/// Finalized figures for a single quarter.
///
/// `revenue` and `profit` are the quarter's own deltas. The percentage fields
/// are end-of-quarter levels, clamped to `[0, 100]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuarterResult {
    pub revenue: Decimal,
    pub profit: Decimal,
    pub market_share: f64,
    pub customer_satisfaction: f64,
    pub brand_awareness: f64,
    pub budget_spent: Decimal,
    pub time_spent: u32,
}

/// Decisions and outcomes of one quarter.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuarterData {
    /// Selected tactics; insertion order is priority.
    pub tactics: Vec<Tactic>,
    /// Wildcards triggered this quarter.
    pub wildcards: Vec<WildcardEvent>,
    /// Triggered but not yet answered.
    pub pending_wildcard: Option<WildcardEvent>,
    pub wildcard_impacts: Vec<ResolvedWildcard>,
    pub talent_hired: Option<TalentCandidate>,
    pub big_bet: Option<BigBetOption>,
    pub big_bet_outcome: Option<BigBetOutcome>,
    pub budget_spent: Decimal,
    pub time_spent: u32,
    /// Set when the quarter completes.
    pub results: Option<QuarterResult>,
}

impl QuarterData {
    /// Recompute `budget_spent` and `time_spent` from the quarter's decisions.
    pub fn recompute_ledger(&mut self) {
        let mut spent = Decimal::ZERO;
        let mut time: u32 = 0;
        for t in &self.tactics {
            spent += t.cost;
            time = time.saturating_add(t.time_required);
        }
        for w in &self.wildcard_impacts {
            spent += w.cost;
            time = time.saturating_add(w.time_required);
        }
        if let Some(t) = &self.talent_hired {
            spent += t.cost;
        }
        if let Some(b) = &self.big_bet {
            spent += b.cost;
        }
        self.budget_spent = spent;
        self.time_spent = time;
    }

    pub fn is_complete(&self) -> bool {
        self.results.is_some()
    }
}

/// Fixed map from quarter key to quarter data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Quarters {
    #[serde(rename = "Q1")]
    pub q1: QuarterData,
    #[serde(rename = "Q2")]
    pub q2: QuarterData,
    #[serde(rename = "Q3")]
    pub q3: QuarterData,
    #[serde(rename = "Q4")]
    pub q4: QuarterData,
}

impl Quarters {
    pub fn get(&self, key: QuarterKey) -> &QuarterData {
        match key {
            QuarterKey::Q1 => &self.q1,
            QuarterKey::Q2 => &self.q2,
            QuarterKey::Q3 => &self.q3,
            QuarterKey::Q4 => &self.q4,
        }
    }

    pub fn get_mut(&mut self, key: QuarterKey) -> &mut QuarterData {
        match key {
            QuarterKey::Q1 => &mut self.q1,
            QuarterKey::Q2 => &mut self.q2,
            QuarterKey::Q3 => &mut self.q3,
            QuarterKey::Q4 => &mut self.q4,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuarterKey, &QuarterData)> {
        QuarterKey::ALL.into_iter().map(move |k| (k, self.get(k)))
    }
}

/// Letter classification of the overall score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        };
        f.write_str(s)
    }
}

impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A+" => Ok(Grade::APlus),
            "A" => Ok(Grade::A),
            "B" => Ok(Grade::B),
            "C" => Ok(Grade::C),
            "D" => Ok(Grade::D),
            other => Err(format!("unknown grade: {other}")),
        }
    }
}

/// Final graded outcome, written once when the debrief starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalResults {
    pub final_kpis: Kpis,
    pub total_revenue: Decimal,
    pub total_budget_spent: Decimal,
    /// Return on investment in percent.
    pub roi: f64,
    pub overall_score: i64,
    pub grade: Grade,
}

/// Lifecycle phase, as persisted and reported to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    StrategySession,
    Quarter(QuarterKey),
    Debrief,
    Completed,
}

/// The root aggregate for one simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationContext {
    pub simulation_id: String,
    pub user_id: String,
    pub strategy: Strategy,
    pub total_budget: Decimal,
    pub remaining_budget: Decimal,
    /// Per-quarter allotment, `floor(total_budget / 4)`.
    pub quarter_budget: Decimal,
    pub quarter_time_budget: u32,
    pub kpis: Kpis,
    pub quarters: Quarters,
    /// Append-only.
    pub hired_talent: Vec<TalentCandidate>,
    pub selected_big_bet: Option<BigBetOption>,
    pub big_bet_outcome: Option<BigBetOutcome>,
    /// Write-once.
    pub final_results: Option<FinalResults>,
    /// Append-only log of every wildcard encountered.
    pub wildcards: Vec<WildcardEvent>,
}

impl SimulationContext {
    /// Fresh context: starting KPIs, full budget, empty quarters.
    pub fn new(simulation_id: impl Into<String>, user_id: impl Into<String>, cfg: &SimConfig) -> Self {
        let total = cfg.total_budget;
        Self {
            simulation_id: simulation_id.into(),
            user_id: user_id.into(),
            strategy: Strategy::default(),
            total_budget: total,
            remaining_budget: total,
            quarter_budget: (total / Decimal::from(4)).floor(),
            quarter_time_budget: cfg.quarter_time_budget,
            kpis: cfg.starting_kpis.clone(),
            quarters: Quarters::default(),
            hired_talent: Vec::new(),
            selected_big_bet: None,
            big_bet_outcome: None,
            final_results: None,
            wildcards: Vec::new(),
        }
    }

    pub fn quarter(&self, key: QuarterKey) -> &QuarterData {
        self.quarters.get(key)
    }

    pub fn quarter_mut(&mut self, key: QuarterKey) -> &mut QuarterData {
        self.quarters.get_mut(key)
    }

    /// Restore `remaining_budget = total_budget - Σ budget_spent`.
    pub fn recompute_budget(&mut self) {
        let spent: Decimal = self.quarters.iter().map(|(_, q)| q.budget_spent).sum();
        self.remaining_budget = self.total_budget - spent;
    }

    /// Budget left in the quarter's allotment; negative when over-allocated.
    pub fn quarter_remaining_budget(&self, key: QuarterKey) -> Decimal {
        self.quarter_budget - self.quarter(key).budget_spent
    }

    /// Time left in the quarter's allotment; negative when over-allocated.
    pub fn quarter_remaining_time(&self, key: QuarterKey) -> i64 {
        i64::from(self.quarter_time_budget) - i64::from(self.quarter(key).time_spent)
    }

    /// Caller-side precondition for completing a quarter.
    pub fn can_complete(&self, key: QuarterKey) -> bool {
        self.quarter_remaining_budget(key) >= Decimal::ZERO && self.quarter_remaining_time(key) >= 0
    }

    /// Talent hired in `key` or any earlier quarter.
    pub fn team_through(&self, key: QuarterKey) -> Vec<TalentCandidate> {
        self.quarters
            .iter()
            .filter(|(k, _)| *k <= key)
            .filter_map(|(_, q)| q.talent_hired.clone())
            .collect()
    }

    /// Revenue of completed quarters strictly before `key`.
    pub fn revenue_before(&self, key: QuarterKey) -> Decimal {
        self.quarters
            .iter()
            .filter(|(k, _)| *k < key)
            .filter_map(|(_, q)| q.results.as_ref().map(|r| r.revenue))
            .sum()
    }

    /// All four results once every quarter has completed.
    pub fn quarter_results(&self) -> Option<[QuarterResult; 4]> {
        Some([
            self.quarters.q1.results.clone()?,
            self.quarters.q2.results.clone()?,
            self.quarters.q3.results.clone()?,
            self.quarters.q4.results.clone()?,
        ])
    }
}

/// Persisted document: enough to resume a run exactly where it stopped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub phase: Phase,
    pub context: SimulationContext,
}

impl SimulationSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
