//! Event resolver: turns a wildcard choice or a big bet into a concrete impact.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sim_core::{
    BigBetConfig, BigBetOption, BigBetOutcome, ImpactVector, Kpis, MomentumConfig,
    RandomSource, TalentCandidate, WildcardEvent,
};
use thiserror::Error;
use tracing::debug;

/// Errors produced while resolving events.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ResolveError {
    /// The choice id is not one of the wildcard's choices.
    #[error("wildcard {wildcard_id} has no choice {choice_id}")]
    UnknownChoice {
        wildcard_id: String,
        choice_id: String,
    },
}

/// `1 + Σ(skill_multiplier - 1)` over the team, floored at 0.
pub fn team_strength(team: &[TalentCandidate]) -> f64 {
    let s = 1.0 + team.iter().map(|t| t.skill_multiplier - 1.0).sum::<f64>();
    s.max(0.0)
}

/// Momentum multiplier for the revenue earned in prior quarters.
pub fn momentum_factor(prior_revenue: Decimal, cfg: &MomentumConfig) -> f64 {
    if prior_revenue > cfg.revenue_threshold {
        cfg.multiplier
    } else {
        1.0
    }
}

/// The chosen choice's impact, unmodified.
pub fn resolve_choice(event: &WildcardEvent, choice_id: &str) -> Result<ImpactVector, ResolveError> {
    event
        .choice(choice_id)
        .map(|c| c.impact.clone())
        .ok_or_else(|| ResolveError::UnknownChoice {
            wildcard_id: event.id.clone(),
            choice_id: choice_id.to_string(),
        })
}

/// Impact of answering `event` with `choice_id`.
///
/// Baseline wildcards return the choice's impact as-is. Enhanced wildcards
/// scale it by momentum (when `prior_revenue` beats the threshold) and adjust
/// it when someone on `team` has a relevant specialty.
pub fn resolve_wildcard(
    event: &WildcardEvent,
    choice_id: &str,
    prior_revenue: Decimal,
    team: &[TalentCandidate],
    momentum: &MomentumConfig,
) -> Result<ImpactVector, ResolveError> {
    let base = resolve_choice(event, choice_id)?;
    let Some(sens) = &event.sensitivity else {
        return Ok(base);
    };
    let factor = if sens.momentum_sensitive {
        momentum_factor(prior_revenue, momentum)
    } else {
        1.0
    };
    let mut impact = base.scaled(factor);
    let relevant = team
        .iter()
        .any(|t| sens.relevant_talent.contains(&t.specialty));
    if relevant {
        impact = impact.talent_adjusted(sens.talent_factor);
    }
    debug!(wildcard = %event.id, choice = choice_id, factor, relevant, "resolved enhanced wildcard");
    Ok(impact)
}

fn unit(v: f64) -> f64 {
    v.max(0.0).min(1.0)
}

fn revenue_ratio(revenue: Decimal, benchmark: Decimal) -> f64 {
    if benchmark <= Decimal::ZERO {
        return if revenue > Decimal::ZERO { 1.0 } else { 0.0 };
    }
    revenue
        .checked_div(benchmark)
        .and_then(|r| r.to_f64())
        .unwrap_or(0.0)
}

/// Probability that a big bet succeeds, always within `[0.2, 0.9]`.
pub fn success_probability(option: &BigBetOption, kpis: &Kpis, cfg: &BigBetConfig) -> f64 {
    let market = unit(kpis.market_share / cfg.market_share_benchmark);
    let revenue = unit(revenue_ratio(kpis.revenue, cfg.revenue_benchmark));
    let satisfaction = unit(kpis.customer_satisfaction / 100.0);
    let p = (1.0 - option.risk) * 0.5 + market * 0.2 + revenue * 0.2 + satisfaction * 0.1;
    p.max(0.2).min(0.9)
}

/// Roll a big bet. On failure only a fraction of the potential is realised
/// (more with a stronger team) and satisfaction takes a one-time hit.
pub fn resolve_big_bet(
    option: &BigBetOption,
    kpis: &Kpis,
    team: &[TalentCandidate],
    cfg: &BigBetConfig,
    rng: &mut dyn RandomSource,
) -> BigBetOutcome {
    let p = success_probability(option, kpis, cfg);
    let roll = rng.next_f64();
    let success = roll < p;
    let actual_impact = if success {
        option.potential_impact.clone()
    } else {
        let salvage = unit(cfg.failure_fraction * team_strength(team));
        let mut i = option.potential_impact.scaled(salvage);
        i.customer_satisfaction -= cfg.failure_satisfaction_penalty;
        i
    };
    debug!(bet = %option.id, p, roll, success, "resolved big bet");
    BigBetOutcome {
        option_id: option.id.clone(),
        success,
        success_probability: p,
        roll,
        actual_impact,
    }
}
