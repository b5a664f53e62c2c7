//! Single-decision heuristics. Each function looks at the context and
//! returns what it would do, without touching the simulation.

use crate::{channel_fit, net_utility, thousands, utility, Weights};
use rust_decimal::Decimal;
use sim_core::{
    BigBetConfig, BigBetOption, MomentumConfig, QuarterKey, SimulationContext, Tactic,
    TalentCandidate, WildcardChoice, WildcardEvent,
};
use sim_econ::{category_multiplier, resolve_wildcard, success_probability, team_strength};
use std::cmp::Ordering;

fn per_thousand(value: f64, cost: Decimal) -> f64 {
    value / thousands(cost).max(1.0)
}

fn by_score_desc<T>(a: &(f64, T), b: &(f64, T)) -> Ordering {
    b.0.total_cmp(&a.0)
}

/// Greedy tactic selection by utility per cost, within what is left of the
/// quarter's budget and time. Tactics already selected are skipped.
pub fn plan_quarter(
    ctx: &SimulationContext,
    quarter: QuarterKey,
    tactics: &[Tactic],
    w: &Weights,
) -> Vec<Tactic> {
    let team = ctx.team_through(quarter);
    let selected = &ctx.quarter(quarter).tactics;
    let mut budget = ctx.quarter_remaining_budget(quarter).min(ctx.remaining_budget);
    let mut time = ctx.quarter_remaining_time(quarter);

    let mut ranked: Vec<(f64, &Tactic)> = tactics
        .iter()
        .filter(|t| !selected.iter().any(|s| s.id == t.id))
        .map(|t| {
            let m = category_multiplier(&team, t.category);
            let u = utility(&t.expected_impact.scaled(m), w) * channel_fit(&ctx.strategy, t.category, w);
            (per_thousand(u, t.cost), t)
        })
        .filter(|(v, _)| *v > 0.0)
        .collect();
    ranked.sort_by(|a, b| by_score_desc(a, b).then_with(|| a.1.id.cmp(&b.1.id)));

    let mut plan = Vec::new();
    for (_, t) in ranked {
        let t_time = i64::from(t.time_required);
        if t.cost <= budget && t_time <= time {
            budget -= t.cost;
            time -= t_time;
            plan.push(t.clone());
        }
    }
    plan
}

/// Best affordable answer to `event`, judged on the impact the resolver would
/// actually apply. Falls back to the cheapest choice when nothing fits, since
/// the quarter cannot complete with the wildcard pending.
pub fn choose_wildcard_choice<'e>(
    event: &'e WildcardEvent,
    ctx: &SimulationContext,
    quarter: QuarterKey,
    momentum: &MomentumConfig,
    w: &Weights,
) -> Option<&'e WildcardChoice> {
    let team = ctx.team_through(quarter);
    let prior = ctx.revenue_before(quarter);
    let budget = ctx.quarter_remaining_budget(quarter);
    let time = ctx.quarter_remaining_time(quarter);

    let best = event
        .choices
        .iter()
        .filter(|c| c.cost <= budget && i64::from(c.time_required) <= time)
        .filter_map(|c| {
            let impact = resolve_wildcard(event, &c.id, prior, &team, momentum).ok()?;
            Some((net_utility(&impact, c.cost, w), c))
        })
        .min_by(by_score_desc)
        .map(|(_, c)| c);
    best.or_else(|| {
        event
            .choices
            .iter()
            .min_by(|a, b| a.cost.cmp(&b.cost).then(a.time_required.cmp(&b.time_required)))
    })
}

/// Most leverage per cost among affordable candidates not yet on the team.
/// Earlier hires pay off over more quarters.
pub fn choose_talent<'p>(
    ctx: &SimulationContext,
    quarter: QuarterKey,
    pool: &'p [TalentCandidate],
    max_team_size: usize,
    w: &Weights,
) -> Option<&'p TalentCandidate> {
    if ctx.quarter(quarter).talent_hired.is_some() || ctx.hired_talent.len() >= max_team_size {
        return None;
    }
    let budget = ctx.quarter_remaining_budget(quarter).min(ctx.remaining_budget);
    let quarters_left = (QuarterKey::ALL.len() - quarter.index()) as f64;
    pool.iter()
        .filter(|c| !ctx.hired_talent.iter().any(|h| h.id == c.id))
        .filter(|c| c.cost <= budget && c.skill_multiplier > 1.0)
        .map(|c| {
            let leverage = (c.skill_multiplier - 1.0) * channel_fit(&ctx.strategy, c.specialty, w) * quarters_left;
            (per_thousand(leverage, c.cost), c)
        })
        .min_by(by_score_desc)
        .map(|(_, c)| c)
}

/// Expected net utility of a big bet under the same odds and failure rule
/// the resolver applies.
pub fn expected_value(
    option: &BigBetOption,
    ctx: &SimulationContext,
    cfg: &BigBetConfig,
    w: &Weights,
) -> f64 {
    let p = success_probability(option, &ctx.kpis, cfg);
    let strength = team_strength(&ctx.team_through(QuarterKey::Q4));
    let salvage = (cfg.failure_fraction * strength).clamp(0.0, 1.0);
    let mut failure = option.potential_impact.scaled(salvage);
    failure.customer_satisfaction -= cfg.failure_satisfaction_penalty;
    p * utility(&option.potential_impact, w) + (1.0 - p) * utility(&failure, w)
        - thousands(option.cost) * w.revenue_per_1k
}

/// The affordable big bet with the highest positive expected value, if any.
/// Only meaningful in Q4 before a bet has been placed.
pub fn choose_big_bet<'o>(
    ctx: &SimulationContext,
    quarter: QuarterKey,
    options: &'o [BigBetOption],
    cfg: &BigBetConfig,
    w: &Weights,
) -> Option<&'o BigBetOption> {
    if quarter != QuarterKey::Q4 || ctx.selected_big_bet.is_some() {
        return None;
    }
    let budget = ctx.quarter_remaining_budget(quarter).min(ctx.remaining_budget);
    options
        .iter()
        .filter(|o| o.cost <= budget)
        .map(|o| (expected_value(o, ctx, cfg, w), o))
        .filter(|(ev, _)| *ev > 0.0)
        .min_by(by_score_desc)
        .map(|(_, o)| o)
}
