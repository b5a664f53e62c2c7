//! Lifecycle states and the pure transition function.
//!
//! Every accepted command produces a fresh state; a rejected one leaves the
//! input untouched and reports why. The record of budget and time spent is
//! recomputed from scratch after each mutation, so
//! `remaining_budget == total_budget - Σ budget_spent` holds in every state.

use crate::Command;
use serde::{Deserialize, Serialize};
use sim_core::{
    validate_big_bet, validate_strategy, validate_talent, Phase, QuarterKey, RandomSource,
    ResolvedWildcard, SimConfig, SimulationContext, SimulationSnapshot, ValidationError,
};
use sim_econ::{process_quarter, resolve_big_bet, resolve_wildcard, score, ResolveError};
use thiserror::Error;
use tracing::{debug, info};

/// The simulation lifecycle. Every non-idle state owns its context.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "context", rename_all = "snake_case")]
pub enum SimulationState {
    #[default]
    Idle,
    StrategySession(SimulationContext),
    InQuarter(QuarterKey, SimulationContext),
    Debrief(SimulationContext),
    Completed(SimulationContext),
}

impl SimulationState {
    pub fn phase(&self) -> Phase {
        match self {
            SimulationState::Idle => Phase::Idle,
            SimulationState::StrategySession(_) => Phase::StrategySession,
            SimulationState::InQuarter(q, _) => Phase::Quarter(*q),
            SimulationState::Debrief(_) => Phase::Debrief,
            SimulationState::Completed(_) => Phase::Completed,
        }
    }

    pub fn context(&self) -> Option<&SimulationContext> {
        match self {
            SimulationState::Idle => None,
            SimulationState::StrategySession(c)
            | SimulationState::InQuarter(_, c)
            | SimulationState::Debrief(c)
            | SimulationState::Completed(c) => Some(c),
        }
    }

    /// Persistable view of the state; `None` while idle.
    pub fn snapshot(&self) -> Option<SimulationSnapshot> {
        self.context().map(|c| SimulationSnapshot {
            phase: self.phase(),
            context: c.clone(),
        })
    }

    /// Rebuild the state a snapshot was taken from.
    pub fn from_snapshot(snapshot: SimulationSnapshot) -> Self {
        let SimulationSnapshot { phase, context } = snapshot;
        match phase {
            Phase::Idle => SimulationState::Idle,
            Phase::StrategySession => SimulationState::StrategySession(context),
            Phase::Quarter(q) => SimulationState::InQuarter(q, context),
            Phase::Debrief => SimulationState::Debrief(context),
            Phase::Completed => SimulationState::Completed(context),
        }
    }
}

/// Why a command was not applied.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Rejection {
    /// The command does not apply in the current phase.
    #[error("{command} is not accepted in phase {phase:?}")]
    WrongPhase { command: &'static str, phase: Phase },
    /// A quarter-scoped command named a quarter other than the active one.
    #[error("{command} targets {requested} but {active} is active")]
    WrongQuarter {
        command: &'static str,
        requested: QuarterKey,
        active: QuarterKey,
    },
    /// The tactic id is already in the quarter.
    #[error("tactic {0} is already selected")]
    DuplicateTactic(String),
    /// Removal of a tactic the quarter does not hold.
    #[error("tactic {0} is not selected")]
    UnknownTactic(String),
    /// An unanswered wildcard blocks the command.
    #[error("wildcard {0} is still pending")]
    WildcardPending(String),
    /// The response names a wildcard that is not pending.
    #[error("no pending wildcard {0}")]
    UnknownWildcard(String),
    /// The resolver refused the response.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// The quarter has already used its hiring slot.
    #[error("{0} already has a hire")]
    SlotFilled(QuarterKey),
    /// The candidate was hired in an earlier quarter.
    #[error("talent {0} is already on the team")]
    AlreadyHired(String),
    /// The team is at `max_team_size`.
    #[error("team is full ({0} members)")]
    TeamFull(usize),
    /// Big bets can only be placed in Q4.
    #[error("big bets are only available in Q4")]
    BigBetOutsideQ4,
    /// The run already has a big bet.
    #[error("a big bet has already been made")]
    BigBetTaken,
    /// A strategy, hire or big bet failed validation.
    #[error("invalid entry: {0}")]
    Invalid(#[from] ValidationError),
    /// Scoring has not happened yet.
    #[error("simulation has no final results")]
    NotScored,
}

/// Everything a transition may consult besides the state itself.
pub struct Env<'a> {
    pub config: &'a SimConfig,
    pub rng: &'a mut dyn RandomSource,
}

/// Total transition: a rejected command returns `state` unchanged.
pub fn reduce(state: SimulationState, command: &Command, env: &mut Env<'_>) -> SimulationState {
    match apply(&state, command, env) {
        Ok(next) => next,
        Err(reason) => {
            debug!(command = command.name(), %reason, "command rejected");
            state
        }
    }
}

fn wrong_phase(command: &Command, state: &SimulationState) -> Rejection {
    Rejection::WrongPhase {
        command: command.name(),
        phase: state.phase(),
    }
}

/// Context of the active quarter, provided it is `requested`.
fn active_quarter<'s>(
    state: &'s SimulationState,
    command: &Command,
    requested: QuarterKey,
) -> Result<&'s SimulationContext, Rejection> {
    match state {
        SimulationState::InQuarter(q, ctx) if *q == requested => Ok(ctx),
        SimulationState::InQuarter(q, _) => Err(Rejection::WrongQuarter {
            command: command.name(),
            requested,
            active: *q,
        }),
        other => Err(wrong_phase(command, other)),
    }
}

fn settle(ctx: &mut SimulationContext, quarter: QuarterKey) {
    ctx.quarter_mut(quarter).recompute_ledger();
    ctx.recompute_budget();
}

fn enter_debrief(mut ctx: SimulationContext) -> Result<SimulationState, Rejection> {
    if ctx.final_results.is_none() {
        let results = ctx.quarter_results().ok_or(Rejection::NotScored)?;
        let final_results = score(&results, &ctx.kpis);
        info!(
            simulation = %ctx.simulation_id,
            score = final_results.overall_score,
            grade = %final_results.grade,
            "simulation scored"
        );
        ctx.final_results = Some(final_results);
    }
    Ok(SimulationState::Debrief(ctx))
}

/// Apply `command`, or explain why it does not apply.
pub fn apply(
    state: &SimulationState,
    command: &Command,
    env: &mut Env<'_>,
) -> Result<SimulationState, Rejection> {
    match command {
        Command::StartSimulation { user_id } => {
            let SimulationState::Idle = state else {
                return Err(wrong_phase(command, state));
            };
            let id = format!("sim-{:016x}", env.rng.next_u64());
            info!(simulation = %id, user = %user_id, "simulation started");
            Ok(SimulationState::StrategySession(SimulationContext::new(
                id,
                user_id.clone(),
                env.config,
            )))
        }
        Command::SetStrategy { patch } => {
            let SimulationState::StrategySession(ctx) = state else {
                return Err(wrong_phase(command, state));
            };
            let mut ctx = ctx.clone();
            ctx.strategy.merge(patch.clone());
            validate_strategy(&ctx.strategy)?;
            Ok(SimulationState::StrategySession(ctx))
        }
        Command::CompleteStrategySession => {
            let SimulationState::StrategySession(ctx) = state else {
                return Err(wrong_phase(command, state));
            };
            Ok(SimulationState::InQuarter(QuarterKey::Q1, ctx.clone()))
        }
        Command::AddTactic { quarter, tactic } => {
            let mut ctx = active_quarter(state, command, *quarter)?.clone();
            let data = ctx.quarter_mut(*quarter);
            if data.tactics.iter().any(|t| t.id == tactic.id) {
                return Err(Rejection::DuplicateTactic(tactic.id.clone()));
            }
            data.tactics.push(tactic.clone());
            settle(&mut ctx, *quarter);
            Ok(SimulationState::InQuarter(*quarter, ctx))
        }
        Command::RemoveTactic { quarter, tactic_id } => {
            let mut ctx = active_quarter(state, command, *quarter)?.clone();
            let data = ctx.quarter_mut(*quarter);
            let Some(pos) = data.tactics.iter().position(|t| t.id == *tactic_id) else {
                return Err(Rejection::UnknownTactic(tactic_id.clone()));
            };
            data.tactics.remove(pos);
            settle(&mut ctx, *quarter);
            Ok(SimulationState::InQuarter(*quarter, ctx))
        }
        Command::TriggerWildcard { quarter, wildcard } => {
            let mut ctx = active_quarter(state, command, *quarter)?.clone();
            let data = ctx.quarter_mut(*quarter);
            if let Some(pending) = &data.pending_wildcard {
                return Err(Rejection::WildcardPending(pending.id.clone()));
            }
            data.wildcards.push(wildcard.clone());
            data.pending_wildcard = Some(wildcard.clone());
            ctx.wildcards.push(wildcard.clone());
            debug!(quarter = %quarter, wildcard = %wildcard.id, "wildcard triggered");
            Ok(SimulationState::InQuarter(*quarter, ctx))
        }
        Command::RespondToWildcard {
            quarter,
            wildcard_id,
            choice_id,
            impact,
        } => {
            let mut ctx = active_quarter(state, command, *quarter)?.clone();
            let event = match &ctx.quarter(*quarter).pending_wildcard {
                Some(w) if w.id == *wildcard_id => w.clone(),
                _ => return Err(Rejection::UnknownWildcard(wildcard_id.clone())),
            };
            let choice = event
                .choice(choice_id)
                .cloned()
                .ok_or_else(|| ResolveError::UnknownChoice {
                    wildcard_id: wildcard_id.clone(),
                    choice_id: choice_id.clone(),
                })?;
            let impact = match impact {
                Some(i) => i.clone(),
                None => resolve_wildcard(
                    &event,
                    choice_id,
                    ctx.revenue_before(*quarter),
                    &ctx.team_through(*quarter),
                    &env.config.momentum,
                )?,
            };
            ctx.kpis.apply(&impact);
            let data = ctx.quarter_mut(*quarter);
            data.pending_wildcard = None;
            data.wildcard_impacts.push(ResolvedWildcard {
                wildcard_id: wildcard_id.clone(),
                choice_id: choice_id.clone(),
                cost: choice.cost,
                time_required: choice.time_required,
                impact,
            });
            settle(&mut ctx, *quarter);
            Ok(SimulationState::InQuarter(*quarter, ctx))
        }
        Command::HireTalent { quarter, candidate } => {
            let mut ctx = active_quarter(state, command, *quarter)?.clone();
            if ctx.quarter(*quarter).talent_hired.is_some() {
                return Err(Rejection::SlotFilled(*quarter));
            }
            if ctx.hired_talent.iter().any(|t| t.id == candidate.id) {
                return Err(Rejection::AlreadyHired(candidate.id.clone()));
            }
            if ctx.hired_talent.len() >= env.config.max_team_size {
                return Err(Rejection::TeamFull(ctx.hired_talent.len()));
            }
            validate_talent(candidate)?;
            ctx.quarter_mut(*quarter).talent_hired = Some(candidate.clone());
            ctx.hired_talent.push(candidate.clone());
            settle(&mut ctx, *quarter);
            info!(quarter = %quarter, talent = %candidate.id, "talent hired");
            Ok(SimulationState::InQuarter(*quarter, ctx))
        }
        Command::MakeBigBet { quarter, option } => {
            let mut ctx = active_quarter(state, command, *quarter)?.clone();
            if *quarter != QuarterKey::Q4 {
                return Err(Rejection::BigBetOutsideQ4);
            }
            if ctx.selected_big_bet.is_some() {
                return Err(Rejection::BigBetTaken);
            }
            validate_big_bet(option)?;
            let outcome = resolve_big_bet(
                option,
                &ctx.kpis,
                &ctx.team_through(*quarter),
                &env.config.big_bet,
                &mut *env.rng,
            );
            ctx.kpis.apply(&outcome.actual_impact);
            let data = ctx.quarter_mut(*quarter);
            data.big_bet = Some(option.clone());
            data.big_bet_outcome = Some(outcome.clone());
            ctx.selected_big_bet = Some(option.clone());
            ctx.big_bet_outcome = Some(outcome);
            settle(&mut ctx, *quarter);
            Ok(SimulationState::InQuarter(*quarter, ctx))
        }
        Command::CompleteQuarter { quarter } => {
            let mut ctx = active_quarter(state, command, *quarter)?.clone();
            if let Some(pending) = &ctx.quarter(*quarter).pending_wildcard {
                return Err(Rejection::WildcardPending(pending.id.clone()));
            }
            let outcome = process_quarter(ctx.quarter(*quarter), &ctx.team_through(*quarter), &ctx.kpis);
            info!(
                quarter = %quarter,
                revenue = %outcome.result.revenue,
                spent = %outcome.result.budget_spent,
                "quarter completed"
            );
            ctx.kpis = outcome.kpis;
            ctx.quarter_mut(*quarter).results = Some(outcome.result);
            ctx.recompute_budget();
            match quarter.next() {
                Some(next) => Ok(SimulationState::InQuarter(next, ctx)),
                None => enter_debrief(ctx),
            }
        }
        Command::CompleteDebrief => {
            let SimulationState::Debrief(ctx) = state else {
                return Err(wrong_phase(command, state));
            };
            enter_debrief(ctx.clone())
        }
        Command::FinishSimulation => {
            let SimulationState::Debrief(ctx) = state else {
                return Err(wrong_phase(command, state));
            };
            if ctx.final_results.is_none() {
                return Err(Rejection::NotScored);
            }
            Ok(SimulationState::Completed(ctx.clone()))
        }
        Command::SaveSimulation => Ok(state.clone()),
        Command::RestartSimulation => Ok(SimulationState::Idle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use sim_core::{
        BigBetOption, ImpactVector, ScriptedRandom, Tactic, TacticCategory, TalentCandidate,
        WildcardChoice, WildcardEvent, WildcardType,
    };

    fn tactic(id: &str, cost: i64, time: u32, revenue: i64, share: f64) -> Tactic {
        Tactic {
            id: id.into(),
            name: id.into(),
            category: TacticCategory::Digital,
            cost: Decimal::new(cost, 0),
            time_required: time,
            expected_impact: ImpactVector::new(Decimal::new(revenue, 0), share, 0.0, 0.0),
        }
    }

    fn wildcard(id: &str) -> WildcardEvent {
        WildcardEvent {
            id: id.into(),
            kind: WildcardType::Crisis,
            title: id.into(),
            description: String::new(),
            choices: vec![WildcardChoice {
                id: "absorb".into(),
                label: "Absorb it".into(),
                cost: Decimal::new(5_000, 0),
                time_required: 5,
                impact: ImpactVector::new(Decimal::new(-20_000, 0), -1.0, 0.0, 0.0),
            }],
            sensitivity: None,
        }
    }

    fn bet() -> BigBetOption {
        BigBetOption {
            id: "rebrand".into(),
            name: "Rebrand".into(),
            strategy: "Refresh the brand".into(),
            cost: Decimal::new(40_000, 0),
            risk: 0.4,
            potential_impact: ImpactVector::new(Decimal::new(100_000, 0), 2.0, 5.0, 10.0),
        }
    }

    fn hire(id: &str) -> TalentCandidate {
        TalentCandidate {
            id: id.into(),
            name: id.into(),
            specialty: TacticCategory::Digital,
            cost: Decimal::new(10_000, 0),
            skill_multiplier: 1.2,
        }
    }

    struct Harness {
        config: SimConfig,
        rng: ScriptedRandom,
        state: SimulationState,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                config: SimConfig::default(),
                rng: ScriptedRandom::new(vec![0.1]),
                state: SimulationState::Idle,
            }
        }

        fn send(&mut self, cmd: Command) -> &SimulationState {
            let mut env = Env {
                config: &self.config,
                rng: &mut self.rng,
            };
            self.state = reduce(std::mem::take(&mut self.state), &cmd, &mut env);
            &self.state
        }

        fn try_send(&mut self, cmd: Command) -> Result<(), Rejection> {
            let mut env = Env {
                config: &self.config,
                rng: &mut self.rng,
            };
            self.state = apply(&self.state, &cmd, &mut env)?;
            Ok(())
        }

        fn ctx(&self) -> &SimulationContext {
            self.state.context().unwrap()
        }

        fn in_q1() -> Self {
            let mut h = Self::new();
            h.send(Command::StartSimulation { user_id: "u1".into() });
            h.send(Command::CompleteStrategySession);
            h
        }

        fn complete(&mut self, q: QuarterKey) {
            self.try_send(Command::CompleteQuarter { quarter: q }).unwrap();
        }
    }

    #[test]
    fn lifecycle_walks_every_phase() {
        let mut h = Harness::new();
        assert_eq!(h.state.phase(), Phase::Idle);
        h.send(Command::StartSimulation { user_id: "u1".into() });
        assert_eq!(h.state.phase(), Phase::StrategySession);
        assert!(h.ctx().simulation_id.starts_with("sim-"));
        h.send(Command::CompleteStrategySession);
        for q in QuarterKey::ALL {
            assert_eq!(h.state.phase(), Phase::Quarter(q));
            h.complete(q);
        }
        assert_eq!(h.state.phase(), Phase::Debrief);
        assert!(h.ctx().final_results.is_some());
        h.send(Command::FinishSimulation);
        assert_eq!(h.state.phase(), Phase::Completed);
        h.send(Command::RestartSimulation);
        assert_eq!(h.state, SimulationState::Idle);
    }

    #[test]
    fn strategy_patch_merges_fields() {
        let mut h = Harness::new();
        h.send(Command::StartSimulation { user_id: "u1".into() });
        h.send(Command::SetStrategy {
            patch: sim_core::StrategyPatch {
                company_name: Some("Acme".into()),
                ..Default::default()
            },
        });
        h.send(Command::SetStrategy {
            patch: sim_core::StrategyPatch {
                industry: Some("Retail".into()),
                ..Default::default()
            },
        });
        assert_eq!(h.ctx().strategy.company_name, "Acme");
        assert_eq!(h.ctx().strategy.industry, "Retail");
    }

    #[test]
    fn over_allocated_strategy_is_rejected() {
        let mut h = Harness::new();
        h.send(Command::StartSimulation { user_id: "u1".into() });
        let allocation = [(TacticCategory::Digital, 70.0), (TacticCategory::Events, 40.0)]
            .into_iter()
            .collect();
        let err = h
            .try_send(Command::SetStrategy {
                patch: sim_core::StrategyPatch {
                    budget_allocation: Some(allocation),
                    ..Default::default()
                },
            })
            .unwrap_err();
        assert_eq!(err, Rejection::Invalid(ValidationError::InvalidAllocation));
        assert!(h.ctx().strategy.budget_allocation.is_empty());
    }

    #[test]
    fn two_tactics_roll_into_q1_results() {
        let mut h = Harness::in_q1();
        h.send(Command::AddTactic {
            quarter: QuarterKey::Q1,
            tactic: tactic("a", 50_000, 20, 80_000, 0.0),
        });
        h.send(Command::AddTactic {
            quarter: QuarterKey::Q1,
            tactic: tactic("b", 30_000, 15, 40_000, 0.0),
        });
        assert_eq!(h.ctx().remaining_budget, Decimal::new(420_000, 0));
        h.complete(QuarterKey::Q1);
        let ctx = h.ctx();
        assert_eq!(ctx.kpis.revenue, Decimal::new(120_000, 0));
        let q1 = ctx.quarter(QuarterKey::Q1);
        assert_eq!(q1.budget_spent, Decimal::new(80_000, 0));
        assert_eq!(q1.time_spent, 35);
        assert_eq!(q1.results.as_ref().unwrap().profit, Decimal::new(40_000, 0));
        assert_eq!(ctx.remaining_budget, Decimal::new(420_000, 0));
        assert_eq!(h.state.phase(), Phase::Quarter(QuarterKey::Q2));
    }

    #[test]
    fn removing_a_tactic_refunds_budget_and_time() {
        let mut h = Harness::in_q1();
        h.send(Command::AddTactic {
            quarter: QuarterKey::Q1,
            tactic: tactic("a", 50_000, 20, 80_000, 0.0),
        });
        h.send(Command::RemoveTactic {
            quarter: QuarterKey::Q1,
            tactic_id: "a".into(),
        });
        let ctx = h.ctx();
        assert_eq!(ctx.remaining_budget, ctx.total_budget);
        assert_eq!(ctx.quarter(QuarterKey::Q1).time_spent, 0);
    }

    #[test]
    fn duplicate_tactic_is_rejected() {
        let mut h = Harness::in_q1();
        let t = tactic("a", 50_000, 20, 80_000, 0.0);
        h.try_send(Command::AddTactic { quarter: QuarterKey::Q1, tactic: t.clone() })
            .unwrap();
        let err = h
            .try_send(Command::AddTactic { quarter: QuarterKey::Q1, tactic: t })
            .unwrap_err();
        assert_eq!(err, Rejection::DuplicateTactic("a".into()));
        assert_eq!(h.ctx().quarter(QuarterKey::Q1).tactics.len(), 1);
    }

    #[test]
    fn completing_a_future_quarter_is_a_no_op() {
        let mut h = Harness::in_q1();
        let before = h.state.clone();
        h.send(Command::CompleteQuarter { quarter: QuarterKey::Q3 });
        assert_eq!(h.state, before);
        let err = h
            .try_send(Command::CompleteQuarter { quarter: QuarterKey::Q3 })
            .unwrap_err();
        assert!(matches!(
            err,
            Rejection::WrongQuarter { requested: QuarterKey::Q3, active: QuarterKey::Q1, .. }
        ));
    }

    #[test]
    fn quarter_commands_outside_quarters_are_rejected() {
        let mut h = Harness::new();
        let err = h
            .try_send(Command::AddTactic {
                quarter: QuarterKey::Q1,
                tactic: tactic("a", 1, 1, 1, 0.0),
            })
            .unwrap_err();
        assert_eq!(
            err,
            Rejection::WrongPhase { command: "ADD_TACTIC", phase: Phase::Idle }
        );
        assert_eq!(h.state, SimulationState::Idle);
    }

    #[test]
    fn wildcard_in_q2_lowers_revenue_and_share() {
        let mut h = Harness::in_q1();
        h.send(Command::AddTactic {
            quarter: QuarterKey::Q1,
            tactic: tactic("a", 50_000, 20, 80_000, 2.5),
        });
        h.complete(QuarterKey::Q1);
        let before = h.ctx().kpis.clone();
        h.try_send(Command::TriggerWildcard {
            quarter: QuarterKey::Q2,
            wildcard: wildcard("supply"),
        })
        .unwrap();
        h.try_send(Command::RespondToWildcard {
            quarter: QuarterKey::Q2,
            wildcard_id: "supply".into(),
            choice_id: "absorb".into(),
            impact: None,
        })
        .unwrap();
        let ctx = h.ctx();
        assert_eq!(ctx.kpis.revenue, before.revenue - Decimal::new(20_000, 0));
        assert_eq!(ctx.kpis.market_share, 1.5);
        let q2 = ctx.quarter(QuarterKey::Q2);
        assert!(q2.pending_wildcard.is_none());
        assert_eq!(q2.wildcard_impacts.len(), 1);
        assert_eq!(q2.budget_spent, Decimal::new(5_000, 0));
        assert_eq!(ctx.wildcards.len(), 1);
    }

    #[test]
    fn wildcard_share_loss_clamps_at_zero() {
        let mut h = Harness::in_q1();
        h.complete(QuarterKey::Q1);
        h.send(Command::TriggerWildcard {
            quarter: QuarterKey::Q2,
            wildcard: wildcard("supply"),
        });
        h.send(Command::RespondToWildcard {
            quarter: QuarterKey::Q2,
            wildcard_id: "supply".into(),
            choice_id: "absorb".into(),
            impact: None,
        });
        assert_eq!(h.ctx().kpis.market_share, 0.0);
        assert_eq!(h.ctx().kpis.revenue, Decimal::new(-20_000, 0));
    }

    fn enhanced(id: &str) -> WildcardEvent {
        WildcardEvent {
            id: id.into(),
            kind: WildcardType::CompetitorAction,
            title: id.into(),
            description: String::new(),
            choices: vec![WildcardChoice {
                id: "counter".into(),
                label: "Counter".into(),
                cost: Decimal::ZERO,
                time_required: 0,
                impact: ImpactVector::new(Decimal::new(10_000, 0), 2.0, -4.0, 0.0),
            }],
            sensitivity: Some(sim_core::ContextSensitivity {
                momentum_sensitive: true,
                relevant_talent: vec![TacticCategory::Digital],
                talent_factor: 1.25,
            }),
        }
    }

    fn answer_enhanced_in_q2(h: &mut Harness) -> (sim_core::Kpis, sim_core::Kpis) {
        h.complete(QuarterKey::Q1);
        let before = h.ctx().kpis.clone();
        h.try_send(Command::TriggerWildcard {
            quarter: QuarterKey::Q2,
            wildcard: enhanced("competitor-launch"),
        })
        .unwrap();
        h.try_send(Command::RespondToWildcard {
            quarter: QuarterKey::Q2,
            wildcard_id: "competitor-launch".into(),
            choice_id: "counter".into(),
            impact: None,
        })
        .unwrap();
        (before, h.ctx().kpis.clone())
    }

    #[test]
    fn enhanced_wildcard_uses_momentum_and_team() {
        let mut h = Harness::new();
        h.config.starting_kpis.customer_satisfaction = 50.0;
        h.send(Command::StartSimulation { user_id: "u1".into() });
        h.send(Command::CompleteStrategySession);
        h.try_send(Command::HireTalent { quarter: QuarterKey::Q1, candidate: hire("growth") })
            .unwrap();
        h.try_send(Command::AddTactic {
            quarter: QuarterKey::Q1,
            tactic: tactic("search", 50_000, 20, 250_000, 0.0),
        })
        .unwrap();

        let (before, after) = answer_enhanced_in_q2(&mut h);
        assert!(h.ctx().revenue_before(QuarterKey::Q2) > h.config.momentum.revenue_threshold);
        // 1.2 momentum, then gains times 1.25 and losses divided by 1.25
        assert_eq!(after.revenue - before.revenue, Decimal::new(15_000, 0));
        assert_eq!(after.market_share, before.market_share + 2.0 * 1.2 * 1.25);
        assert_eq!(
            after.customer_satisfaction,
            before.customer_satisfaction + (-4.0 * 1.2) / 1.25
        );
        let applied = &h.ctx().quarter(QuarterKey::Q2).wildcard_impacts[0].impact;
        assert_eq!(applied.revenue, Decimal::new(15_000, 0));
    }

    #[test]
    fn enhanced_wildcard_without_momentum_or_team_is_unscaled() {
        let mut h = Harness::new();
        h.config.starting_kpis.customer_satisfaction = 50.0;
        h.send(Command::StartSimulation { user_id: "u1".into() });
        h.send(Command::CompleteStrategySession);

        let (before, after) = answer_enhanced_in_q2(&mut h);
        assert_eq!(after.revenue - before.revenue, Decimal::new(10_000, 0));
        assert_eq!(after.market_share, before.market_share + 2.0);
        assert_eq!(after.customer_satisfaction, before.customer_satisfaction - 4.0);
    }

    #[test]
    fn precomputed_wildcard_impact_is_used_as_is() {
        let mut h = Harness::in_q1();
        h.send(Command::TriggerWildcard {
            quarter: QuarterKey::Q1,
            wildcard: wildcard("supply"),
        });
        h.try_send(Command::RespondToWildcard {
            quarter: QuarterKey::Q1,
            wildcard_id: "supply".into(),
            choice_id: "absorb".into(),
            impact: Some(ImpactVector::new(Decimal::new(7_000, 0), 0.0, 0.0, 0.0)),
        })
        .unwrap();
        assert_eq!(h.ctx().kpis.revenue, Decimal::new(7_000, 0));
    }

    #[test]
    fn pending_wildcard_blocks_completion_and_second_trigger() {
        let mut h = Harness::in_q1();
        h.send(Command::TriggerWildcard {
            quarter: QuarterKey::Q1,
            wildcard: wildcard("supply"),
        });
        let err = h
            .try_send(Command::CompleteQuarter { quarter: QuarterKey::Q1 })
            .unwrap_err();
        assert_eq!(err, Rejection::WildcardPending("supply".into()));
        let err = h
            .try_send(Command::TriggerWildcard {
                quarter: QuarterKey::Q1,
                wildcard: wildcard("other"),
            })
            .unwrap_err();
        assert_eq!(err, Rejection::WildcardPending("supply".into()));
        let err = h
            .try_send(Command::RespondToWildcard {
                quarter: QuarterKey::Q1,
                wildcard_id: "supply".into(),
                choice_id: "nope".into(),
                impact: None,
            })
            .unwrap_err();
        assert!(matches!(err, Rejection::Resolve(ResolveError::UnknownChoice { .. })));
        assert!(h.ctx().quarter(QuarterKey::Q1).pending_wildcard.is_some());
    }

    #[test]
    fn one_hire_per_quarter_and_team_cap() {
        let mut h = Harness::in_q1();
        h.config.max_team_size = 2;
        h.try_send(Command::HireTalent { quarter: QuarterKey::Q1, candidate: hire("a") })
            .unwrap();
        assert_eq!(
            h.try_send(Command::HireTalent { quarter: QuarterKey::Q1, candidate: hire("b") }),
            Err(Rejection::SlotFilled(QuarterKey::Q1))
        );
        assert_eq!(h.ctx().remaining_budget, Decimal::new(490_000, 0));
        h.complete(QuarterKey::Q1);
        assert_eq!(
            h.try_send(Command::HireTalent { quarter: QuarterKey::Q2, candidate: hire("a") }),
            Err(Rejection::AlreadyHired("a".into()))
        );
        h.try_send(Command::HireTalent { quarter: QuarterKey::Q2, candidate: hire("b") })
            .unwrap();
        h.complete(QuarterKey::Q2);
        assert_eq!(
            h.try_send(Command::HireTalent { quarter: QuarterKey::Q3, candidate: hire("c") }),
            Err(Rejection::TeamFull(2))
        );
        assert_eq!(h.ctx().hired_talent.len(), 2);
    }

    #[test]
    fn big_bet_only_once_and_only_in_q4() {
        let mut h = Harness::in_q1();
        assert_eq!(
            h.try_send(Command::MakeBigBet { quarter: QuarterKey::Q1, option: bet() }),
            Err(Rejection::BigBetOutsideQ4)
        );
        for q in [QuarterKey::Q1, QuarterKey::Q2, QuarterKey::Q3] {
            h.complete(q);
        }
        h.try_send(Command::MakeBigBet { quarter: QuarterKey::Q4, option: bet() })
            .unwrap();
        assert_eq!(
            h.try_send(Command::MakeBigBet { quarter: QuarterKey::Q4, option: bet() }),
            Err(Rejection::BigBetTaken)
        );
        let ctx = h.ctx();
        let outcome = ctx.big_bet_outcome.as_ref().unwrap();
        // roll 0.1 sits under the 0.2 probability floor
        assert!(outcome.success);
        assert_eq!(ctx.kpis.revenue, Decimal::new(100_000, 0));
        assert_eq!(
            ctx.quarter(QuarterKey::Q4).budget_spent,
            Decimal::new(40_000, 0)
        );
        h.complete(QuarterKey::Q4);
        let q4 = h.ctx().quarter(QuarterKey::Q4).results.clone().unwrap();
        assert_eq!(q4.revenue, Decimal::new(100_000, 0));
    }

    #[test]
    fn debrief_completion_is_idempotent() {
        let mut h = Harness::in_q1();
        h.send(Command::AddTactic {
            quarter: QuarterKey::Q1,
            tactic: tactic("a", 50_000, 20, 80_000, 2.0),
        });
        for q in QuarterKey::ALL {
            h.complete(q);
        }
        let first = h.send(Command::CompleteDebrief).clone();
        let second = h.send(Command::CompleteDebrief).clone();
        assert_eq!(first, second);
        assert!(first.context().unwrap().final_results.is_some());
    }

    #[test]
    fn finish_requires_debrief() {
        let mut h = Harness::in_q1();
        assert!(matches!(
            h.try_send(Command::FinishSimulation),
            Err(Rejection::WrongPhase { .. })
        ));
    }

    #[test]
    fn snapshot_restores_the_same_state() {
        let mut h = Harness::in_q1();
        h.send(Command::AddTactic {
            quarter: QuarterKey::Q1,
            tactic: tactic("a", 50_000, 20, 80_000, 2.0),
        });
        h.complete(QuarterKey::Q1);
        h.send(Command::TriggerWildcard {
            quarter: QuarterKey::Q2,
            wildcard: wildcard("supply"),
        });
        h.send(Command::RespondToWildcard {
            quarter: QuarterKey::Q2,
            wildcard_id: "supply".into(),
            choice_id: "absorb".into(),
            impact: None,
        });
        h.complete(QuarterKey::Q2);
        let snap = h.state.snapshot().unwrap();
        let json = snap.to_json().unwrap();
        let back = SimulationSnapshot::from_json(&json).unwrap();
        assert_eq!(back, snap);
        assert_eq!(SimulationState::from_snapshot(back), h.state);

        let state_json = serde_json::to_string(&h.state).unwrap();
        let state_back: SimulationState = serde_json::from_str(&state_json).unwrap();
        assert_eq!(state_back, h.state);
    }

    #[test]
    fn save_leaves_state_untouched() {
        let mut h = Harness::in_q1();
        let before = h.state.clone();
        h.send(Command::SaveSimulation);
        assert_eq!(h.state, before);
    }

    fn op(code: u8, quarter: usize, idx: usize) -> Command {
        let quarter = QuarterKey::ALL[quarter];
        match code {
            0 | 1 => Command::AddTactic {
                quarter,
                tactic: tactic(&format!("t{idx}"), 5_000 * (idx as i64 + 1), 10, 9_000, 0.5),
            },
            2 => Command::RemoveTactic { quarter, tactic_id: format!("t{idx}") },
            3 => Command::TriggerWildcard { quarter, wildcard: wildcard(&format!("w{idx}")) },
            4 => Command::RespondToWildcard {
                quarter,
                wildcard_id: format!("w{idx}"),
                choice_id: "absorb".into(),
                impact: None,
            },
            5 => Command::HireTalent { quarter, candidate: hire(&format!("h{idx}")) },
            6 => Command::MakeBigBet { quarter, option: bet() },
            _ => Command::CompleteQuarter { quarter },
        }
    }

    proptest! {
        #[test]
        fn ledger_holds_under_any_command_sequence(
            ops in proptest::collection::vec((0u8..8, 0usize..4, 0usize..6), 0..80)
        ) {
            let mut h = Harness::in_q1();
            for (code, q, idx) in ops {
                h.send(op(code, q, idx));
                let ctx = h.ctx();
                let spent: Decimal = ctx.quarters.iter().map(|(_, d)| d.budget_spent).sum();
                prop_assert_eq!(ctx.remaining_budget, ctx.total_budget - spent);
                prop_assert!(ctx.hired_talent.len() <= h.config.max_team_size);
                let done: Vec<bool> = ctx.quarters.iter().map(|(_, d)| d.is_complete()).collect();
                prop_assert!(done.windows(2).all(|w| w[0] || !w[1]));
                prop_assert_eq!(
                    ctx.final_results.is_some(),
                    h.state.phase() == Phase::Debrief
                );
                prop_assert!((0.0..=100.0).contains(&ctx.kpis.market_share));
                for (_, d) in ctx.quarters.iter() {
                    let ids: std::collections::BTreeSet<&str> =
                        d.tactics.iter().map(|t| t.id.as_str()).collect();
                    prop_assert_eq!(ids.len(), d.tactics.len());
                }
            }
        }
    }
}
