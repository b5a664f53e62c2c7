//! Drives a complete run through [`Simulation`]'s command API.

use crate::planner::{choose_big_bet, choose_talent, choose_wildcard_choice, plan_quarter};
use crate::Weights;
use content::Catalog;
use sim_core::{FinalResults, QuarterKey, RandomSource, SimulationContext, StrategyPatch};
use sim_runtime::{Command, Rejection, Simulation, SimulationState};
use tracing::{debug, info};

/// Tunable autoplayer. The simulation's own random source resolves big bets;
/// `rng` passed to [`Autoplayer::play`] draws wildcards and talent pools.
#[derive(Clone, Debug)]
pub struct Autoplayer {
    pub weights: Weights,
    /// Chance of a baseline wildcard in quarters without an enhanced one.
    pub wildcard_chance: f64,
    pub talent_pool_size: usize,
}

impl Default for Autoplayer {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            wildcard_chance: 0.5,
            talent_pool_size: 3,
        }
    }
}

fn run(sim: &mut Simulation, command: Command) -> Result<(), Rejection> {
    sim.dispatch(command);
    match sim.last_rejection() {
        Some(r) => Err(r.clone()),
        None => Ok(()),
    }
}

fn active(sim: &Simulation, quarter: QuarterKey) -> Result<&SimulationContext, Rejection> {
    match sim.state() {
        SimulationState::InQuarter(q, ctx) if *q == quarter => Ok(ctx),
        _ => Err(Rejection::WrongPhase {
            command: "COMPLETE_QUARTER",
            phase: sim.phase(),
        }),
    }
}

impl Autoplayer {
    /// Play `quarter` to completion: answer a wildcard, hire, bet, fill with
    /// tactics, complete.
    pub fn play_quarter(
        &self,
        sim: &mut Simulation,
        catalog: &Catalog,
        rng: &mut dyn RandomSource,
        quarter: QuarterKey,
    ) -> Result<(), Rejection> {
        let w = &self.weights;

        let mut wildcard = catalog.enhanced_wildcard_for_quarter(active(sim, quarter)?, quarter);
        if wildcard.is_none() && rng.next_f64() < self.wildcard_chance {
            wildcard = catalog.random_wildcard(rng).cloned();
        }
        if let Some(event) = wildcard {
            run(sim, Command::TriggerWildcard { quarter, wildcard: event.clone() })?;
            let choice_id = choose_wildcard_choice(
                &event,
                active(sim, quarter)?,
                quarter,
                &sim.config().momentum,
                w,
            )
            .map(|c| c.id.clone())
            .ok_or_else(|| Rejection::UnknownWildcard(event.id.clone()))?;
            debug!(%quarter, wildcard = %event.id, choice = %choice_id, "answering wildcard");
            run(
                sim,
                Command::RespondToWildcard {
                    quarter,
                    wildcard_id: event.id,
                    choice_id,
                    impact: None,
                },
            )?;
        }

        let pool = catalog.random_talent_pool(rng, self.talent_pool_size);
        let hire = choose_talent(active(sim, quarter)?, quarter, &pool, sim.config().max_team_size, w).cloned();
        if let Some(candidate) = hire {
            run(sim, Command::HireTalent { quarter, candidate })?;
        }

        let bet = choose_big_bet(
            active(sim, quarter)?,
            quarter,
            catalog.big_bets(),
            &sim.config().big_bet,
            w,
        )
        .cloned();
        if let Some(option) = bet {
            run(sim, Command::MakeBigBet { quarter, option })?;
        }

        for tactic in plan_quarter(active(sim, quarter)?, quarter, catalog.tactics(), w) {
            run(sim, Command::AddTactic { quarter, tactic })?;
        }
        run(sim, Command::CompleteQuarter { quarter })
    }

    /// Start a fresh run, apply `strategy`, and play all four quarters.
    pub fn play(
        &self,
        sim: &mut Simulation,
        catalog: &Catalog,
        rng: &mut dyn RandomSource,
        user_id: &str,
        strategy: StrategyPatch,
    ) -> Result<FinalResults, Rejection> {
        run(sim, Command::StartSimulation { user_id: user_id.to_string() })?;
        run(sim, Command::SetStrategy { patch: strategy })?;
        run(sim, Command::CompleteStrategySession)?;
        for quarter in QuarterKey::ALL {
            self.play_quarter(sim, catalog, rng, quarter)?;
        }
        run(sim, Command::CompleteDebrief)?;
        let results = sim
            .context()
            .and_then(|c| c.final_results.clone())
            .ok_or(Rejection::NotScored)?;
        info!(score = results.overall_score, grade = %results.grade, "autoplay finished");
        Ok(results)
    }
}

/// [`Autoplayer::play`] with default tuning.
pub fn autoplay(
    sim: &mut Simulation,
    catalog: &Catalog,
    rng: &mut dyn RandomSource,
    user_id: &str,
    strategy: StrategyPatch,
) -> Result<FinalResults, Rejection> {
    Autoplayer::default().play(sim, catalog, rng, user_id, strategy)
}
