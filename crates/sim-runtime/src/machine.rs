//! Host that owns the current state, the configuration and the random source.

use crate::{apply, Command, Env, Rejection, SimulationState};
use persistence::{LeaderboardEntry, SimulationStore, StoreError};
use sim_core::{
    BigBetOption, ImpactVector, Phase, QuarterKey, RandomSource, SeededRandom, SimConfig,
    SimulationContext, SimulationSnapshot, StrategyPatch, Tactic, TalentCandidate, WildcardEvent,
};
use tracing::{debug, info, warn};

pub struct Simulation {
    state: SimulationState,
    config: SimConfig,
    rng: Box<dyn RandomSource>,
    last_rejection: Option<Rejection>,
}

impl Simulation {
    /// Idle simulation seeded from `config.rng_seed`.
    pub fn new(config: SimConfig) -> Self {
        let rng = Box::new(SeededRandom::new(config.rng_seed));
        Self::with_random(config, rng)
    }

    pub fn with_random(config: SimConfig, rng: Box<dyn RandomSource>) -> Self {
        Self {
            state: SimulationState::Idle,
            config,
            rng,
            last_rejection: None,
        }
    }

    /// Continue a run from a snapshot, in the phase it was saved in.
    ///
    /// Snapshots do not record the random stream's position. The caller
    /// supplies the source for the rest of the run.
    pub fn resume(snapshot: SimulationSnapshot, config: SimConfig, rng: Box<dyn RandomSource>) -> Self {
        info!(
            simulation = %snapshot.context.simulation_id,
            phase = ?snapshot.phase,
            "resuming simulation"
        );
        let mut sim = Self::with_random(config, rng);
        sim.state = SimulationState::from_snapshot(snapshot);
        sim
    }

    /// Load `simulation_id` from `store` and resume it with `rng`.
    pub fn load(
        store: &dyn SimulationStore,
        simulation_id: &str,
        config: SimConfig,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self, StoreError> {
        let snapshot = store.load(simulation_id)?;
        Ok(Self::resume(snapshot, config, rng))
    }

    /// Apply a command. Rejected commands leave the state alone and are
    /// reported through [`Simulation::last_rejection`].
    pub fn dispatch(&mut self, command: Command) -> Option<&SimulationContext> {
        let mut env = Env {
            config: &self.config,
            rng: self.rng.as_mut(),
        };
        match apply(&self.state, &command, &mut env) {
            Ok(next) => {
                let (from, to) = (self.state.phase(), next.phase());
                if from != to {
                    info!(command = command.name(), ?from, ?to, "phase transition");
                }
                self.state = next;
                self.last_rejection = None;
            }
            Err(reason) => {
                debug!(command = command.name(), %reason, "command rejected");
                self.last_rejection = Some(reason);
            }
        }
        self.state.context()
    }

    pub fn start(&mut self, user_id: impl Into<String>) -> Option<&SimulationContext> {
        self.dispatch(Command::StartSimulation { user_id: user_id.into() })
    }

    pub fn set_strategy(&mut self, patch: StrategyPatch) -> Option<&SimulationContext> {
        self.dispatch(Command::SetStrategy { patch })
    }

    pub fn complete_strategy_session(&mut self) -> Option<&SimulationContext> {
        self.dispatch(Command::CompleteStrategySession)
    }

    pub fn add_tactic(&mut self, quarter: QuarterKey, tactic: Tactic) -> Option<&SimulationContext> {
        self.dispatch(Command::AddTactic { quarter, tactic })
    }

    pub fn remove_tactic(
        &mut self,
        quarter: QuarterKey,
        tactic_id: impl Into<String>,
    ) -> Option<&SimulationContext> {
        self.dispatch(Command::RemoveTactic {
            quarter,
            tactic_id: tactic_id.into(),
        })
    }

    pub fn trigger_wildcard(
        &mut self,
        quarter: QuarterKey,
        wildcard: WildcardEvent,
    ) -> Option<&SimulationContext> {
        self.dispatch(Command::TriggerWildcard { quarter, wildcard })
    }

    pub fn respond_to_wildcard(
        &mut self,
        quarter: QuarterKey,
        wildcard_id: impl Into<String>,
        choice_id: impl Into<String>,
        impact: Option<ImpactVector>,
    ) -> Option<&SimulationContext> {
        self.dispatch(Command::RespondToWildcard {
            quarter,
            wildcard_id: wildcard_id.into(),
            choice_id: choice_id.into(),
            impact,
        })
    }

    pub fn hire_talent(
        &mut self,
        quarter: QuarterKey,
        candidate: TalentCandidate,
    ) -> Option<&SimulationContext> {
        self.dispatch(Command::HireTalent { quarter, candidate })
    }

    pub fn make_big_bet(&mut self, quarter: QuarterKey, option: BigBetOption) -> Option<&SimulationContext> {
        self.dispatch(Command::MakeBigBet { quarter, option })
    }

    pub fn complete_quarter(&mut self, quarter: QuarterKey) -> Option<&SimulationContext> {
        self.dispatch(Command::CompleteQuarter { quarter })
    }

    pub fn complete_debrief(&mut self) -> Option<&SimulationContext> {
        self.dispatch(Command::CompleteDebrief)
    }

    pub fn finish(&mut self) -> Option<&SimulationContext> {
        self.dispatch(Command::FinishSimulation)
    }

    pub fn restart(&mut self) -> Option<&SimulationContext> {
        self.dispatch(Command::RestartSimulation)
    }

    /// Persist the current snapshot. Idle simulations have nothing to save.
    /// A failed save leaves the state untouched.
    pub fn save(&mut self, store: &mut dyn SimulationStore) -> Result<(), StoreError> {
        self.dispatch(Command::SaveSimulation);
        let Some(snapshot) = self.state.snapshot() else {
            debug!("idle simulation, nothing to save");
            return Ok(());
        };
        store.save(&snapshot).map_err(|e| {
            warn!(simulation = %snapshot.context.simulation_id, error = %e, "save failed");
            e
        })
    }

    /// Put a scored run on the leaderboard and finish it.
    pub fn submit(
        &mut self,
        store: &mut dyn SimulationStore,
        username: &str,
    ) -> Result<LeaderboardEntry, StoreError> {
        let ctx = match &self.state {
            SimulationState::Debrief(ctx) | SimulationState::Completed(ctx) => ctx,
            other => {
                let id = other
                    .context()
                    .map(|c| c.simulation_id.clone())
                    .unwrap_or_default();
                return Err(StoreError::NotScored(id));
            }
        };
        let entry = store.submit_leaderboard(ctx, &ctx.user_id, username)?;
        if self.is_in_debrief() {
            self.finish();
        }
        Ok(entry)
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn context(&self) -> Option<&SimulationContext> {
        self.state.context()
    }

    pub fn snapshot(&self) -> Option<SimulationSnapshot> {
        self.state.snapshot()
    }

    /// Why the most recent command was rejected, cleared by the next success.
    pub fn last_rejection(&self) -> Option<&Rejection> {
        self.last_rejection.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.phase() == Phase::Idle
    }

    pub fn is_in_quarter(&self, quarter: QuarterKey) -> bool {
        self.phase() == Phase::Quarter(quarter)
    }

    pub fn is_in_debrief(&self) -> bool {
        self.phase() == Phase::Debrief
    }

    pub fn is_completed(&self) -> bool {
        self.phase() == Phase::Completed
    }

    pub fn current_quarter(&self) -> Option<QuarterKey> {
        match self.state {
            SimulationState::InQuarter(q, _) => Some(q),
            _ => None,
        }
    }
}
