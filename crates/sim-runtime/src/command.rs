//! Commands accepted by the simulation state machine.

use serde::{Deserialize, Serialize};
use sim_core::{
    BigBetOption, ImpactVector, QuarterKey, StrategyPatch, Tactic, TalentCandidate, WildcardEvent,
};

/// Every input the state machine understands. Quarter-scoped commands name
/// the quarter they target and are rejected unless it is the active one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    StartSimulation {
        user_id: String,
    },
    SetStrategy {
        patch: StrategyPatch,
    },
    CompleteStrategySession,
    AddTactic {
        quarter: QuarterKey,
        tactic: Tactic,
    },
    RemoveTactic {
        quarter: QuarterKey,
        tactic_id: String,
    },
    TriggerWildcard {
        quarter: QuarterKey,
        wildcard: WildcardEvent,
    },
    /// `impact` short-circuits the resolver when the caller already knows it.
    RespondToWildcard {
        quarter: QuarterKey,
        wildcard_id: String,
        choice_id: String,
        #[serde(default)]
        impact: Option<ImpactVector>,
    },
    HireTalent {
        quarter: QuarterKey,
        candidate: TalentCandidate,
    },
    MakeBigBet {
        quarter: QuarterKey,
        option: BigBetOption,
    },
    CompleteQuarter {
        quarter: QuarterKey,
    },
    CompleteDebrief,
    FinishSimulation,
    SaveSimulation,
    RestartSimulation,
}

impl Command {
    /// Stable name used in logs and rejections.
    pub fn name(&self) -> &'static str {
        match self {
            Command::StartSimulation { .. } => "START_SIMULATION",
            Command::SetStrategy { .. } => "SET_STRATEGY",
            Command::CompleteStrategySession => "COMPLETE_STRATEGY_SESSION",
            Command::AddTactic { .. } => "ADD_TACTIC",
            Command::RemoveTactic { .. } => "REMOVE_TACTIC",
            Command::TriggerWildcard { .. } => "TRIGGER_WILDCARD",
            Command::RespondToWildcard { .. } => "RESPOND_TO_WILDCARD",
            Command::HireTalent { .. } => "HIRE_TALENT",
            Command::MakeBigBet { .. } => "MAKE_BIG_BET",
            Command::CompleteQuarter { .. } => "COMPLETE_QUARTER",
            Command::CompleteDebrief => "COMPLETE_DEBRIEF",
            Command::FinishSimulation => "FINISH_SIMULATION",
            Command::SaveSimulation => "SAVE_SIMULATION",
            Command::RestartSimulation => "RESTART_SIMULATION",
        }
    }
}
