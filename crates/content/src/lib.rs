#![deny(warnings)]

//! Content catalog: tactics, wildcard templates, talent and big-bet pools.
//!
//! The built-in tables can be extended or overridden by YAML content packs.
//! Every entry is validated on load; the engine treats everything returned
//! from here as immutable.

mod builtin;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{
    validate_big_bet, validate_tactic, validate_talent, validate_wildcard, BigBetOption,
    QuarterKey, RandomSource, SimulationContext, Tactic, TacticCategory, TalentCandidate,
    ValidationError, WildcardEvent,
};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Condition on the current context for an enhanced wildcard to fire.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum WildcardTrigger {
    #[default]
    Always,
    RevenueAbove(Decimal),
    MarketShareAbove(f64),
    SatisfactionBelow(f64),
}

impl WildcardTrigger {
    pub fn matches(&self, ctx: &SimulationContext) -> bool {
        match self {
            WildcardTrigger::Always => true,
            WildcardTrigger::RevenueAbove(v) => ctx.kpis.revenue > *v,
            WildcardTrigger::MarketShareAbove(v) => ctx.kpis.market_share > *v,
            WildcardTrigger::SatisfactionBelow(v) => ctx.kpis.customer_satisfaction < *v,
        }
    }
}

/// A context-sensitive wildcard bound to a quarter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnhancedWildcard {
    pub quarter: QuarterKey,
    #[serde(default)]
    pub trigger: WildcardTrigger,
    pub event: WildcardEvent,
}

/// Metadata for a content pack.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PackMeta {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// A YAML content pack. Entries replace built-ins with the same id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentPack {
    #[serde(default)]
    pub meta: Option<PackMeta>,
    #[serde(default)]
    pub tactics: Vec<Tactic>,
    #[serde(default)]
    pub wildcards: Vec<WildcardEvent>,
    #[serde(default)]
    pub enhanced_wildcards: Vec<EnhancedWildcard>,
    #[serde(default)]
    pub talent: Vec<TalentCandidate>,
    #[serde(default)]
    pub big_bets: Vec<BigBetOption>,
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("invalid content pack: {0}")]
    InvalidPack(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid entry {id}: {source}")]
    Invalid {
        id: String,
        #[source]
        source: ValidationError,
    },
}

impl From<std::io::Error> for ContentError {
    fn from(e: std::io::Error) -> Self {
        ContentError::Io(e.to_string())
    }
}

impl From<serde_yaml::Error> for ContentError {
    fn from(e: serde_yaml::Error) -> Self {
        ContentError::InvalidPack(e.to_string())
    }
}

fn checked<T>(id: &str, r: Result<(), ValidationError>, v: T) -> Result<T, ContentError> {
    r.map(|_| v).map_err(|source| ContentError::Invalid {
        id: id.to_string(),
        source,
    })
}

fn upsert<T>(items: &mut Vec<T>, item: T, id_of: impl Fn(&T) -> &str) {
    let id = id_of(&item).to_string();
    match items.iter_mut().find(|x| id_of(x) == id) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}

/// Static read-only content consumed by the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct Catalog {
    tactics: Vec<Tactic>,
    wildcards: Vec<WildcardEvent>,
    enhanced: Vec<EnhancedWildcard>,
    talent: Vec<TalentCandidate>,
    big_bets: Vec<BigBetOption>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// The shipped content.
    pub fn builtin() -> Self {
        Self {
            tactics: builtin::tactics(),
            wildcards: builtin::wildcards(),
            enhanced: builtin::enhanced_wildcards(),
            talent: builtin::talent_pool(),
            big_bets: builtin::big_bets(),
        }
    }

    /// An empty catalog, to be filled from packs only.
    pub fn empty() -> Self {
        Self {
            tactics: Vec::new(),
            wildcards: Vec::new(),
            enhanced: Vec::new(),
            talent: Vec::new(),
            big_bets: Vec::new(),
        }
    }

    /// Built-in content with one YAML pack applied on top.
    pub fn from_yaml_str(text: &str) -> Result<Self, ContentError> {
        let pack: ContentPack = serde_yaml::from_str(text)?;
        let mut catalog = Self::builtin();
        catalog.apply_pack(pack)?;
        Ok(catalog)
    }

    /// Validate and merge a pack. Nothing is merged if any entry is invalid.
    pub fn apply_pack(&mut self, pack: ContentPack) -> Result<(), ContentError> {
        let tactics = pack
            .tactics
            .into_iter()
            .map(|t| checked(&t.id.clone(), validate_tactic(&t), t))
            .collect::<Result<Vec<_>, _>>()?;
        let wildcards = pack
            .wildcards
            .into_iter()
            .map(|w| checked(&w.id.clone(), validate_wildcard(&w), w))
            .collect::<Result<Vec<_>, _>>()?;
        let enhanced = pack
            .enhanced_wildcards
            .into_iter()
            .map(|e| {
                let r = if e.event.sensitivity.is_some() {
                    validate_wildcard(&e.event)
                } else {
                    Err(ValidationError::MissingSensitivity(e.event.id.clone()))
                };
                checked(&e.event.id.clone(), r, e)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let talent = pack
            .talent
            .into_iter()
            .map(|t| checked(&t.id.clone(), validate_talent(&t), t))
            .collect::<Result<Vec<_>, _>>()?;
        let big_bets = pack
            .big_bets
            .into_iter()
            .map(|b| checked(&b.id.clone(), validate_big_bet(&b), b))
            .collect::<Result<Vec<_>, _>>()?;

        for t in tactics {
            upsert(&mut self.tactics, t, |x| &x.id);
        }
        for w in wildcards {
            upsert(&mut self.wildcards, w, |x| &x.id);
        }
        for e in enhanced {
            upsert(&mut self.enhanced, e, |x| &x.event.id);
        }
        for t in talent {
            upsert(&mut self.talent, t, |x| &x.id);
        }
        for b in big_bets {
            upsert(&mut self.big_bets, b, |x| &x.id);
        }
        Ok(())
    }

    /// Built-in content plus every `*.yaml` / `*.yml` pack in `root`, applied
    /// in file-name order.
    pub fn load_dir<P: AsRef<Path>>(root: P) -> Result<Self, ContentError> {
        let mut paths = Vec::new();
        for ent in fs::read_dir(root.as_ref())? {
            let path = ent?.path();
            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "yaml" || e == "yml")
                .unwrap_or(false);
            if path.is_file() && is_yaml {
                paths.push(path);
            }
        }
        paths.sort();
        let mut catalog = Self::builtin();
        for path in paths {
            let text = fs::read_to_string(&path)?;
            let pack: ContentPack = serde_yaml::from_str(&text)?;
            let id = pack
                .meta
                .as_ref()
                .map(|m| m.id.clone())
                .unwrap_or_else(|| path.display().to_string());
            catalog.apply_pack(pack)?;
            info!(pack = %id, "loaded content pack");
        }
        Ok(catalog)
    }

    pub fn tactics(&self) -> &[Tactic] {
        &self.tactics
    }

    pub fn tactic(&self, id: &str) -> Option<&Tactic> {
        self.tactics.iter().find(|t| t.id == id)
    }

    pub fn tactics_by_category(&self, category: TacticCategory) -> Vec<&Tactic> {
        self.tactics.iter().filter(|t| t.category == category).collect()
    }

    /// Baseline (non-enhanced) wildcards.
    pub fn wildcards(&self) -> &[WildcardEvent] {
        &self.wildcards
    }

    pub fn random_wildcard(&self, rng: &mut dyn RandomSource) -> Option<&WildcardEvent> {
        let i = rng.pick_index(self.wildcards.len())?;
        self.wildcards.get(i)
    }

    /// The first enhanced wildcard bound to `quarter` whose trigger matches
    /// and which the run has not already seen.
    pub fn enhanced_wildcard_for_quarter(
        &self,
        ctx: &SimulationContext,
        quarter: QuarterKey,
    ) -> Option<WildcardEvent> {
        let found = self
            .enhanced
            .iter()
            .filter(|e| e.quarter == quarter)
            .filter(|e| !ctx.wildcards.iter().any(|w| w.id == e.event.id))
            .find(|e| e.trigger.matches(ctx))
            .map(|e| e.event.clone());
        debug!(%quarter, found = ?found.as_ref().map(|w| &w.id), "enhanced wildcard lookup");
        found
    }

    pub fn talent(&self) -> &[TalentCandidate] {
        &self.talent
    }

    /// `n` distinct candidates drawn without replacement (fewer if the pool is smaller).
    pub fn random_talent_pool(&self, rng: &mut dyn RandomSource, n: usize) -> Vec<TalentCandidate> {
        let mut idx: Vec<usize> = (0..self.talent.len()).collect();
        let take = n.min(idx.len());
        for i in 0..take {
            let j = i + rng.pick_index(idx.len() - i).unwrap_or(0);
            idx.swap(i, j);
        }
        idx.into_iter()
            .take(take)
            .map(|i| self.talent[i].clone())
            .collect()
    }

    pub fn big_bets(&self) -> &[BigBetOption] {
        &self.big_bets
    }

    pub fn big_bet(&self, id: &str) -> Option<&BigBetOption> {
        self.big_bets.iter().find(|b| b.id == id)
    }
}
