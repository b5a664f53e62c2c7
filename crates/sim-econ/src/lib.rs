#![deny(warnings)]

//! Economic models for the marketing quarters simulation.
//!
//! Every function here is pure over its inputs:
//! - Event resolution for wildcard choices and big bets
//! - Quarter processing of tactics into a quarter result
//! - Final scoring, ROI and grade

pub mod processor;
pub mod resolver;
pub mod scoring;

pub use processor::{category_multiplier, process_quarter, tactic_impact, QuarterOutcome};
pub use resolver::{
    momentum_factor, resolve_big_bet, resolve_choice, resolve_wildcard, success_probability,
    team_strength, ResolveError,
};
pub use scoring::{grade_for, overall_score, roi, score};
