#![deny(warnings)]

//! Run-time state machine for the marketing quarters simulation.
//!
//! [`reduce`] is the pure transition function; [`Simulation`] wraps it with
//! the configuration, a random source and persistence hooks.

pub mod command;
pub mod machine;
pub mod state;

pub use command::Command;
pub use machine::Simulation;
pub use state::{apply, reduce, Env, Rejection, SimulationState};
