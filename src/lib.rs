//! Sizing optimizer for a single CMOS inverter stage.
//!
//! Candidates `(Wn, Wp, L)` are scored either by a closed-form square-law
//! model ([`core::PerformanceEvaluator`]) driven by a black-box [`Solver`],
//! or by running a SPICE testbench per candidate ([`simulation`]).

pub mod config;
pub mod core;
pub mod error;
pub mod optimization;
pub mod report;
pub mod simulation;

#[cfg(feature = "python")]
mod python;

pub use config::Config;
pub use self::core::*;
pub use error::{Error, Result};
pub use optimization::*;
pub use simulation::{CandidateEvaluator, SimulationEvaluator, SimulationOutcome, SpiceProcessRunner};
