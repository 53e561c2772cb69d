use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;
use uom::si::{f64::Time, time::nanosecond, time::second};

use super::measure::{ExtractionChain, SimulationLog};
use super::netlist::CircuitTemplate;
use super::runner::SimulationRunner;
use super::units::{length_literal, width_literal};
use crate::core::sentinels::{MISSING_MEASUREMENT_S, SIMULATION_PENALTY_NS};
use crate::core::ParameterVector;
use crate::error::{Error, Result};

/// Result of one simulated candidate. Delays are in nanoseconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SimulationOutcome {
    pub success: bool,
    pub delay_ns: f64,
    /// Low-to-high output transition (`tplh`).
    pub rising_delay_ns: f64,
    /// High-to-low output transition (`tphl`).
    pub falling_delay_ns: f64,
}

impl SimulationOutcome {
    /// Every delay set to the penalty, so a failed run never wins a ranking.
    pub fn failure() -> Self {
        Self {
            success: false,
            delay_ns: SIMULATION_PENALTY_NS,
            rising_delay_ns: SIMULATION_PENALTY_NS,
            falling_delay_ns: SIMULATION_PENALTY_NS,
        }
    }

    fn from_measurements(tphl: Time, tplh: Time) -> Self {
        let tpd = (tphl + tplh) / 2.0;
        Self {
            success: true,
            delay_ns: tpd.get::<nanosecond>(),
            rising_delay_ns: tplh.get::<nanosecond>(),
            falling_delay_ns: tphl.get::<nanosecond>(),
        }
    }
}

/// Anything that turns a sizing into a simulated delay.
///
/// Never fails: problems are reported as [`SimulationOutcome::failure`].
pub trait CandidateEvaluator {
    fn evaluate(&self, params: &ParameterVector) -> SimulationOutcome;
}

/// Evaluates candidates by running the transient testbench in a simulator.
pub struct SimulationEvaluator<R> {
    runner: R,
    template: PathBuf,
    chain: ExtractionChain,
}

impl<R: SimulationRunner> SimulationEvaluator<R> {
    pub fn new(runner: R, template: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            template: template.into(),
            chain: ExtractionChain::default(),
        }
    }

    pub fn with_chain(mut self, chain: ExtractionChain) -> Self {
        self.chain = chain;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn template(&self) -> &Path {
        &self.template
    }

    /// One simulation, errors propagated.
    pub fn try_evaluate(&self, params: &ParameterVector) -> Result<SimulationOutcome> {
        let wn = width_literal(params.wn);
        let wp = width_literal(params.wp);
        let l = length_literal(params.l);

        let mut circuit = CircuitTemplate::load(&self.template)?;
        circuit.set_parameter("Wn", &wn);
        circuit.set_parameter("Wp", &wp);
        circuit.set_parameter("L", &l);

        let name = circuit.stem().to_string();
        debug!("Simulating {} with Wn={} Wp={} L={}", name, wn, wp, l);
        let run = self.runner.run(&name, &circuit.render())?;

        let log_file = run.log_file.ok_or_else(|| Error::MissingLog(name.clone()))?;
        let log = SimulationLog::read(&log_file)?;

        let tphl = self.measure(&log, "tphl");
        let tplh = self.measure(&log, "tplh");

        Ok(SimulationOutcome::from_measurements(tphl, tplh))
    }

    fn measure(&self, log: &SimulationLog, name: &str) -> Time {
        let seconds = self.chain.extract(log, name).unwrap_or_else(|| {
            warn!(
                "'{}' missing from {}, using {:e} s",
                name,
                log.path().display(),
                MISSING_MEASUREMENT_S
            );
            MISSING_MEASUREMENT_S
        });
        Time::new::<second>(seconds)
    }
}

impl<R: SimulationRunner> CandidateEvaluator for SimulationEvaluator<R> {
    fn evaluate(&self, params: &ParameterVector) -> SimulationOutcome {
        if !self.runner.is_available() {
            debug!("Simulator unavailable, penalizing {}", params);
            return SimulationOutcome::failure();
        }

        match panic::catch_unwind(AssertUnwindSafe(|| self.try_evaluate(params))) {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!("Simulation of {} failed: {}", params, e);
                SimulationOutcome::failure()
            }
            Err(_) => {
                warn!("Simulation of {} panicked", params);
                SimulationOutcome::failure()
            }
        }
    }
}
