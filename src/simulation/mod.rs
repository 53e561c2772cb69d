pub mod evaluator;
pub mod grid;
pub mod measure;
pub mod netlist;
pub mod runner;
pub mod units;

pub use evaluator::{CandidateEvaluator, SimulationEvaluator, SimulationOutcome};
pub use grid::{run_study, GridOutcome, GridReport, GridSearch, GridStudy, GridTrial};
pub use measure::{ExtractionChain, MeasureExtractor, PatternScan, SimulationLog, StructuredReader};
pub use netlist::CircuitTemplate;
pub use runner::{CompletedRun, RunnerSettings, SimulationRunner, SpiceProcessRunner};
