use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use approx::assert_relative_eq;
use inverter_optimizer::simulation::runner::CompletedRun;
use inverter_optimizer::simulation::{
    run_study, CandidateEvaluator, GridSearch, GridStudy, SimulationEvaluator, SimulationOutcome,
    SimulationRunner,
};
use inverter_optimizer::{Error, ParameterVector, PerformanceEvaluator, Result};

const DECK: &str = "\
* CMOS inverter, AMS 0.35um
.include 5827_035.lib
.param Wn=1u Wp=3u L=0.35u
Vdd vdd 0 3.3
Vin in 0 PULSE(0 3.3 1n 10p 10p 2n 4n)
M1 out in 0 0 modn W={Wn} L={L}
M2 out in vdd vdd modp W={Wp} L={L}
Cl out 0 10f
.tran 1p 8n
.meas tran tphl TRIG v(in) VAL=1.65 RISE=1 TARG v(out) VAL=1.65 FALL=1
.meas tran tplh TRIG v(in) VAL=1.65 FALL=1 TARG v(out) VAL=1.65 RISE=1
.end
";

/// Fakes a simulator: reads the widths back out of the netlist and writes a
/// log whose delays shrink as the devices grow.
struct FakeSpice {
    dir: PathBuf,
    runs: Mutex<Vec<String>>,
}

impl FakeSpice {
    fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            runs: Mutex::new(Vec::new()),
        }
    }

    fn param(netlist: &str, name: &str) -> f64 {
        let line = netlist.lines().find(|l| l.starts_with(".param")).unwrap();
        let value = line
            .split_whitespace()
            .find_map(|tok| tok.strip_prefix(&format!("{name}=")))
            .unwrap();
        value.trim_end_matches('u').parse().unwrap()
    }
}

impl SimulationRunner for FakeSpice {
    fn is_available(&self) -> bool {
        true
    }

    fn run(&self, name: &str, netlist: &str) -> Result<CompletedRun> {
        let mut runs = self.runs.lock().unwrap();
        runs.push(netlist.to_string());
        let stem = format!("{}_{}", name, runs.len());

        let wn = Self::param(netlist, "Wn");
        let wp = Self::param(netlist, "Wp");
        let log = format!(
            "Circuit: * CMOS inverter\n\ntphl={:e} FROM 1e-09 TO 1.1e-09\ntplh={:e} FROM 3e-09 TO 3.1e-09\n",
            1e-10 / wn,
            1e-10 / wp
        );

        let netlist_file = self.dir.join(format!("{stem}.net"));
        let log_file = self.dir.join(format!("{stem}.log"));
        fs::write(&netlist_file, netlist)?;
        fs::write(&log_file, log)?;
        Ok(CompletedRun {
            netlist_file,
            log_file: Some(log_file),
        })
    }
}

struct NoSimulator;

impl SimulationRunner for NoSimulator {
    fn is_available(&self) -> bool {
        false
    }

    fn program(&self) -> &str {
        "ltspice"
    }

    fn run(&self, name: &str, _netlist: &str) -> Result<CompletedRun> {
        Err(Error::NoCompletedRun(name.to_string()))
    }
}

fn template(dir: &Path) -> PathBuf {
    let path = dir.join("inverter_cmos.cir");
    fs::write(&path, DECK).unwrap();
    path
}

#[test]
fn simulated_delay_follows_the_log() {
    let dir = tempfile::tempdir().unwrap();
    let evaluator = SimulationEvaluator::new(FakeSpice::new(dir.path()), template(dir.path()));

    let outcome = evaluator.evaluate(&ParameterVector::new(2.0, 6.0, 0.35));

    assert!(outcome.success);
    assert_relative_eq!(outcome.falling_delay_ns, 0.05, max_relative = 1e-9);
    assert_relative_eq!(outcome.rising_delay_ns, 0.1 / 6.0, max_relative = 1e-9);
    assert_relative_eq!(outcome.delay_ns, (0.05 + 0.1 / 6.0) / 2.0, max_relative = 1e-9);
}

#[test]
fn unavailable_simulator_gives_penalty_outcome() {
    let evaluator = SimulationEvaluator::new(NoSimulator, "inverter_cmos.cir");
    let first = evaluator.evaluate(&ParameterVector::new(2.0, 6.0, 0.35));
    let second = evaluator.evaluate(&ParameterVector::new(2.0, 6.0, 0.35));
    assert_eq!(first, SimulationOutcome::failure());
    assert_eq!(first, second);
    assert_eq!(first.delay_ns, 1e6);
}

#[test]
fn grid_over_simulated_points() {
    let dir = tempfile::tempdir().unwrap();
    let evaluator = SimulationEvaluator::new(FakeSpice::new(dir.path()), template(dir.path()));

    let outcome = GridSearch::new(&evaluator).run(&[1.0, 2.0, 3.0], &[3.0, 6.0, 9.0], 0.35);
    let simulated: Vec<_> = outcome.trials.iter().map(|t| (t.params.wn, t.params.wp)).collect();
    assert_eq!(
        simulated,
        vec![(1.0, 3.0), (2.0, 3.0), (2.0, 6.0), (2.0, 9.0), (3.0, 6.0), (3.0, 9.0)]
    );
    assert_eq!(evaluator.runner().runs.lock().unwrap().len(), 6);

    let best = outcome.best.unwrap();
    let min = outcome
        .trials
        .iter()
        .map(|t| t.outcome.delay_ns)
        .fold(f64::INFINITY, f64::min);
    assert_eq!(best.delay_ns, min);
    assert_eq!(best.parameters, ParameterVector::new(3.0, 9.0, 0.35));
}

#[test]
fn study_writes_results_file() {
    let dir = tempfile::tempdir().unwrap();
    let evaluator = SimulationEvaluator::new(FakeSpice::new(dir.path()), template(dir.path()));
    let study = GridStudy {
        results_file: dir.path().join("ltspice_optim_results.txt"),
        ..GridStudy::default()
    };

    let report = run_study(&evaluator, &study, &PerformanceEvaluator::default()).unwrap();

    let text = fs::read_to_string(&study.results_file).unwrap();
    let best = report.outcome.best.unwrap();
    assert_eq!(
        text,
        format!("Wn=3.0\nWp=9.0\nL=0.35\ntpd_ns={:.3}\n", best.delay_ns)
    );
    let analytical = report.analytical.unwrap();
    assert_relative_eq!(analytical.area_um2(), 12.6, max_relative = 1e-9);
}

#[test]
fn study_refuses_to_run_without_simulator() {
    let evaluator = SimulationEvaluator::new(NoSimulator, "inverter_cmos.cir");
    let err = run_study(&evaluator, &GridStudy::default(), &PerformanceEvaluator::default()).unwrap_err();
    assert!(matches!(err, Error::ToolchainUnavailable(ref program) if program == "ltspice"));
}
