use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uom::si::{
    capacitance::femtofarad,
    electric_current::nanoampere,
    electric_potential::volt,
    f64::{Capacitance, ElectricCurrent, ElectricPotential, Frequency, Length},
    frequency::megahertz,
    length::nanometer,
};

use crate::core::process::permittivity_from_relative;
use crate::core::{Device, ProcessConstants, RatioWindow};
use crate::error::{Error, Result};
use crate::optimization::{ObjectiveWeights, OptimizationProblem, RunBudget, SolverKey};
use crate::simulation::{GridStudy, RunnerSettings};

/// Everything a run can be configured with. Every section is optional; an
/// empty file gives the AMS 0.35 µm defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub process: ProcessSection,
    pub objective: ObjectiveWeights,
    pub ratio: RatioWindow,
    pub optimization: OptimizationSection,
    pub simulation: SimulationSection,
    pub grid: GridSection,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.ratio.min > 0.0 && self.ratio.min <= self.ratio.max) {
            return Err(Error::Config(format!(
                "ratio window [{}, {}] is empty",
                self.ratio.min, self.ratio.max
            )));
        }
        self.optimization.problem()?;
        self.optimization.budget()?;
        Ok(())
    }
}

/// Process constants in the units a model card uses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessSection {
    pub vdd: f64,
    pub vth_n: f64,
    pub vth_p: f64,
    /// cm²/V·s
    pub mu_n: f64,
    pub mu_p: f64,
    pub tox_nm: f64,
    pub eps_r: f64,
    pub c_load_ff: f64,
    pub freq_mhz: f64,
    pub i_leak_na: f64,
    pub delay_coefficient: f64,
    pub layout_factor: f64,
}

impl Default for ProcessSection {
    fn default() -> Self {
        Self {
            vdd: 3.3,
            vth_n: 0.498,
            vth_p: 0.6915,
            mu_n: 475.8,
            mu_p: 148.2,
            tox_nm: 7.575,
            eps_r: 3.9,
            c_load_ff: 10.0,
            freq_mhz: 100.0,
            i_leak_na: 10.0,
            delay_coefficient: 0.69,
            layout_factor: 3.0,
        }
    }
}

impl ProcessSection {
    pub fn constants(&self) -> ProcessConstants {
        ProcessConstants {
            supply_voltage: ElectricPotential::new::<volt>(self.vdd),
            nmos: Device::from_model_card(self.vth_n, self.mu_n),
            pmos: Device::from_model_card(self.vth_p, self.mu_p),
            oxide_thickness: Length::new::<nanometer>(self.tox_nm),
            oxide_permittivity: permittivity_from_relative(self.eps_r),
            load_capacitance: Capacitance::new::<femtofarad>(self.c_load_ff),
            switching_frequency: Frequency::new::<megahertz>(self.freq_mhz),
            leakage_current: ElectricCurrent::new::<nanoampere>(self.i_leak_na),
            delay_coefficient: self.delay_coefficient,
            layout_factor: self.layout_factor,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationSection {
    pub lower_bounds: Vec<f64>,
    pub upper_bounds: Vec<f64>,
    pub initial_point: Vec<f64>,
    pub max_evaluations: usize,
    pub max_wall_clock_s: u64,
    pub progress_report_interval: usize,
    pub persist_history: bool,
    pub history_file: PathBuf,
    pub parallel: bool,
    pub workers: Option<usize>,
    pub seed: Option<u64>,
    /// Environment variable holding the solver activation key.
    pub key_env: Option<String>,
}

impl Default for OptimizationSection {
    fn default() -> Self {
        let problem = OptimizationProblem::inverter();
        let budget = RunBudget::default();
        Self {
            lower_bounds: problem.lower_bounds().to_vec(),
            upper_bounds: problem.upper_bounds().to_vec(),
            initial_point: problem.initial_point().to_vec(),
            max_evaluations: budget.max_evaluations,
            max_wall_clock_s: budget.max_wall_clock.as_secs(),
            progress_report_interval: budget.progress_report_interval,
            persist_history: budget.persist_history,
            history_file: PathBuf::from("optimization_history.json"),
            parallel: budget.parallel,
            workers: None,
            seed: None,
            key_env: None,
        }
    }
}

impl OptimizationSection {
    pub fn problem(&self) -> Result<OptimizationProblem> {
        OptimizationProblem::new(
            self.lower_bounds.clone(),
            self.upper_bounds.clone(),
            self.initial_point.clone(),
            RatioWindow::CONSTRAINT_COUNT,
        )
    }

    pub fn budget(&self) -> Result<RunBudget> {
        let budget = RunBudget {
            max_evaluations: self.max_evaluations,
            max_wall_clock: Duration::from_secs(self.max_wall_clock_s),
            progress_report_interval: self.progress_report_interval,
            persist_history: self.persist_history,
            parallel: self.parallel,
            workers: self.workers,
        };
        budget.validate()?;
        Ok(budget)
    }

    /// Reads the key from `key_env`; no variable configured or set means no key.
    pub fn solver_key(&self) -> SolverKey {
        self.key_env
            .as_deref()
            .and_then(|name| env::var(name).ok())
            .map(SolverKey::new)
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    pub program: String,
    /// `{netlist}` and `{log}` are substituted per run.
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Defaults to `<working_dir>/sim_output`.
    pub output_dir: Option<PathBuf>,
    /// Relative paths resolve against `working_dir`.
    pub template: PathBuf,
    pub library: Option<PathBuf>,
    pub run_timeout_s: u64,
    pub wait_timeout_s: u64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        let runner = RunnerSettings::ngspice("ltspice");
        Self {
            program: runner.program,
            args: runner.args,
            working_dir: runner.working_dir,
            output_dir: None,
            template: PathBuf::from("inverter_cmos.cir"),
            library: Some(PathBuf::from("5827_035.lib")),
            run_timeout_s: runner.run_timeout.as_secs(),
            wait_timeout_s: runner.wait_timeout.as_secs(),
        }
    }
}

impl SimulationSection {
    pub fn template_path(&self) -> PathBuf {
        self.working_dir.join(&self.template)
    }

    pub fn runner_settings(&self) -> RunnerSettings {
        RunnerSettings {
            program: self.program.clone(),
            args: self.args.clone(),
            working_dir: self.working_dir.clone(),
            output_dir: self
                .output_dir
                .clone()
                .unwrap_or_else(|| self.working_dir.join("sim_output")),
            library: self.library.as_ref().map(|lib| self.working_dir.join(lib)),
            run_timeout: Duration::from_secs(self.run_timeout_s),
            wait_timeout: Duration::from_secs(self.wait_timeout_s),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSection {
    pub wn_values: Vec<f64>,
    pub wp_values: Vec<f64>,
    pub l_value: f64,
    pub results_file: PathBuf,
}

impl Default for GridSection {
    fn default() -> Self {
        let study = GridStudy::default();
        Self {
            wn_values: study.wn_values,
            wp_values: study.wp_values,
            l_value: study.l_value,
            results_file: study.results_file,
        }
    }
}

impl GridSection {
    pub fn study(&self, window: RatioWindow) -> GridStudy {
        GridStudy {
            wn_values: self.wn_values.clone(),
            wp_values: self.wp_values.clone(),
            l_value: self.l_value,
            window,
            results_file: self.results_file.clone(),
        }
    }
}
