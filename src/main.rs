use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use inverter_optimizer::config::Config;
use inverter_optimizer::core::{ParameterVector, PerformanceEvaluator};
use inverter_optimizer::optimization::{select_solver, InverterProblem, OptimizationDriver};
use inverter_optimizer::report;
use inverter_optimizer::simulation::{run_study, SimulationEvaluator, SpiceProcessRunner};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to TOML configuration file. Built-in AMS 0.35 µm defaults when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the analytical performance of one sizing.
    Evaluate {
        /// NMOS width (µm)
        #[arg(long, default_value_t = 2.0)]
        wn: f64,
        /// PMOS width (µm)
        #[arg(long, default_value_t = 6.0)]
        wp: f64,
        /// Channel length (µm)
        #[arg(short, long, default_value_t = 0.35)]
        l: f64,
    },
    /// Minimize the weighted delay/power/area objective.
    Optimize {
        /// Overrides `optimization.seed`.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Simulate a small width grid with the external SPICE simulator.
    Grid,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("reading {}", path.display()))?,
        None => Config::default(),
    };
    let evaluator = PerformanceEvaluator::new(config.process.constants());

    match args.command {
        Command::Evaluate { wn, wp, l } => {
            let params = ParameterVector::new(wn, wp, l);
            print!("{}", report::performance(&params, &evaluator.evaluate(&params)));
        }
        Command::Optimize { seed } => {
            let definition = config.optimization.problem()?;
            let budget = config.optimization.budget()?;
            let (solver, reason) = select_solver(&definition, seed.or(config.optimization.seed));
            log::info!("{}", reason);

            let problem = InverterProblem::new(definition, evaluator)?
                .with_weights(config.objective)
                .with_window(config.ratio);

            println!("{}", "=".repeat(60));
            println!("CMOS inverter optimization");
            println!("Variables: Wn, Wp, L (µm)");
            println!(
                "Objective: minimize {}*delay + {}*power + {}*area",
                config.objective.delay, config.objective.power, config.objective.area
            );
            println!("{}", "=".repeat(60));

            let mut driver = OptimizationDriver::new(solver)
                .with_key(config.optimization.solver_key())
                .with_history_path(&config.optimization.history_file);
            let outcome = driver.run(&problem, &budget)?;
            print!("\n{}", report::optimization(&outcome));
        }
        Command::Grid => {
            let runner = SpiceProcessRunner::new(config.simulation.runner_settings())?;
            let simulator = SimulationEvaluator::new(runner, config.simulation.template_path());
            let study = config.grid.study(config.ratio);

            println!("{}", "=".repeat(60));
            println!("CMOS inverter optimization via {}", config.simulation.program);
            println!("{}", "=".repeat(60));

            let outcome = run_study(&simulator, &study, &evaluator)?;
            print!("\n{}", report::grid(&outcome));
        }
    }

    Ok(())
}
