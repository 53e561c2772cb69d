use std::env;
use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use crossbeam::channel::{after, select, tick};
use log::{debug, info, warn};

use crate::error::{Error, Result};

/// Files left behind by a finished simulator run.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletedRun {
    pub netlist_file: PathBuf,
    pub log_file: Option<PathBuf>,
}

/// Submits one netlist to an external simulator and waits for it.
///
/// Implementations may be shared between threads but are expected to run one
/// simulation at a time.
pub trait SimulationRunner: Send + Sync {
    fn is_available(&self) -> bool;

    /// Name shown when the simulator cannot be found.
    fn program(&self) -> &str {
        "simulator"
    }

    /// Writes `netlist` under a name derived from `name`, runs it and returns
    /// the produced files. Fails on non-zero exit, timeout or missing run.
    fn run(&self, name: &str, netlist: &str) -> Result<CompletedRun>;
}

/// How to launch the simulator.
#[derive(Clone, Debug)]
pub struct RunnerSettings {
    pub program: String,
    /// Arguments; `{netlist}` and `{log}` are replaced with the file paths.
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Technology library copied into `output_dir` before the first run.
    pub library: Option<PathBuf>,
    /// The process is killed past this limit.
    pub run_timeout: Duration,
    /// Total wait for a run, including the time it takes to die once killed.
    pub wait_timeout: Duration,
}

impl RunnerSettings {
    /// ngspice in batch mode writing its output to `{log}`.
    pub fn ngspice(working_dir: impl Into<PathBuf>) -> Self {
        let working_dir = working_dir.into();
        Self {
            program: "ngspice".into(),
            args: vec!["-b".into(), "-o".into(), "{log}".into(), "{netlist}".into()],
            output_dir: working_dir.join("sim_output"),
            working_dir,
            library: None,
            run_timeout: Duration::from_secs(120),
            wait_timeout: Duration::from_secs(130),
        }
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs a command-line SPICE simulator as a child process.
pub struct SpiceProcessRunner {
    settings: RunnerSettings,
    // Serializes runs and numbers them.
    runs: Mutex<u64>,
    staged: OnceLock<()>,
}

impl SpiceProcessRunner {
    pub fn new(settings: RunnerSettings) -> Result<Self> {
        if settings.run_timeout.is_zero() {
            return Err(Error::Config("simulation run timeout must be positive".into()));
        }
        if settings.wait_timeout <= settings.run_timeout {
            return Err(Error::Config(format!(
                "simulation wait timeout ({:?}) must exceed the run timeout ({:?})",
                settings.wait_timeout, settings.run_timeout
            )));
        }
        Ok(Self {
            settings,
            runs: Mutex::new(0),
            staged: OnceLock::new(),
        })
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    fn stage_once(&self) {
        self.staged.get_or_init(|| {
            if let Some(library) = &self.settings.library {
                match stage_library(library, &self.settings.output_dir) {
                    Ok(true) => info!("Staged {} into {}", library.display(), self.settings.output_dir.display()),
                    Ok(false) => debug!("{} already up to date", library.display()),
                    Err(e) => warn!("Failed to stage {}: {}", library.display(), e),
                }
            }
        });
    }

    fn command(&self, netlist: &Path, log: &Path) -> Command {
        let mut command = Command::new(&self.settings.program);
        for arg in &self.settings.args {
            let arg = arg
                .replace("{netlist}", &netlist.to_string_lossy())
                .replace("{log}", &log.to_string_lossy());
            command.arg(arg);
        }
        command.current_dir(&self.settings.working_dir);
        command
    }

    /// Waits for the child, killing it once the run timeout expires.
    fn wait(&self, name: &str, child: &mut Child) -> Result<ExitStatus> {
        let ticker = tick(POLL_INTERVAL);
        let run_deadline = after(self.settings.run_timeout);
        let wait_deadline = after(self.settings.wait_timeout);
        let mut killed = false;

        loop {
            let status = match child.try_wait() {
                Ok(status) => status,
                Err(e) => {
                    reap(child);
                    return Err(e.into());
                }
            };
            if let Some(status) = status {
                if killed {
                    return Err(Error::SimulationTimeout {
                        name: name.to_string(),
                        timeout: self.settings.run_timeout,
                    });
                }
                return Ok(status);
            }

            select! {
                recv(ticker) -> _ => {}
                recv(run_deadline) -> _ => {
                    warn!("Simulation '{}' exceeded {:?}, killing it", name, self.settings.run_timeout);
                    // Already exited between the poll and the kill is fine.
                    let _ = child.kill();
                    killed = true;
                }
                recv(wait_deadline) -> _ => {
                    warn!("Simulation '{}' did not finish within {:?}", name, self.settings.wait_timeout);
                    reap(child);
                    return Err(Error::NoCompletedRun(name.to_string()));
                }
            }
        }
    }
}

impl SimulationRunner for SpiceProcessRunner {
    fn is_available(&self) -> bool {
        find_program(&self.settings.program).is_some()
    }

    fn program(&self) -> &str {
        &self.settings.program
    }

    fn run(&self, name: &str, netlist: &str) -> Result<CompletedRun> {
        let mut runs = self
            .runs
            .lock()
            .map_err(|_| Error::NoCompletedRun(name.to_string()))?;
        *runs += 1;

        fs::create_dir_all(&self.settings.output_dir)?;
        self.stage_once();
        // The child runs in `working_dir`, so relative paths would resolve twice.
        let output_dir = fs::canonicalize(&self.settings.output_dir)?;

        let stem = format!("{}_{}", name, *runs);
        let netlist_file = output_dir.join(format!("{stem}.net"));
        let log_path = output_dir.join(format!("{stem}.log"));
        fs::write(&netlist_file, netlist)?;

        let console = File::create(output_dir.join(format!("{stem}.out")))?;
        let mut command = self.command(&netlist_file, &log_path);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::from(console.try_clone()?))
            .stderr(Stdio::from(console));

        debug!("Running {:?}", command);
        let mut child = command.spawn().map_err(|e| Error::SimulationFailed {
            name: stem.clone(),
            reason: format!("cannot start '{}': {}", self.settings.program, e),
        })?;

        let status = self.wait(&stem, &mut child)?;
        if !status.success() {
            return Err(Error::SimulationFailed {
                name: stem,
                reason: format!("simulator exited with {status}"),
            });
        }

        let log_file = find_log(&output_dir, &stem, &log_path);
        debug!("Simulation '{}' finished, log: {:?}", stem, log_file);

        Ok(CompletedRun { netlist_file, log_file })
    }
}

/// Kills the child and collects its exit status.
fn reap(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!("kill: {}", e);
    }
    if let Err(e) = child.wait() {
        warn!("Failed to reap simulator process {}: {}", child.id(), e);
    }
}

/// The expected log, or the first `<stem>*.log` the simulator wrote instead.
fn find_log(dir: &Path, stem: &str, expected: &Path) -> Option<PathBuf> {
    if expected.is_file() {
        return Some(expected.to_path_buf());
    }
    let pattern = dir.join(format!("{}*.log", glob::Pattern::escape(stem)));
    glob::glob(&pattern.to_string_lossy())
        .ok()?
        .filter_map(|entry| entry.ok())
        .find(|path| path.is_file())
}

/// Resolves `program` against `PATH` unless it already names a file.
pub fn find_program(program: &str) -> Option<PathBuf> {
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return direct.is_file().then(|| direct.to_path_buf());
    }
    let paths = env::var_os("PATH").unwrap_or_else(OsString::new);
    env::split_paths(&paths).find_map(|dir| {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        let exe = candidate.with_extension("exe");
        exe.is_file().then_some(exe)
    })
}

/// Copies `library` into `output_dir` when the copy there is missing or
/// older. Returns whether a copy happened.
pub fn stage_library(library: &Path, output_dir: &Path) -> Result<bool> {
    if !library.is_file() {
        return Ok(false);
    }
    let Some(file_name) = library.file_name() else {
        return Ok(false);
    };
    fs::create_dir_all(output_dir)?;
    let destination = output_dir.join(file_name);

    let stale = match fs::metadata(&destination) {
        Ok(dst) => fs::metadata(library)?.modified()? > dst.modified()?,
        Err(_) => true,
    };
    if stale {
        fs::copy(library, &destination)?;
    }
    Ok(stale)
}
