use std::path::PathBuf;
use std::time::Duration;

/// Errors raised by the optimizer and the simulation plumbing.
///
/// Per-candidate simulation failures never reach a caller as an `Error`; the
/// simulation evaluator folds them into a penalty outcome. What surfaces here
/// is configuration-level trouble.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid optimization problem: {0}")]
    InvalidProblem(String),

    #[error("invalid run budget: {0}")]
    InvalidBudget(String),

    #[error("solver '{solver}' failed: {message}")]
    Solver { solver: String, message: String },

    #[error("circuit template not found at '{0}'")]
    MissingTemplate(PathBuf),

    #[error("simulator '{0}' is not available; install it or set `simulation.program` in the config")]
    ToolchainUnavailable(String),

    #[error("simulation '{name}' failed: {reason}")]
    SimulationFailed { name: String, reason: String },

    #[error("simulation '{name}' did not finish within {timeout:?}")]
    SimulationTimeout { name: String, timeout: Duration },

    #[error("simulation '{0}' produced no completed run")]
    NoCompletedRun(String),

    #[error("simulation log not found for '{0}'")]
    MissingLog(String),

    #[error("cannot read simulation log '{path}': {reason}")]
    Log { path: PathBuf, reason: String },
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
