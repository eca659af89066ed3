use std::time::Duration;
use thiserror::Error;

/// Fatal misconfiguration. Rejected at construction time, before any
/// philosopher thread starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("a table needs at least one chair")]
    NoChairs,
    #[error("a simulation needs at least one philosopher")]
    NoPhilosophers,
    #[error("the fork retry budget must be at least 1")]
    ZeroRetryBudget,
    #[error("the eat iteration count must be at least 1")]
    ZeroEatIterations,
}

/// Errors while starting philosopher threads.
#[derive(Error, Debug)]
pub enum SpawnError {
    #[error("failed to spawn thread for {name}: {source}")]
    ThreadSpawn {
        name: String,
        source: std::io::Error,
    },
    #[error("simulation was already started")]
    AlreadyStarted,
}

/// Errors from the simulation lifecycle.
#[derive(Error, Debug)]
pub enum SystemError {
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    #[error("timed out after {0:?} waiting for philosophers to stop")]
    ShutdownTimeout(Duration),
    #[error("philosopher thread {0} panicked")]
    PhilosopherPanic(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
