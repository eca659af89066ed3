use std::time::Duration;

use crate::error::ConfigError;

/// Widest meal-count spread the table master tolerates between the fastest
/// and the slowest diner.
pub const DEFAULT_MAX_DEVIATION: u64 = 10;

/// Consecutive failed attempts on one fork before the deadlock policy runs.
pub const DEFAULT_RETRY_BUDGET: u32 = 10;

/// Meals per wake cycle.
pub const DEFAULT_EAT_ITERATIONS: u32 = 3;

/// Eat-iteration multiplier for the very hungry diner.
pub const HUNGRY_ITERATION_FACTOR: u32 = 10;

// --- System Configuration ---

/// Configuration for a whole simulation run.
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// How long the simulation runs before shutdown.
    pub run_duration: Duration,

    /// Number of philosopher threads.
    pub philosopher_count: usize,

    /// Number of chairs. Independent of the philosopher count; fewer chairs
    /// than diners is the expected contention scenario.
    pub chair_count: usize,

    /// Make the first philosopher very hungry to stress the admission bound.
    pub very_hungry: bool,

    /// Admission threshold distance above the slowest diner's meal count.
    pub max_deviation: u64,

    /// Consecutive failed attempts on one fork before the deadlock policy
    /// is invoked.
    pub retry_budget: u32,

    /// Courtesy sleep between failed acquisition attempts.
    pub poll_interval: Duration,

    /// Seat ban handed out on admission refusal.
    pub ban_duration: Duration,

    /// Recovery backoff cap, per diner at the table.
    pub recovery_backoff_unit: Duration,

    /// How long shutdown waits for philosopher threads to finish.
    pub shutdown_timeout: Duration,

    /// Default time spent eating a meal.
    pub default_time_to_eat: Duration,

    /// Default sleep between wake cycles.
    pub default_time_to_sleep: Duration,

    /// Default reflection pause after a meal.
    pub default_time_to_reflect: Duration,

    /// Default meals per wake cycle.
    pub default_eat_iterations: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let philosopher_count = num_cpus::get().max(2);
        Self {
            run_duration: Duration::from_secs(60),
            philosopher_count,
            chair_count: philosopher_count,
            very_hungry: false,
            max_deviation: DEFAULT_MAX_DEVIATION,
            retry_budget: DEFAULT_RETRY_BUDGET,
            poll_interval: Duration::from_millis(1),
            ban_duration: Duration::from_millis(25),
            recovery_backoff_unit: Duration::from_millis(100),
            shutdown_timeout: Duration::from_secs(10),
            default_time_to_eat: Duration::from_millis(1),
            default_time_to_sleep: Duration::from_millis(10),
            default_time_to_reflect: Duration::from_millis(5),
            default_eat_iterations: DEFAULT_EAT_ITERATIONS,
        }
    }
}

impl SimulationConfig {
    /// Rejects configurations no simulation can run with. Checked once,
    /// before any thread starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chair_count == 0 {
            return Err(ConfigError::NoChairs);
        }
        if self.philosopher_count == 0 {
            return Err(ConfigError::NoPhilosophers);
        }
        if self.retry_budget == 0 {
            return Err(ConfigError::ZeroRetryBudget);
        }
        if self.default_eat_iterations == 0 {
            return Err(ConfigError::ZeroEatIterations);
        }
        Ok(())
    }

    /// Merge system defaults with a per-philosopher override.
    /// Fields the override leaves unset fall back to the system defaults.
    pub fn merge_with_philosopher_config(&self, overrides: &PhilosopherConfig) -> PhilosopherConfig {
        PhilosopherConfig {
            time_to_eat: overrides.time_to_eat.or(Some(self.default_time_to_eat)),
            time_to_sleep: overrides.time_to_sleep.or(Some(self.default_time_to_sleep)),
            time_to_reflect: overrides.time_to_reflect.or(Some(self.default_time_to_reflect)),
            eat_iterations: overrides.eat_iterations.or(Some(self.default_eat_iterations)),
        }
    }

    /// Override profile for the very hungry diner: many more meals per wake
    /// cycle and no reflection pause. Its appetite is throttled by the
    /// admission check, not by configuration.
    pub fn hungry_profile(&self) -> PhilosopherConfig {
        PhilosopherConfig {
            eat_iterations: Some(self.default_eat_iterations * HUNGRY_ITERATION_FACTOR),
            time_to_reflect: Some(Duration::ZERO),
            ..PhilosopherConfig::default()
        }
    }
}

// --- Philosopher Configuration ---

/// Per-philosopher overrides of the system-wide defaults.
#[derive(Clone, Debug, Default)]
pub struct PhilosopherConfig {
    /// Time spent eating one meal.
    pub time_to_eat: Option<Duration>,

    /// Sleep between wake cycles.
    pub time_to_sleep: Option<Duration>,

    /// Reflection pause after a meal.
    pub time_to_reflect: Option<Duration>,

    /// Meals per wake cycle.
    pub eat_iterations: Option<u32>,
}
