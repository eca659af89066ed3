use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::{PhilosopherConfig, SimulationConfig};
use crate::deadlock::{DeadlockPolicy, ReleaseAndBackoff};
use crate::error::{ConfigError, SpawnError, SystemError};
use crate::logging::{ActivityLog, TracingActivityLog};
use crate::master::{MealObserverMaster, TableMaster};
use crate::philosopher::Philosopher;
use crate::table::Table;

/// How often shutdown re-checks whether all philosopher threads finished.
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Lifecycle states of a [`Simulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecycleState {
    Created,
    Running,
    Stopping,
    Stopped,
}

/// Wires a table, its master, and a party of philosophers together, and
/// runs every philosopher on a dedicated OS thread.
///
/// Contention is never serialized here: threads coordinate only through the
/// table's atomic resource states, the master's counters, and one shared
/// stop flag.
pub struct Simulation {
    config: SimulationConfig,
    table: Arc<Table>,
    philosophers: Vec<Arc<Philosopher>>,
    shutdown_flag: Arc<AtomicBool>,
    state: Mutex<LifecycleState>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl Simulation {
    /// Builds a simulation with the default fairness master, deadlock
    /// policy, and activity log.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let backoff = config.recovery_backoff_unit * config.philosopher_count as u32;
        Self::new_with(
            config,
            Arc::new(ReleaseAndBackoff::new(backoff)),
            Arc::new(TracingActivityLog),
        )
    }

    /// Builds a simulation with injected deadlock and logging strategies.
    pub fn new_with(
        config: SimulationConfig,
        policy: Arc<dyn DeadlockPolicy>,
        log: Arc<dyn ActivityLog>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let master: Arc<dyn TableMaster> = Arc::new(MealObserverMaster::new(
            config.max_deviation,
            config.ban_duration,
        ));
        let table = Arc::new(Table::new(config.chair_count, master)?);

        let mut philosophers = Vec::with_capacity(config.philosopher_count);
        for index in 1..=config.philosopher_count {
            let hungry = config.very_hungry && index == 1;
            let name = if hungry {
                format!("Hungry-Philosopher-{index}")
            } else {
                format!("Philosopher-{index}")
            };
            let overrides = if hungry {
                config.hungry_profile()
            } else {
                PhilosopherConfig::default()
            };
            let philosopher = Philosopher::new(
                name,
                Arc::clone(&table),
                Arc::clone(&policy),
                Arc::clone(&log),
                &config,
                &overrides,
            )?;
            philosophers.push(Arc::new(philosopher));
        }

        Ok(Self {
            config,
            table,
            philosophers,
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(LifecycleState::Created),
            threads: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn philosophers(&self) -> &[Arc<Philosopher>] {
        &self.philosophers
    }

    /// Per-philosopher meal tallies, in seating order.
    pub fn meal_counts(&self) -> Vec<(String, u64)> {
        self.philosophers
            .iter()
            .map(|p| (p.name().to_string(), p.meal_count()))
            .collect()
    }

    /// Spawns one named thread per philosopher.
    pub fn start(&self) -> Result<(), SpawnError> {
        {
            let mut state = self.state.lock().unwrap();
            if *state != LifecycleState::Created {
                return Err(SpawnError::AlreadyStarted);
            }
            *state = LifecycleState::Running;
        }
        info!(
            philosophers = self.philosophers.len(),
            chairs = self.table.chair_count(),
            "starting the simulation"
        );

        // The whole party is registered before the first thread runs, so
        // the admission bound covers everyone from the very first meal.
        for philosopher in &self.philosophers {
            self.table.master().register(Arc::clone(philosopher));
        }

        let mut threads = self.threads.lock().unwrap();
        for philosopher in &self.philosophers {
            let philosopher = Arc::clone(philosopher);
            let shutdown = Arc::clone(&self.shutdown_flag);
            let name = philosopher.name().to_string();
            let handle = thread::Builder::new()
                .name(format!("diner-{name}"))
                .spawn(move || philosopher.run(&shutdown))
                .map_err(|source| SpawnError::ThreadSpawn { name, source })?;
            threads.push(handle);
        }
        Ok(())
    }

    /// Runs for the configured duration, then shuts down.
    pub fn run(&self) -> Result<(), SystemError> {
        self.start()?;
        info!(
            duration_ms = self.config.run_duration.as_millis() as u64,
            "table is open"
        );
        thread::sleep(self.config.run_duration);
        info!("table is closing");
        self.shutdown()
    }

    /// Signals every philosopher to stop and waits for their threads.
    ///
    /// Idempotent; shutting down a simulation that never started is fine.
    /// Surfaces a timeout when threads outlive `shutdown_timeout`, and the
    /// first philosopher panic encountered while joining.
    pub fn shutdown(&self) -> Result<(), SystemError> {
        {
            let mut state = self.state.lock().unwrap();
            match *state {
                LifecycleState::Created | LifecycleState::Stopped => {
                    *state = LifecycleState::Stopped;
                    return Ok(());
                }
                LifecycleState::Running | LifecycleState::Stopping => {
                    *state = LifecycleState::Stopping;
                }
            }
        }
        self.shutdown_flag.store(true, Ordering::Relaxed);

        let handles: Vec<JoinHandle<()>> = self.threads.lock().unwrap().drain(..).collect();
        let deadline = Instant::now() + self.config.shutdown_timeout;
        while handles.iter().any(|handle| !handle.is_finished()) {
            if Instant::now() >= deadline {
                warn!("philosophers still running at the shutdown deadline");
                return Err(SystemError::ShutdownTimeout(self.config.shutdown_timeout));
            }
            thread::sleep(JOIN_POLL_INTERVAL);
        }

        let mut result = Ok(());
        for handle in handles {
            let name = handle
                .thread()
                .name()
                .unwrap_or("diner")
                .to_string();
            if handle.join().is_err() && result.is_ok() {
                result = Err(SystemError::PhilosopherPanic(name));
            }
        }

        *self.state.lock().unwrap() = LifecycleState::Stopped;
        debug!("all philosopher threads joined");
        result
    }
}
