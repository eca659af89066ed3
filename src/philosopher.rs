use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::chair::Chair;
use crate::config::{PhilosopherConfig, SimulationConfig};
use crate::deadlock::DeadlockPolicy;
use crate::error::ConfigError;
use crate::fork::HeldForks;
use crate::logging::ActivityLog;
use crate::table::Table;

/// How often interruptible waits re-check the stop flag.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// An autonomous diner.
///
/// Each philosopher runs the same life on its own thread: find a chair,
/// pick up the chair's fork and the neighbour's, eat, stand up, reflect,
/// sleep, start over — until cancelled. All resource acquisition is
/// non-blocking; prolonged fork contention is handed to the injected
/// [`DeadlockPolicy`].
///
/// The meal counter is only ever incremented by the philosopher itself.
/// The ban marker is the one field written by someone else: the table
/// master sets it on admission refusal and clears it on admission.
pub struct Philosopher {
    id: Uuid,
    name: String,
    table: Arc<Table>,
    policy: Arc<dyn DeadlockPolicy>,
    log: Arc<dyn ActivityLog>,
    meals: AtomicU64,
    banned_until: Mutex<Option<Instant>>,
    time_to_eat: Duration,
    time_to_sleep: Duration,
    time_to_reflect: Duration,
    eat_iterations: u32,
    retry_budget: u32,
    poll_interval: Duration,
}

impl Philosopher {
    /// Builds a philosopher from the system defaults with per-actor
    /// overrides applied. Fails fast on a configuration no diner can run
    /// with; the table, policy, and log are mandatory by type.
    pub fn new(
        name: impl Into<String>,
        table: Arc<Table>,
        policy: Arc<dyn DeadlockPolicy>,
        log: Arc<dyn ActivityLog>,
        config: &SimulationConfig,
        overrides: &PhilosopherConfig,
    ) -> Result<Self, ConfigError> {
        let profile = config.merge_with_philosopher_config(overrides);
        let eat_iterations = profile
            .eat_iterations
            .unwrap_or(config.default_eat_iterations);
        if eat_iterations == 0 {
            return Err(ConfigError::ZeroEatIterations);
        }
        if config.retry_budget == 0 {
            return Err(ConfigError::ZeroRetryBudget);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            table,
            policy,
            log,
            meals: AtomicU64::new(0),
            banned_until: Mutex::new(None),
            time_to_eat: profile.time_to_eat.unwrap_or(config.default_time_to_eat),
            time_to_sleep: profile
                .time_to_sleep
                .unwrap_or(config.default_time_to_sleep),
            time_to_reflect: profile
                .time_to_reflect
                .unwrap_or(config.default_time_to_reflect),
            eat_iterations,
            retry_budget: config.retry_budget,
            poll_interval: config.poll_interval,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    /// Meals per wake cycle.
    pub fn eat_iterations(&self) -> u32 {
        self.eat_iterations
    }

    /// Completed meals so far.
    pub fn meal_count(&self) -> u64 {
        self.meals.load(Ordering::Acquire)
    }

    /// Moves the meal counter. Called by the philosopher itself, once per
    /// successful eat, before the table master is notified.
    pub fn record_meal(&self) -> u64 {
        self.meals.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Refuses this diner a seat for `duration`. Written by the table
    /// master on admission refusal.
    pub fn ban_for(&self, duration: Duration) {
        *self.banned_until.lock().unwrap() = Some(Instant::now() + duration);
    }

    /// Lets the diner back in. Written by the table master on admission.
    pub fn lift_ban(&self) {
        *self.banned_until.lock().unwrap() = None;
    }

    /// Remaining ban, if one is in effect.
    pub fn ban_remaining(&self) -> Option<Duration> {
        let banned_until = self.banned_until.lock().unwrap();
        (*banned_until).and_then(|until| until.checked_duration_since(Instant::now()))
    }

    /// Runs the philosopher until the stop flag is observed.
    ///
    /// Registers with the table master on the way in and unregisters on the
    /// way out. Every exit path leaves all forks and chairs released.
    pub fn run(self: Arc<Self>, shutdown: &AtomicBool) {
        self.log.log(&self.name, "joining the table");
        self.table.master().register(Arc::clone(&self));
        while !shutdown.load(Ordering::Relaxed) {
            if !self.run_cycle(shutdown) {
                break;
            }
            self.log.log(
                &self.name,
                &format!("sleeping for {}ms", self.time_to_sleep.as_millis()),
            );
            if !self.pause(self.time_to_sleep, shutdown) {
                break;
            }
        }
        self.table.master().unregister(&self);
        self.log.log(&self.name, "leaving the table");
    }

    /// One wake cycle: `eat_iterations` rounds of chair → forks → eat →
    /// stand up → reflect. Returns `false` when cancelled mid-cycle; held
    /// resources are released before returning either way.
    pub fn run_cycle(&self, shutdown: &AtomicBool) -> bool {
        for _ in 0..self.eat_iterations {
            let chair = match self.seek_chair(shutdown) {
                Some(chair) => chair,
                None => return false,
            };
            let mut held = HeldForks::new();
            if !self.seek_forks(&chair, &mut held, shutdown) {
                held.release_all();
                self.table.vacate(&chair);
                return false;
            }
            self.eat();
            self.stand_up(&chair, &mut held);
            self.log.log(
                &self.name,
                &format!("reflecting for {}ms", self.time_to_reflect.as_millis()),
            );
            if !self.pause(self.time_to_reflect, shutdown) {
                return false;
            }
        }
        true
    }

    /// Unbounded retry for a free, admissible chair. While banned, the
    /// diner waits out the ban instead of hot-polling; the admission check
    /// is repeated afterwards regardless. Seat scarcity alone cannot
    /// deadlock, so no recovery is wired in here.
    fn seek_chair(&self, shutdown: &AtomicBool) -> Option<Arc<Chair>> {
        self.log.log(&self.name, "waiting for a free chair");
        loop {
            if shutdown.load(Ordering::Relaxed) {
                return None;
            }
            if let Some(chair) = self.table.find_free_chair(self) {
                self.log
                    .log(&self.name, &format!("sat down on chair {}", chair.id()));
                return Some(chair);
            }
            match self.ban_remaining() {
                Some(wait) => {
                    self.log.log(
                        &self.name,
                        &format!("refused a seat, banned for {}ms", wait.as_millis()),
                    );
                    if !self.pause(wait, shutdown) {
                        return None;
                    }
                }
                None => thread::sleep(self.poll_interval),
            }
        }
    }

    /// Fork acquisition: the chair's own fork first, then the neighbour's.
    ///
    /// Every attempt is non-blocking; a consecutive-failure counter on the
    /// current fork slot hands prolonged contention to the deadlock policy,
    /// after which acquisition restarts from whatever the policy left held.
    /// On a single-chair table the chair is its own neighbour and the pair
    /// collapses to one physical fork.
    fn seek_forks(&self, chair: &Chair, held: &mut HeldForks, shutdown: &AtomicBool) -> bool {
        let own = Arc::clone(chair.fork());
        let neighbour = Arc::clone(self.table.neighbour_of(chair).fork());
        let wanted = if Arc::ptr_eq(&own, &neighbour) { 1 } else { 2 };
        let mut failures = 0u32;
        while held.len() < wanted {
            if shutdown.load(Ordering::Relaxed) {
                return false;
            }
            let target = if held.is_empty() { &own } else { &neighbour };
            if target.try_acquire() {
                held.push(Arc::clone(target));
                self.log.log(
                    &self.name,
                    &format!("picked up fork {} ({}/{})", target.id(), held.len(), wanted),
                );
                failures = 0;
                continue;
            }
            failures += 1;
            if failures > self.retry_budget {
                self.log.log(
                    &self.name,
                    &format!(
                        "fork {} still contested after {} attempts, running deadlock recovery",
                        target.id(),
                        failures
                    ),
                );
                self.policy.on_deadlock(self, held);
                failures = 0;
            } else {
                thread::sleep(self.poll_interval);
            }
        }
        true
    }

    /// The meal counter moves before the master is notified, so the
    /// recomputed minimum already includes this meal.
    fn eat(&self) {
        let total = self.record_meal();
        self.table.master().on_meal_completed(self);
        self.log.log(
            &self.name,
            &format!(
                "eating meal #{total} for {}ms",
                self.time_to_eat.as_millis()
            ),
        );
        thread::sleep(self.time_to_eat);
    }

    /// Forks first, then the chair.
    fn stand_up(&self, chair: &Chair, held: &mut HeldForks) {
        held.release_all();
        self.table.vacate(chair);
        self.log
            .log(&self.name, &format!("stood up from chair {}", chair.id()));
    }

    /// Sleeps `duration` in slices, re-checking the stop flag between
    /// slices. Returns `false` when cancelled before the time is up.
    fn pause(&self, duration: Duration, shutdown: &AtomicBool) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if shutdown.load(Ordering::Relaxed) {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(STOP_POLL_INTERVAL));
        }
    }
}

impl fmt::Debug for Philosopher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Philosopher")
            .field("name", &self.name)
            .field("meals", &self.meal_count())
            .field("banned", &self.ban_remaining().is_some())
            .finish()
    }
}
