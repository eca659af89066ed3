use std::thread;
use std::time::Duration;

use rand::Rng;

use crate::fork::HeldForks;
use crate::philosopher::Philosopher;

/// Reaction to a diner whose fork wait exceeded its retry budget.
///
/// Implementations must leave the held-forks set consistent with the
/// underlying fork states when they return: entries still in the set are
/// held, removed entries have been released. The caller restarts fork
/// acquisition from whatever the policy left behind.
pub trait DeadlockPolicy: Send + Sync {
    fn on_deadlock(&self, diner: &Philosopher, held: &mut HeldForks);
}

/// Default recovery: put every held fork back on the table, then back off
/// for a random slice of `max_backoff` before the caller retries from
/// scratch. Giving the forks up breaks the cyclic hold-and-wait.
///
/// Invoking it while holding nothing releases nothing and only backs off.
pub struct ReleaseAndBackoff {
    max_backoff: Duration,
}

impl ReleaseAndBackoff {
    pub fn new(max_backoff: Duration) -> Self {
        Self { max_backoff }
    }
}

impl DeadlockPolicy for ReleaseAndBackoff {
    fn on_deadlock(&self, _diner: &Philosopher, held: &mut HeldForks) {
        held.release_all();
        if self.max_backoff > Duration::ZERO {
            let jitter = rand::thread_rng().gen::<f64>();
            thread::sleep(self.max_backoff.mul_f64(jitter));
        }
    }
}
