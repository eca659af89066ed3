use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::philosopher::Philosopher;

/// Admission arbiter for a table.
///
/// The table consults [`TableMaster::is_admissible`] on every seat request;
/// diners report back through [`TableMaster::on_meal_completed`] exactly
/// once per finished meal, after their own counter already reflects it.
pub trait TableMaster: Send + Sync {
    /// A philosopher joined the table.
    fn register(&self, _diner: Arc<Philosopher>) {}

    /// A philosopher left the table for good.
    fn unregister(&self, _diner: &Philosopher) {}

    /// Whether `diner` may take a seat right now.
    fn is_admissible(&self, diner: &Philosopher) -> bool;

    /// `diner` finished a meal.
    fn on_meal_completed(&self, _diner: &Philosopher) {}
}

/// A master that never refuses anyone. For tables without fairness
/// arbitration.
pub struct OpenAdmission;

impl TableMaster for OpenAdmission {
    fn is_admissible(&self, _diner: &Philosopher) -> bool {
        true
    }
}

/// The fairness controller: bounds the meal-count spread across the table.
///
/// Keeps a registry of the seated party and a precomputed admission
/// threshold of `min(meal counts) + max_deviation`. The threshold is
/// recomputed whenever a meal completes or the party changes, so it only
/// moves when progress happens — never while everyone waits. Admission
/// checks read the threshold atomically and stay off the registry lock.
pub struct MealObserverMaster {
    max_deviation: u64,
    ban_duration: Duration,
    diners: Mutex<Vec<Arc<Philosopher>>>,
    threshold: AtomicU64,
}

impl MealObserverMaster {
    pub fn new(max_deviation: u64, ban_duration: Duration) -> Self {
        Self {
            max_deviation,
            ban_duration,
            diners: Mutex::new(Vec::new()),
            // An empty registry has a minimum of zero.
            threshold: AtomicU64::new(max_deviation),
        }
    }

    /// Current admission threshold: meal counts above it are refused a seat.
    pub fn threshold(&self) -> u64 {
        self.threshold.load(Ordering::Acquire)
    }

    fn recompute(&self, diners: &[Arc<Philosopher>]) {
        let min = diners.iter().map(|d| d.meal_count()).min().unwrap_or(0);
        self.threshold
            .store(min + self.max_deviation, Ordering::Release);
    }
}

impl TableMaster for MealObserverMaster {
    /// Idempotent: re-registering an already tracked diner is harmless.
    fn register(&self, diner: Arc<Philosopher>) {
        let mut diners = self.diners.lock().unwrap();
        if !diners.iter().any(|d| d.id() == diner.id()) {
            diners.push(diner);
        }
        self.recompute(&diners);
    }

    fn unregister(&self, diner: &Philosopher) {
        let mut diners = self.diners.lock().unwrap();
        diners.retain(|d| d.id() != diner.id());
        self.recompute(&diners);
    }

    /// O(1) against the precomputed threshold. Side effect: lifts the
    /// diner's ban on admission, bans it for the configured duration on
    /// refusal so the diner can wait instead of hot-polling.
    fn is_admissible(&self, diner: &Philosopher) -> bool {
        let admissible = diner.meal_count() <= self.threshold();
        if admissible {
            diner.lift_ban();
        } else {
            diner.ban_for(self.ban_duration);
        }
        admissible
    }

    fn on_meal_completed(&self, _diner: &Philosopher) {
        let diners = self.diners.lock().unwrap();
        self.recompute(&diners);
    }
}
