use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::fork::Fork;

/// An exclusive-access seat at the table.
///
/// A chair owns one adjacent fork; together with the neighbour chair's fork
/// it gives the occupant the pair a meal requires. Chairs exist for the
/// table's whole lifetime and are only ever occupied or vacated.
pub struct Chair {
    id: usize,
    occupied: AtomicBool,
    fork: Arc<Fork>,
}

impl Chair {
    pub fn new(id: usize, fork: Arc<Fork>) -> Self {
        Self {
            id,
            occupied: AtomicBool::new(false),
            fork,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// The fork on this chair's side of the table.
    pub fn fork(&self) -> &Arc<Fork> {
        &self.fork
    }

    /// Atomically sits down if the chair is free. Returns `false` without
    /// blocking when someone else occupies it.
    pub fn try_occupy(&self) -> bool {
        self.occupied
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Stands the occupant up. Idempotent; occupancy only, the fork is
    /// released separately by whoever holds it.
    pub fn vacate(&self) {
        self.occupied.store(false, Ordering::Release);
    }

    pub fn is_occupied(&self) -> bool {
        self.occupied.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Chair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chair")
            .field("id", &self.id)
            .field("occupied", &self.is_occupied())
            .field("fork", &self.fork.id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupancy_is_exclusive() {
        let chair = Chair::new(0, Arc::new(Fork::new(0)));
        assert!(chair.try_occupy());
        assert!(!chair.try_occupy());
        chair.vacate();
        assert!(chair.try_occupy());
    }

    #[test]
    fn vacating_leaves_the_fork_alone() {
        let chair = Chair::new(0, Arc::new(Fork::new(0)));
        assert!(chair.try_occupy());
        assert!(chair.fork().try_acquire());
        chair.vacate();
        assert!(!chair.is_occupied());
        assert!(chair.fork().is_held());
    }
}
