use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A single exclusive-access fork, shared by exactly two adjacent chairs.
///
/// Acquisition is non-blocking: callers poll [`Fork::try_acquire`] and bring
/// their own retry/backoff, which keeps deadlock counting and cancellation
/// checks reachable at all times. No diner holds a fork beyond one meal.
pub struct Fork {
    id: usize,
    held: AtomicBool,
}

impl Fork {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            held: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Atomically takes the fork if it is free. Returns `false` without
    /// blocking when someone else holds it.
    pub fn try_acquire(&self) -> bool {
        self.held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Puts the fork back on the table. Idempotent; recovery paths may
    /// release speculatively.
    pub fn release(&self) {
        self.held.store(false, Ordering::Release);
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Fork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fork")
            .field("id", &self.id)
            .field("held", &self.is_held())
            .finish()
    }
}

/// The forks a diner holds during one acquisition cycle: zero, one, or two.
///
/// Owned by the running cycle and handed to the deadlock policy on
/// prolonged contention. Whoever mutates it must keep it consistent with
/// the underlying fork states: an entry in the set is held, a removed entry
/// has been released.
#[derive(Debug, Default)]
pub struct HeldForks {
    forks: Vec<Arc<Fork>>,
}

impl HeldForks {
    pub fn new() -> Self {
        Self {
            forks: Vec::with_capacity(2),
        }
    }

    pub fn len(&self) -> usize {
        self.forks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forks.is_empty()
    }

    pub fn push(&mut self, fork: Arc<Fork>) {
        self.forks.push(fork);
    }

    pub fn forks(&self) -> &[Arc<Fork>] {
        &self.forks
    }

    /// Releases every held fork and clears the set. A no-op when empty.
    pub fn release_all(&mut self) {
        for fork in self.forks.drain(..) {
            fork.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn acquire_is_exclusive() {
        let fork = Fork::new(0);
        assert!(fork.try_acquire());
        assert!(!fork.try_acquire());
        fork.release();
        assert!(fork.try_acquire());
    }

    #[test]
    fn release_is_idempotent() {
        let fork = Fork::new(0);
        fork.release();
        fork.release();
        assert!(fork.try_acquire());
        assert!(!fork.try_acquire());
    }

    #[test]
    fn contended_acquire_has_a_single_winner() {
        let fork = Arc::new(Fork::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let fork = Arc::clone(&fork);
                thread::spawn(move || fork.try_acquire())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(winners, 1);
        assert!(fork.is_held());
    }

    #[test]
    fn release_all_frees_every_held_fork() {
        let first = Arc::new(Fork::new(0));
        let second = Arc::new(Fork::new(1));
        assert!(first.try_acquire());
        assert!(second.try_acquire());

        let mut held = HeldForks::new();
        held.push(Arc::clone(&first));
        held.push(Arc::clone(&second));
        assert_eq!(held.len(), 2);

        held.release_all();
        assert!(held.is_empty());
        assert!(!first.is_held());
        assert!(!second.is_held());

        // Empty set: nothing to do, nothing corrupted.
        held.release_all();
        assert!(held.is_empty());
    }
}
