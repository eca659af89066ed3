use std::fmt;
use std::sync::Arc;

use crate::chair::Chair;
use crate::error::ConfigError;
use crate::fork::Fork;
use crate::master::TableMaster;
use crate::philosopher::Philosopher;

/// The fixed, circular arrangement of chairs.
///
/// The neighbour relation is a total cycle: every chair has exactly one
/// right neighbour, and two adjacent chairs share exactly one fork. Seat
/// admission is delegated to the injected [`TableMaster`].
pub struct Table {
    chairs: Vec<Arc<Chair>>,
    master: Arc<dyn TableMaster>,
}

impl Table {
    /// Lays the table with `chair_count` chairs, one fork between each pair
    /// of neighbours.
    pub fn new(chair_count: usize, master: Arc<dyn TableMaster>) -> Result<Self, ConfigError> {
        if chair_count == 0 {
            return Err(ConfigError::NoChairs);
        }
        let chairs = (0..chair_count)
            .map(|id| Arc::new(Chair::new(id, Arc::new(Fork::new(id)))))
            .collect();
        Ok(Self { chairs, master })
    }

    pub fn chairs(&self) -> &[Arc<Chair>] {
        &self.chairs
    }

    pub fn chair_count(&self) -> usize {
        self.chairs.len()
    }

    pub fn master(&self) -> &Arc<dyn TableMaster> {
        &self.master
    }

    /// The chair to the right. Its fork is the second fork of a meal taken
    /// at `chair`.
    pub fn neighbour_of(&self, chair: &Chair) -> &Arc<Chair> {
        &self.chairs[(chair.id() + 1) % self.chairs.len()]
    }

    /// Scans for a chair that is both free and admissible for `diner`.
    ///
    /// A free chair is taken tentatively before the master is consulted; on
    /// refusal it is vacated again. Refusal applies to every chair alike, so
    /// the scan stops there. Returns `None` when nothing is currently both
    /// free and admissible; callers retry.
    pub fn find_free_chair(&self, diner: &Philosopher) -> Option<Arc<Chair>> {
        for chair in &self.chairs {
            if !chair.try_occupy() {
                continue;
            }
            if self.master.is_admissible(diner) {
                return Some(Arc::clone(chair));
            }
            chair.vacate();
            return None;
        }
        None
    }

    /// Stands the occupant up from `chair`. Occupancy only; forks are
    /// released by the diner itself.
    pub fn vacate(&self, chair: &Chair) {
        chair.vacate();
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("chairs", &self.chairs.len())
            .field(
                "occupied",
                &self.chairs.iter().filter(|c| c.is_occupied()).count(),
            )
            .finish()
    }
}
