// Dining philosophers simulation with a fairness-enforcing table master.
//
// Philosophers run on dedicated threads and compete for chairs and forks
// through non-blocking acquisition. The table master bounds how far any
// diner's meal count may run ahead of the slowest, and a pluggable
// recovery policy breaks cyclic fork waits.

pub mod chair;
pub mod config;
pub mod deadlock;
pub mod error;
pub mod fork;
pub mod logging;
pub mod master;
pub mod philosopher;
pub mod system;
pub mod table;

// Re-export key types for easier usage
pub use chair::Chair;
pub use config::{PhilosopherConfig, SimulationConfig};
pub use deadlock::{DeadlockPolicy, ReleaseAndBackoff};
pub use error::{ConfigError, SpawnError, SystemError};
pub use fork::{Fork, HeldForks};
pub use logging::{ActivityLog, SilentActivityLog, TracingActivityLog};
pub use master::{MealObserverMaster, OpenAdmission, TableMaster};
pub use philosopher::Philosopher;
pub use system::Simulation;
pub use table::Table;
