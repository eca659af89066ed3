use std::sync::Arc;
use std::time::Duration;

use banquet::config::{PhilosopherConfig, SimulationConfig};
use banquet::deadlock::ReleaseAndBackoff;
use banquet::error::ConfigError;
use banquet::logging::SilentActivityLog;
use banquet::master::{OpenAdmission, TableMaster};
use banquet::philosopher::Philosopher;
use banquet::table::Table;

fn open_table(chairs: usize) -> Arc<Table> {
    Arc::new(Table::new(chairs, Arc::new(OpenAdmission)).unwrap())
}

fn diner(name: &str, table: &Arc<Table>) -> Philosopher {
    Philosopher::new(
        name,
        Arc::clone(table),
        Arc::new(ReleaseAndBackoff::new(Duration::ZERO)),
        Arc::new(SilentActivityLog),
        &SimulationConfig::default(),
        &PhilosopherConfig::default(),
    )
    .unwrap()
}

// Master that refuses everyone, to exercise the tentative-occupy path.
struct RefuseAll;

impl TableMaster for RefuseAll {
    fn is_admissible(&self, _diner: &Philosopher) -> bool {
        false
    }
}

#[test]
fn neighbour_relation_is_a_total_cycle() {
    let table = open_table(4);
    for chair in table.chairs() {
        assert_eq!(table.neighbour_of(chair).id(), (chair.id() + 1) % 4);
    }

    // Walking the ring comes back to the start after exactly one lap.
    let mut current = Arc::clone(&table.chairs()[0]);
    for _ in 0..4 {
        current = Arc::clone(table.neighbour_of(&current));
    }
    assert_eq!(current.id(), 0);
}

#[test]
fn adjacent_chairs_contribute_distinct_forks() {
    let table = open_table(3);
    for chair in table.chairs() {
        let neighbour = table.neighbour_of(chair);
        assert!(!Arc::ptr_eq(chair.fork(), neighbour.fork()));
    }
}

#[test]
fn a_single_chair_is_its_own_neighbour() {
    let table = open_table(1);
    let only = &table.chairs()[0];
    assert!(Arc::ptr_eq(only, table.neighbour_of(only)));
    assert!(Arc::ptr_eq(only.fork(), table.neighbour_of(only).fork()));
}

#[test]
fn find_free_chair_skips_occupied_chairs() {
    let table = open_table(2);
    let diner = diner("Scanner", &table);

    assert!(table.chairs()[0].try_occupy());
    let chair = table.find_free_chair(&diner).expect("one chair is free");
    assert_eq!(chair.id(), 1);

    // Everything is taken now.
    assert!(table.find_free_chair(&diner).is_none());
}

#[test]
fn admission_refusal_vacates_the_tentative_chair() {
    let table = Arc::new(Table::new(3, Arc::new(RefuseAll)).unwrap());
    let diner = diner("Refused", &table);

    assert!(table.find_free_chair(&diner).is_none());
    assert!(table.chairs().iter().all(|chair| !chair.is_occupied()));
}

#[test]
fn vacate_releases_occupancy_but_not_the_fork() {
    let table = open_table(2);
    let diner = diner("Sitter", &table);

    let chair = table.find_free_chair(&diner).unwrap();
    assert!(chair.fork().try_acquire());

    table.vacate(&chair);
    assert!(!chair.is_occupied());
    assert!(chair.fork().is_held());
}

#[test]
fn a_table_needs_at_least_one_chair() {
    assert!(matches!(
        Table::new(0, Arc::new(OpenAdmission)),
        Err(ConfigError::NoChairs)
    ));
}
