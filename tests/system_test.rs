use std::sync::Arc;
use std::time::Duration;

use banquet::config::SimulationConfig;
use banquet::deadlock::ReleaseAndBackoff;
use banquet::error::{ConfigError, SpawnError};
use banquet::logging::{self, SilentActivityLog};
use banquet::system::Simulation;

fn short_config(philosophers: usize, chairs: usize, run_ms: u64) -> SimulationConfig {
    SimulationConfig {
        run_duration: Duration::from_millis(run_ms),
        philosopher_count: philosophers,
        chair_count: chairs,
        poll_interval: Duration::from_micros(500),
        ban_duration: Duration::from_millis(5),
        default_time_to_eat: Duration::from_millis(1),
        default_time_to_sleep: Duration::from_millis(2),
        default_time_to_reflect: Duration::from_millis(1),
        ..SimulationConfig::default()
    }
}

fn quiet_simulation(config: SimulationConfig) -> Simulation {
    Simulation::new_with(
        config,
        Arc::new(ReleaseAndBackoff::new(Duration::from_millis(2))),
        Arc::new(SilentActivityLog),
    )
    .unwrap()
}

#[test]
fn every_diner_progresses_under_chair_contention() {
    logging::init_test();
    // More diners than chairs: the expected steady-state contention.
    let sim = quiet_simulation(short_config(3, 2, 400));
    sim.run().unwrap();

    for (name, meals) in sim.meal_counts() {
        assert!(meals > 0, "{name} never ate");
    }
    // Everything is back on the table after shutdown.
    assert!(sim.table().chairs().iter().all(|c| !c.is_occupied()));
    assert!(sim.table().chairs().iter().all(|c| !c.fork().is_held()));
}

#[test]
fn a_single_chair_alternates_between_two_diners() {
    logging::init_test();
    let sim = quiet_simulation(short_config(2, 1, 400));
    sim.run().unwrap();

    for (name, meals) in sim.meal_counts() {
        assert!(meals > 0, "{name} was permanently excluded from the chair");
    }
    let chair = &sim.table().chairs()[0];
    assert!(!chair.is_occupied());
    assert!(!chair.fork().is_held());
}

#[test]
fn start_is_single_shot_and_shutdown_is_idempotent() {
    let sim = quiet_simulation(short_config(2, 2, 100));
    sim.start().unwrap();
    assert!(matches!(sim.start(), Err(SpawnError::AlreadyStarted)));
    sim.shutdown().unwrap();
    sim.shutdown().unwrap();
}

#[test]
fn stopping_a_simulation_that_never_started_is_fine() {
    let sim = quiet_simulation(short_config(2, 2, 100));
    sim.shutdown().unwrap();
}

#[test]
fn misconfiguration_is_rejected_up_front() {
    let config = SimulationConfig {
        philosopher_count: 0,
        ..SimulationConfig::default()
    };
    assert!(matches!(
        Simulation::new(config),
        Err(ConfigError::NoPhilosophers)
    ));
}

#[test]
fn the_first_diner_becomes_the_hungry_one() {
    let config = SimulationConfig {
        very_hungry: true,
        ..short_config(3, 3, 100)
    };
    let sim = quiet_simulation(config);

    let party = sim.philosophers();
    assert_eq!(party[0].name(), "Hungry-Philosopher-1");
    assert_eq!(party[1].name(), "Philosopher-2");
    assert_eq!(
        party[0].eat_iterations(),
        party[1].eat_iterations() * 10
    );
}
