use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use banquet::config::SimulationConfig;
use banquet::deadlock::ReleaseAndBackoff;
use banquet::logging::{self, ActivityLog};
use banquet::system::Simulation;

/// Counts admission refusals as they show up in the activity stream.
struct RefusalCounter {
    refusals: AtomicUsize,
}

impl ActivityLog for RefusalCounter {
    fn log(&self, _diner: &str, message: &str) {
        if message.starts_with("refused a seat") {
            self.refusals.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[test]
fn the_hungry_diner_is_throttled_by_admission() {
    logging::init_test();
    let config = SimulationConfig {
        run_duration: Duration::from_millis(600),
        philosopher_count: 4,
        chair_count: 4,
        very_hungry: true,
        poll_interval: Duration::from_micros(500),
        ban_duration: Duration::from_millis(5),
        default_time_to_eat: Duration::from_millis(1),
        default_time_to_sleep: Duration::from_millis(2),
        default_time_to_reflect: Duration::from_millis(2),
        ..SimulationConfig::default()
    };
    let log = Arc::new(RefusalCounter {
        refusals: AtomicUsize::new(0),
    });
    let sim = Simulation::new_with(
        config,
        Arc::new(ReleaseAndBackoff::new(Duration::from_millis(2))),
        Arc::clone(&log) as Arc<dyn ActivityLog>,
    )
    .unwrap();
    let deviation = sim.config().max_deviation;
    sim.run().unwrap();

    let counts = sim.meal_counts();
    for (name, meals) in &counts {
        assert!(*meals > 0, "{name} never ate");
    }

    let max = counts.iter().map(|(_, meals)| *meals).max().unwrap();
    let min = counts.iter().map(|(_, meals)| *meals).min().unwrap();
    // Admission lets a diner sitting exactly at the threshold finish that
    // meal, so the spread can reach deviation + 1 but never beyond.
    assert!(
        max - min <= deviation + 1,
        "meal-count spread {} exceeds the admission bound {}",
        max - min,
        deviation + 1
    );

    // With a 10x appetite the hungry diner must have hit the bound.
    assert!(
        log.refusals.load(Ordering::Relaxed) > 0,
        "nobody was ever refused a seat"
    );
}
