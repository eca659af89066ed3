use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::info;

use banquet::config::SimulationConfig;
use banquet::logging::{self, LogConfig};
use banquet::system::Simulation;

fn main() -> Result<()> {
    match env::var("BANQUET_LOG") {
        Ok(path) => logging::init_with_file(LogConfig::default(), &path)
            .with_context(|| format!("cannot open log file {path}"))?,
        Err(_) => logging::init_default(),
    }

    let config = parse_args(env::args().skip(1).collect())?;
    let simulation = Simulation::new(config)?;
    simulation.run()?;

    for (name, meals) in simulation.meal_counts() {
        info!(diner = %name, meals, "final tally");
    }
    Ok(())
}

/// `banquet [<runtime-secs> <philosophers> <chairs> <very-hungry>]`
///
/// With no arguments every knob keeps its default; the very-hungry flag is
/// truthy when non-empty.
fn parse_args(args: Vec<String>) -> Result<SimulationConfig> {
    let mut config = SimulationConfig::default();
    match args.len() {
        0 => {}
        4 => {
            let secs: u64 = args[0]
                .parse()
                .context("runtime must be a number of seconds")?;
            config.run_duration = Duration::from_secs(secs);
            config.philosopher_count = args[1]
                .parse()
                .context("philosopher count must be a number")?;
            config.chair_count = args[2].parse().context("chair count must be a number")?;
            config.very_hungry = !args[3].is_empty();
        }
        _ => bail!("usage: banquet [<runtime-secs> <philosophers> <chairs> <very-hungry>]"),
    }
    Ok(config)
}
