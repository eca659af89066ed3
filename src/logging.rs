//! Logging for the simulation.
//!
//! Global log output runs through the `tracing` ecosystem. The simulation
//! core never talks to it directly: every per-diner activity line goes
//! through the [`ActivityLog`] capability, so a run can be silenced (tests)
//! or rerouted without touching the actors.

use std::io;
use std::sync::Once;

use tracing::{Level, Subscriber};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Per-diner activity log consumed by the simulation core.
///
/// The single operation has no return value and no visible failure mode;
/// logging must never affect simulation correctness.
pub trait ActivityLog: Send + Sync {
    fn log(&self, diner: &str, message: &str);
}

/// Default sink: forwards every activity line to `tracing` at INFO.
pub struct TracingActivityLog;

impl ActivityLog for TracingActivityLog {
    fn log(&self, diner: &str, message: &str) {
        tracing::info!(diner, "{message}");
    }
}

/// Discards everything. For tests and silent embedding.
pub struct SilentActivityLog;

impl ActivityLog for SilentActivityLog {
    fn log(&self, _diner: &str, _message: &str) {}
}

/// Configuration for global log output.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum level to display.
    pub level: Level,
    /// Emit JSON instead of human-readable lines.
    pub json_format: bool,
    /// Include the emitting thread's name and id. One thread per diner, so
    /// this doubles as a diner column.
    pub show_thread_info: bool,
    /// Include timestamps.
    pub show_time: bool,
    /// Extra target filter expressions ("target=level,target2=level2,...").
    pub target_filters: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_thread_info: true,
            show_time: true,
            target_filters: None,
        }
    }
}

// Only the first initialization takes effect.
static INIT: Once = Once::new();

/// Installs the global subscriber with the given configuration. Safe to
/// call more than once.
pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let env_filter = build_filter(&config);
        let registry = tracing_subscriber::registry().with(env_filter);

        let fmt_layer = fmt::layer()
            .with_ansi(atty::is(atty::Stream::Stdout))
            .with_thread_names(config.show_thread_info)
            .with_thread_ids(config.show_thread_info);

        let subscriber: Box<dyn Subscriber + Send + Sync> = if config.json_format {
            Box::new(registry.with(fmt::layer().json().flatten_event(true)))
        } else if config.show_time {
            Box::new(registry.with(fmt_layer))
        } else {
            Box::new(registry.with(fmt_layer.without_time()))
        };

        set_global_subscriber(subscriber);
    });
}

/// Console output plus a plain-text, append-mode log file.
pub fn init_with_file(config: LogConfig, path: &str) -> io::Result<()> {
    // Fail now if the file cannot be opened, not at the first log line.
    file_writer(path)?;

    let log_file_path = path.to_string();
    INIT.call_once(move || {
        let env_filter = build_filter(&config);

        let console_layer = fmt::layer()
            .with_ansi(atty::is(atty::Stream::Stdout))
            .with_thread_names(config.show_thread_info)
            .with_thread_ids(config.show_thread_info);

        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(move || match file_writer(&log_file_path) {
                Ok(writer) => writer,
                Err(_) => Box::new(io::stderr()),
            })
            .with_thread_names(true)
            .with_thread_ids(true);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer);

        set_global_subscriber(subscriber);
    });
    Ok(())
}

/// INFO-level, human-readable console output.
pub fn init_default() {
    init(LogConfig::default());
}

/// Quiet profile for tests: warnings and errors only, no timestamps, no
/// thread noise.
pub fn init_test() {
    init(LogConfig {
        level: Level::WARN,
        show_thread_info: false,
        show_time: false,
        ..Default::default()
    });
}

fn build_filter(config: &LogConfig) -> EnvFilter {
    let mut env_filter = EnvFilter::from_default_env().add_directive(config.level.into());
    if let Some(filters) = &config.target_filters {
        for filter in filters.split(',') {
            if let Ok(directive) = filter.parse() {
                env_filter = env_filter.add_directive(directive);
            }
        }
    }
    env_filter
}

fn set_global_subscriber<S>(subscriber: S)
where
    S: Subscriber + Send + Sync + 'static,
{
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error setting global tracing subscriber: {err}");
    }
}

/// Append-mode writer for the log file, created if missing.
fn file_writer(path: &str) -> io::Result<Box<dyn io::Write + Send + Sync + 'static>> {
    use std::fs::OpenOptions;

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Box::new(file))
}
