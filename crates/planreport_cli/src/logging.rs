//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! - `warn`: recoverable degradations (absent columns, unparsable dates)
//! - `info`: pipeline stage progress, summary counts
//! - `debug`: per-sheet styling and width decisions
//! - `trace`: everything else

use std::io;

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level applied to this workspace's crates.
    pub level: Level,
    /// Let `RUST_LOG` replace the level.
    pub use_env_filter: bool,
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_env_filter: true,
            with_ansi: true,
        }
    }
}

impl LogConfig {
    /// - 0 (no `-v`): info level, `RUST_LOG` honored
    /// - 1 (`-v`): debug level
    /// - 2+ (`-vv`): trace level
    #[must_use]
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self {
            level,
            use_env_filter: verbosity == 0,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }
}

/// Install the global subscriber writing to stderr. Call once at startup.
pub fn init_logging(config: &LogConfig) {
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(config.with_ansi)
        .with_target(false)
        .without_time();

    tracing_subscriber::registry()
        .with(build_env_filter(config))
        .with(layer)
        .init();
}

fn build_env_filter(config: &LogConfig) -> EnvFilter {
    let c_default = derive_filter_directive(config.level);
    if config.use_env_filter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(c_default))
    } else {
        EnvFilter::new(c_default)
    }
}

/// External crates stay at `warn`.
fn derive_filter_directive(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    format!("warn,planreport={level},planreport_xlsx={level}")
}
