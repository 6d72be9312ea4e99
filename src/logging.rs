//! Tracing subscriber setup for the fix pipeline.
//!
//! Two output modes: plain stdout for interactive runs, and a daily-rolling
//! file under [`PipelineConfig::log_dir`](crate::config::PipelineConfig) for
//! unattended batch jobs. The filter honours `RUST_LOG` and falls back to
//! `info`.

use crate::config::PipelineConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_PREFIX: &str = "vulnera-fixgen.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// Returns the appender guard when file logging is active. The caller must
/// keep the guard alive until process exit or buffered lines are lost.
pub fn init_logging(config: &PipelineConfig) -> Option<WorkerGuard> {
    if config.log_to_file {
        let appender = rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        tracing_subscriber::registry()
            .with(env_filter())
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .init();

        Some(guard)
    } else {
        fmt()
            .with_env_filter(env_filter())
            .with_target(false)
            .compact()
            .init();

        None
    }
}
