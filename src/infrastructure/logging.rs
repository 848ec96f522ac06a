//! Logging initialization.
//!
//! Console output is always enabled; file logging writes daily-rotated
//! files through a non-blocking appender whose guard lives for the
//! process lifetime.

use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::infrastructure::config::LoggingConfig;

// Keeps the non-blocking file writer alive after init returns.
static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Initialize the global tracing subscriber. Safe to call once per
/// process; later calls return an error from `try_init` which callers
/// may ignore in tests.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let console_layer = tracing_subscriber::fmt::layer().with_target(true);

    if config.file_logging {
        let appender = tracing_appender::rolling::daily(&config.directory, "sophie.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer);

        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .try_init()?;
    }

    Ok(())
}
