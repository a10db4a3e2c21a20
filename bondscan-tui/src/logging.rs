use std::str::FromStr;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LogConfig;

/// Keeps the file writer alive; logs are flushed when this is dropped.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// The terminal belongs to the UI, so everything goes to a daily log file.
pub fn init_logger(settings: &LogConfig, debug: bool) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(&settings.dir)?;

    let level = if debug { "debug" } else { settings.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::from_str(&format!("bondscan={level},bondscan_bluez={level}")))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_appender = tracing_appender::rolling::daily(&settings.dir, &settings.file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    Ok(LoggingGuard { _guard: guard })
}
