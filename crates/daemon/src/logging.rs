// Logging setup: EnvFilter + json/pretty console, optional daily log file
use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FORMAT_VAR: &str = "WATCHDOG_LOG_FORMAT";
const LOG_DIR_VAR: &str = "WATCHDOG_LOG_DIR";
const LOG_FILE_PREFIX: &str = "experiment-watchdog.log";

/// Install the global subscriber from `WATCHDOG_LOG_FORMAT` / `WATCHDOG_LOG_DIR`
///
/// The returned guard flushes the log file on drop and must be held until
/// the process exits.
pub fn init() -> Result<Option<WorkerGuard>> {
    let log_format = std::env::var(LOG_FORMAT_VAR).unwrap_or_else(|_| "pretty".to_string());
    init_with(&log_format, std::env::var(LOG_DIR_VAR).ok())
}

pub fn init_with(log_format: &str, log_dir: Option<String>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")?;

    // Unattended runs last days; keep a JSON trail on disk when asked to
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let dir = shellexpand::tilde(&dir).into_owned();
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // The file layer sits directly on the filtered registry in both branches
    let base = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    match log_format {
        "json" => base
            .with(fmt::layer().json())
            .try_init()
            .context("Failed to install tracing subscriber")?,
        _ => base
            .with(fmt::layer().pretty())
            .try_init()
            .context("Failed to install tracing subscriber")?,
    }

    Ok(guard)
}
