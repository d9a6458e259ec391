use color_eyre::{eyre::eyre, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

pub const LOG_FILE_PREFIX: &str = "taskdeck.log";

/// Build the filter: `RUST_LOG` wins, otherwise `taskdeck=<level>` with
/// noisy dependencies held at warn.
pub fn env_filter(level: &str) -> EnvFilter {
  EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    EnvFilter::new(format!(
      "warn,taskdeck={},hyper=warn,reqwest=warn,rusqlite=warn",
      level
    ))
  })
}

/// Send logs to a daily rolling file in `log_dir`.
///
/// The terminal belongs to the UI, so nothing goes to stdout or stderr. Keep
/// the returned guard alive until exit or buffered lines are lost.
pub fn init(log_dir: &Path, level: &str) -> Result<WorkerGuard> {
  std::fs::create_dir_all(log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let file_layer = fmt::Layer::new()
    .with_writer(writer)
    .with_ansi(false)
    .with_target(true);

  Registry::default()
    .with(env_filter(level))
    .with(file_layer)
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}
