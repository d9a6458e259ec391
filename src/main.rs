mod api;
mod app;
mod commands;
mod config;
mod debounce;
mod event;
mod history;
mod logging;
mod query;
mod storage;
mod tasks;
mod theme;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "taskdeck")]
#[command(about = "A terminal task manager with a JSONPlaceholder data browser")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/taskdeck/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Directory for the local store and logs
  #[arg(short, long)]
  data_dir: Option<PathBuf>,

  /// Log level when RUST_LOG is not set
  #[arg(long, default_value = "info")]
  log_level: String,

  /// Theme to use when none has been saved yet
  #[arg(long, value_enum)]
  theme: Option<theme::Theme>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(dir) = args.data_dir {
    config.data_dir = Some(dir);
  }
  if let Some(theme) = args.theme {
    config.theme = Some(theme);
  }

  let data_dir = config.data_dir()?;
  let _log_guard = logging::init(&data_dir.join("logs"), &args.log_level)?;
  info!(data_dir = %data_dir.display(), api = %config.api.base_url, "configuration loaded");

  let storage = Arc::new(storage::LocalStorage::open(
    &storage::LocalStorage::path_in(&data_dir),
  )?);

  let mut app = app::App::new(config, storage)?;
  app.run().await?;

  Ok(())
}
