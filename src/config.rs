use crate::theme::Theme;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `api.base_url`
pub const API_URL_ENV: &str = "TASKDECK_API_URL";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  pub fetch: FetchConfig,
  pub pagination: PaginationConfig,
  /// Theme to start with when none has been saved (defaults to the system preference)
  pub theme: Option<Theme>,
  /// Where the local store and logs live (defaults to the platform data dir)
  pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url: String,
  pub timeout_ms: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "https://jsonplaceholder.typicode.com".to_string(),
      timeout_ms: 10_000,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
  /// How long a cached response stays fresh
  pub cache_duration_ms: u64,
  /// Quiet period before a search box value is used
  pub debounce_ms: u64,
}

impl Default for FetchConfig {
  fn default() -> Self {
    Self {
      cache_duration_ms: 5 * 60 * 1000,
      debounce_ms: 300,
    }
  }
}

impl FetchConfig {
  pub fn cache_duration(&self) -> Duration {
    Duration::from_millis(self.cache_duration_ms)
  }

  pub fn debounce(&self) -> Duration {
    Duration::from_millis(self.debounce_ms)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
  pub page_size: u32,
  pub photos_page_size: u32,
}

impl Default for PaginationConfig {
  fn default() -> Self {
    Self {
      page_size: 10,
      photos_page_size: 12,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./taskdeck.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/taskdeck/config.yaml
  ///
  /// Without any file the defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    if let Some(url) = api_url_from_env() {
      config.api.base_url = url;
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("taskdeck.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("taskdeck").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn from_yaml_str(contents: &str) -> Result<Self> {
    // An empty file deserializes to unit, not to an empty map
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  /// Directory for the local store and log files.
  pub fn data_dir(&self) -> Result<PathBuf> {
    match &self.data_dir {
      Some(dir) => Ok(dir.clone()),
      None => dirs::data_dir()
        .map(|d| d.join("taskdeck"))
        .ok_or_else(|| eyre!("Could not determine a data directory. Set data_dir in the config.")),
    }
  }
}

/// API base URL from the environment, if set and non-empty.
pub fn api_url_from_env() -> Option<String> {
  std::env::var(API_URL_ENV)
    .ok()
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}
