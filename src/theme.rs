//! Light/dark theme state shared across views.
//!
//! [`ThemeStore`] owns the single writable theme cell and persists changes to
//! local storage. Views hold a [`ThemeWatch`] and read the current palette at
//! render time, so a toggle re-colors everything on the next frame.

use crate::storage::{keys, LocalStorage};
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
  #[default]
  Light,
  Dark,
}

impl Theme {
  pub fn as_str(&self) -> &'static str {
    match self {
      Theme::Light => "light",
      Theme::Dark => "dark",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "light" => Some(Theme::Light),
      "dark" => Some(Theme::Dark),
      _ => None,
    }
  }

  pub fn toggled(self) -> Self {
    match self {
      Theme::Light => Theme::Dark,
      Theme::Dark => Theme::Light,
    }
  }

  pub fn palette(self) -> Palette {
    match self {
      Theme::Light => Palette {
        bg: Color::White,
        fg: Color::Black,
        accent: Color::Blue,
        muted: Color::Gray,
        highlight: Color::LightBlue,
        border: Color::Blue,
        success: Color::Green,
        warning: Color::Rgb(180, 120, 0),
        error: Color::Red,
      },
      Theme::Dark => Palette {
        bg: Color::Black,
        fg: Color::White,
        accent: Color::Cyan,
        muted: Color::DarkGray,
        highlight: Color::DarkGray,
        border: Color::Blue,
        success: Color::Green,
        warning: Color::Yellow,
        error: Color::LightRed,
      },
    }
  }
}

/// Colors a view needs to draw itself in the current theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub highlight: Color,
  pub border: Color,
  pub success: Color,
  pub warning: Color,
  pub error: Color,
}

/// Guess the terminal's preference from `COLORFGBG` ("fg;bg").
///
/// Background indices 0-6 and 8 are the dark ANSI colors.
pub fn theme_from_colorfgbg(value: Option<&str>) -> Theme {
  let background = value
    .and_then(|v| v.rsplit(';').next())
    .and_then(|bg| bg.trim().parse::<u8>().ok());

  match background {
    Some(0..=6) | Some(8) => Theme::Dark,
    _ => Theme::Light,
  }
}

pub fn system_theme() -> Theme {
  theme_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
}

/// Read-only handle to the current theme.
#[derive(Debug, Clone)]
pub struct ThemeWatch(watch::Receiver<Theme>);

impl ThemeWatch {
  pub fn theme(&self) -> Theme {
    *self.0.borrow()
  }

  pub fn palette(&self) -> Palette {
    self.theme().palette()
  }
}

/// Owner of the theme cell. All writes go through here and are persisted.
pub struct ThemeStore {
  storage: Arc<LocalStorage>,
  tx: watch::Sender<Theme>,
}

impl ThemeStore {
  /// Resolve the initial theme: stored choice, then `preferred`, then the
  /// system preference.
  pub fn load(storage: Arc<LocalStorage>, preferred: Option<Theme>) -> Self {
    let stored = match storage.get(keys::THEME) {
      Ok(value) => value.as_deref().and_then(Theme::parse),
      Err(e) => {
        warn!(error = %e, "failed to read stored theme");
        None
      }
    };

    let theme = stored.or(preferred).unwrap_or_else(system_theme);
    info!(theme = theme.as_str(), "theme resolved");

    let (tx, _rx) = watch::channel(theme);
    Self { storage, tx }
  }

  pub fn theme(&self) -> Theme {
    *self.tx.borrow()
  }

  pub fn is_dark(&self) -> bool {
    self.theme() == Theme::Dark
  }

  pub fn palette(&self) -> Palette {
    self.theme().palette()
  }

  pub fn subscribe(&self) -> ThemeWatch {
    ThemeWatch(self.tx.subscribe())
  }

  pub fn toggle(&self) -> Result<Theme> {
    let theme = self.theme().toggled();
    self.set(theme)?;
    Ok(theme)
  }

  pub fn set(&self, theme: Theme) -> Result<()> {
    self.storage.set(keys::THEME, theme.as_str())?;
    self.tx.send_replace(theme);
    info!(theme = theme.as_str(), "theme changed");
    Ok(())
  }

  /// Forget the stored choice and follow the system preference again.
  pub fn reset_to_system(&self) -> Result<Theme> {
    self.storage.remove(keys::THEME)?;
    let theme = system_theme();
    self.tx.send_replace(theme);
    Ok(theme)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn storage() -> Arc<LocalStorage> {
    Arc::new(LocalStorage::open_in_memory().unwrap())
  }

  #[test]
  fn test_parse_and_toggle() {
    assert_eq!(Theme::parse("Dark"), Some(Theme::Dark));
    assert_eq!(Theme::parse(" light "), Some(Theme::Light));
    assert_eq!(Theme::parse("sepia"), None);
    assert_eq!(Theme::Light.toggled(), Theme::Dark);
    assert_eq!(Theme::Dark.toggled(), Theme::Light);
  }

  #[test]
  fn test_colorfgbg_detection() {
    assert_eq!(theme_from_colorfgbg(Some("15;0")), Theme::Dark);
    assert_eq!(theme_from_colorfgbg(Some("15;default;8")), Theme::Dark);
    assert_eq!(theme_from_colorfgbg(Some("0;15")), Theme::Light);
    assert_eq!(theme_from_colorfgbg(Some("garbage")), Theme::Light);
    assert_eq!(theme_from_colorfgbg(None), Theme::Light);
  }

  #[test]
  fn test_stored_theme_wins_over_preference() {
    let storage = storage();
    storage.set(keys::THEME, "dark").unwrap();

    let store = ThemeStore::load(storage, Some(Theme::Light));
    assert!(store.is_dark());
  }

  #[test]
  fn test_preference_used_when_nothing_stored() {
    let store = ThemeStore::load(storage(), Some(Theme::Dark));
    assert_eq!(store.theme(), Theme::Dark);
  }

  #[test]
  fn test_toggle_persists_and_notifies() {
    let storage = storage();
    let store = ThemeStore::load(storage.clone(), Some(Theme::Light));
    let watch = store.subscribe();

    assert_eq!(store.toggle().unwrap(), Theme::Dark);
    assert_eq!(watch.theme(), Theme::Dark);
    assert_eq!(watch.palette(), Theme::Dark.palette());
    assert_eq!(storage.get(keys::THEME).unwrap().as_deref(), Some("dark"));

    // A fresh store picks the persisted choice back up
    let reloaded = ThemeStore::load(storage, Some(Theme::Light));
    assert_eq!(reloaded.theme(), Theme::Dark);
  }

  #[test]
  fn test_reset_to_system_forgets_choice() {
    let storage = storage();
    let store = ThemeStore::load(storage.clone(), None);
    store.set(Theme::Dark).unwrap();

    store.reset_to_system().unwrap();
    assert_eq!(storage.get(keys::THEME).unwrap(), None);
  }
}
