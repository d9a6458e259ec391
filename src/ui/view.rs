use color_eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// Actions that a view can request in response to user input
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
  /// Replace the whole stack with a new root view
  Replace(Box<dyn View>),
  /// Show a message in the footer
  Notify(String),
  /// Exit the application
  Quit,
}

/// Trait for view behavior
///
/// Views handle their own input modes (search, forms, etc.) and return
/// actions for the App to execute: App → View → Components.
///
/// Views that load data asynchronously hold a `Query` and poll it in
/// `tick()`.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view. An error replaces the view with the error fallback
  /// until it is reset.
  fn render(&mut self, frame: &mut Frame, area: Rect) -> Result<()>;

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Whether a text field currently has focus, so global shortcuts must not
  /// fire
  fn captures_input(&self) -> bool {
    false
  }

  /// Called on each tick to allow views to poll async queries
  fn tick(&mut self) {}

  /// Messages produced by background work since the last call
  fn take_notification(&mut self) -> Option<String> {
    None
  }

  /// Keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("t", "theme").with_priority(20),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
