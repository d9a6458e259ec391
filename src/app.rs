use crate::api::ApiClient;
use crate::commands;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::storage::LocalStorage;
use crate::theme::ThemeStore;
use crate::ui::boundary::ErrorBoundary;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::renderfns::{draw_footer, draw_header};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{AboutView, ApiBrowserView, TaskListView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::Block;
use std::io::stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);
const STATUS_TTL: Duration = Duration::from_secs(4);

struct StatusMessage {
  text: String,
  shown_at: Instant,
}

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  views: Vec<Box<dyn View>>,
  boundary: ErrorBoundary,
  command: CommandInput,
  theme: ThemeStore,
  storage: Arc<LocalStorage>,
  api: ApiClient,
  config: Config,
  status: Option<StatusMessage>,
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, storage: Arc<LocalStorage>) -> Result<Self> {
    let api = ApiClient::new(&config.api)?;
    let theme = ThemeStore::load(storage.clone(), config.theme);
    let root = TaskListView::new(storage.clone(), theme.subscribe())?;

    Ok(Self {
      views: vec![Box::new(root)],
      boundary: ErrorBoundary::new(),
      command: CommandInput::new(),
      theme,
      storage,
      api,
      config,
      status: None,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.run_loop(&mut terminal).await;

    // Restore the terminal even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
  }

  async fn run_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);
    info!("taskdeck started");

    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => self.tick(),
        Some(Event::Resize) => {}
        None => break,
      }
    }

    info!("taskdeck exiting");
    Ok(())
  }

  fn tick(&mut self) {
    for view in self.views.iter_mut() {
      view.tick();
    }
    if let Some(message) = self.current_view_mut().and_then(|v| v.take_notification()) {
      self.notify(message);
    }
    if self
      .status
      .as_ref()
      .is_some_and(|s| s.shown_at.elapsed() > STATUS_TTL)
    {
      self.status = None;
    }
  }

  fn notify(&mut self, text: impl Into<String>) {
    let text = text.into();
    info!(message = %text, "status");
    self.status = Some(StatusMessage {
      text,
      shown_at: Instant::now(),
    });
  }

  pub fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    if self.boundary.handle_key(key) {
      self.notify("View reset");
      return;
    }

    match self.command.handle_key(key) {
      KeyResult::Event(CommandEvent::Submitted(cmd)) => {
        self.execute_command(&cmd);
        return;
      }
      KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    let captures_input = self.current_view().is_some_and(|v| v.captures_input());
    if !captures_input {
      match key.code {
        KeyCode::Char('q') => {
          self.pop_or_quit();
          return;
        }
        KeyCode::Char('t') => {
          self.toggle_theme();
          return;
        }
        _ => {}
      }
    }

    if self.boundary.has_failed() {
      return;
    }

    if let Some(view) = self.current_view_mut() {
      let action = view.handle_key(key);
      self.apply(action);
    }
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => {
        self.views.push(view);
        self.boundary.reset();
      }
      ViewAction::Pop => {
        // Esc never leaves the root view
        if self.views.len() > 1 {
          self.views.pop();
          self.boundary.reset();
        }
      }
      ViewAction::Replace(view) => self.replace_root(view),
      ViewAction::Notify(message) => self.notify(message),
      ViewAction::Quit => self.should_quit = true,
    }
  }

  fn pop_or_quit(&mut self) {
    if self.views.len() > 1 {
      self.views.pop();
      self.boundary.reset();
    } else {
      self.should_quit = true;
    }
  }

  fn replace_root(&mut self, view: Box<dyn View>) {
    self.views.clear();
    self.views.push(view);
    self.boundary.reset();
  }

  fn toggle_theme(&mut self) {
    match self.theme.toggle() {
      Ok(theme) => self.notify(format!("Theme: {}", theme.as_str())),
      Err(e) => {
        warn!(error = %e, "failed to toggle theme");
        self.notify(format!("Failed to save theme: {}", e));
      }
    }
  }

  fn execute_command(&mut self, input: &str) {
    let Some(cmd) = commands::find(input) else {
      if !input.is_empty() {
        self.notify(format!("Unknown command: {}", input));
      }
      return;
    };

    match cmd.name {
      "tasks" => match TaskListView::new(self.storage.clone(), self.theme.subscribe()) {
        Ok(view) => self.apply(ViewAction::Replace(Box::new(view))),
        Err(e) => self.notify(format!("Failed to open tasks: {}", e)),
      },
      "api" => {
        let view = ApiBrowserView::new(
          self.api.clone(),
          self.storage.clone(),
          self.theme.subscribe(),
          &self.config,
        );
        self.apply(ViewAction::Replace(Box::new(view)));
      }
      "about" => self.apply(ViewAction::Push(Box::new(AboutView::new(
        self.theme.subscribe(),
      )))),
      "theme" => self.toggle_theme(),
      "quit" => self.apply(ViewAction::Quit),
      other => warn!(command = other, "command has no handler"),
    }
  }

  fn draw(&mut self, frame: &mut Frame) {
    let palette = self.theme.palette();
    frame.render_widget(
      Block::default().style(Style::default().bg(palette.bg).fg(palette.fg)),
      frame.area(),
    );

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Header
        Constraint::Min(1),    // View
        Constraint::Length(1), // Footer
      ])
      .split(frame.area());

    let shortcuts: Vec<ShortcutInfo> = self
      .current_view()
      .map(|v| v.shortcuts())
      .unwrap_or_default();
    draw_header(
      frame,
      chunks[0],
      &palette,
      self.theme.theme(),
      &self.config.api.base_url,
      &shortcuts,
    );

    if let Some(view) = self.views.last_mut() {
      self.boundary.render(view.as_mut(), frame, chunks[1], &palette);
    }

    let breadcrumb = self.view_breadcrumb();
    draw_footer(
      frame,
      chunks[2],
      &palette,
      &breadcrumb,
      self.status.as_ref().map(|s| s.text.as_str()),
    );

    self.command.render_overlay(frame, chunks[1], &palette);
  }

  fn current_view(&self) -> Option<&dyn View> {
    self.views.last().map(|v| v.as_ref())
  }

  fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.views.last_mut()
  }

  pub fn view_breadcrumb(&self) -> Vec<String> {
    self.views.iter().map(|v| v.breadcrumb_label()).collect()
  }

  pub fn should_quit(&self) -> bool {
    self.should_quit
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::theme::Theme;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn app() -> App {
    let storage = Arc::new(LocalStorage::open_in_memory().unwrap());
    let mut config = Config {
      theme: Some(Theme::Light),
      ..Config::default()
    };
    // Nothing listens here, so API requests fail fast
    config.api.base_url = "http://127.0.0.1:9".to_string();
    App::new(config, storage).unwrap()
  }

  fn run_command(app: &mut App, name: &str) {
    app.handle_key(key(KeyCode::Char(':')));
    for c in name.chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
    app.handle_key(key(KeyCode::Enter));
  }

  #[tokio::test]
  async fn test_starts_on_task_list() {
    let app = app();
    assert_eq!(app.view_breadcrumb(), vec!["Tasks [All]"]);
  }

  #[tokio::test]
  async fn test_t_toggles_theme_and_persists() {
    let mut app = app();
    app.handle_key(key(KeyCode::Char('t')));
    assert!(app.theme.is_dark());
    assert_eq!(
      app.storage.get(crate::storage::keys::THEME).unwrap().as_deref(),
      Some("dark")
    );
  }

  #[tokio::test]
  async fn test_t_is_typed_while_view_captures_input() {
    let mut app = app();
    app.handle_key(key(KeyCode::Char('a')));
    app.handle_key(key(KeyCode::Char('t')));
    assert!(!app.theme.is_dark());
  }

  #[tokio::test]
  async fn test_about_pushes_and_q_pops() {
    let mut app = app();
    run_command(&mut app, "about");
    assert_eq!(app.view_breadcrumb(), vec!["Tasks [All]", "About"]);

    app.handle_key(key(KeyCode::Char('q')));
    assert_eq!(app.view_breadcrumb().len(), 1);
    assert!(!app.should_quit());

    app.handle_key(key(KeyCode::Char('q')));
    assert!(app.should_quit());
  }

  #[tokio::test]
  async fn test_api_command_replaces_root() {
    let mut app = app();
    run_command(&mut app, "about");
    run_command(&mut app, "api");
    assert_eq!(app.view_breadcrumb(), vec!["API [Posts]"]);
  }

  #[tokio::test]
  async fn test_unknown_command_sets_status() {
    let mut app = app();
    run_command(&mut app, "zzz");
    assert_eq!(
      app.status.as_ref().map(|s| s.text.as_str()),
      Some("Unknown command: zzz")
    );
  }

  #[tokio::test]
  async fn test_ctrl_c_quits() {
    let mut app = app();
    app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit());
  }
}
