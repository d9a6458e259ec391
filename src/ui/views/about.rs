use crate::theme::ThemeWatch;
use crate::ui::ensure_min_size;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

const FEATURES: &[&str] = &[
  "Task management with priorities, search and completion tracking",
  "Tasks, filter and theme are saved locally between runs",
  "Light and dark themes",
  "JSONPlaceholder browser with pagination and debounced search",
  "Responses cached for five minutes, stale requests cancelled",
];

const KEYS: &[(&str, &str)] = &[
  (":", "open the command palette (tasks, api, about, theme, quit)"),
  ("t", "toggle light/dark theme"),
  ("q", "go back, or quit from the first screen"),
  ("Ctrl-C", "quit"),
  ("j / k", "move selection"),
  ("/", "search"),
  ("a e d", "add, edit, delete a task"),
  ("space", "toggle task completion"),
  ("C", "clear completed tasks"),
  ("tab", "next filter or tab"),
  ("n / p", "next or previous page"),
  ("r", "refresh, bypassing the cache"),
  ("R", "reset a view after a display error"),
];

/// Static description of the app and its key bindings
pub struct AboutView {
  theme: ThemeWatch,
  scroll: u16,
}

impl AboutView {
  pub fn new(theme: ThemeWatch) -> Self {
    Self { theme, scroll: 0 }
  }
}

impl View for AboutView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
      KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
      KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
    ensure_min_size(area, 40, 8)?;
    let palette = self.theme.palette();

    let heading = Style::default().fg(palette.accent).bold();
    let mut lines = vec![
      Line::styled(
        format!("taskdeck {}", env!("CARGO_PKG_VERSION")),
        heading,
      ),
      Line::styled(
        "A small task manager with a REST API data browser.",
        Style::default().fg(palette.fg),
      ),
      Line::raw(""),
      Line::styled("Features", heading),
    ];
    lines.extend(FEATURES.iter().map(|f| {
      Line::from(vec![
        Span::styled("  • ", Style::default().fg(palette.accent)),
        Span::styled(*f, Style::default().fg(palette.fg)),
      ])
    }));
    lines.push(Line::raw(""));
    lines.push(Line::styled("Keys", heading));
    lines.extend(KEYS.iter().map(|(key, action)| {
      Line::from(vec![
        Span::styled(format!("  {:<8}", key), Style::default().fg(palette.warning)),
        Span::styled(*action, Style::default().fg(palette.fg)),
      ])
    }));

    let block = Block::default()
      .title(" About ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(palette.border));
    frame.render_widget(
      Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((self.scroll, 0)),
      area,
    );
    Ok(())
  }

  fn breadcrumb_label(&self) -> String {
    "About".to_string()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("j/k", "scroll").with_priority(10),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
