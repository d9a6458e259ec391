use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::theme::Palette;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events emitted by search input that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
  /// Search query changed (emitted on each keystroke, empty string on cancel)
  Changed(String),
  /// Search submitted (overlay closed, filter persists)
  Submitted(String),
}

/// Search input component with activation/deactivation
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
  input: TextInput,
  active: bool,
}

impl SearchInput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn query(&self) -> &str {
    self.input.value()
  }

  /// Open the overlay, keeping the current query for further editing
  pub fn activate(&mut self) {
    self.active = true;
  }

  /// Close the overlay and forget the query
  pub fn clear(&mut self) {
    self.active = false;
    self.input.clear();
  }

  /// Handle a key event
  /// Call this regardless of active state - it handles activation too
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<SearchEvent> {
    if !self.active {
      if key.code == KeyCode::Char('/') {
        self.activate();
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(query) => {
        self.active = false;
        KeyResult::Event(SearchEvent::Submitted(query.trim().to_string()))
      }
      InputResult::Cancelled => {
        self.clear();
        KeyResult::Event(SearchEvent::Changed(String::new()))
      }
      InputResult::Consumed => {
        KeyResult::Event(SearchEvent::Changed(self.input.value().to_string()))
      }
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  /// Render the search overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
    if !self.active {
      return;
    }

    let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
    let height = 3.min(area.height);
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width.saturating_sub(1), height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(palette.warning))
      .style(Style::default().bg(palette.bg).fg(palette.fg))
      .title(" Search ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let (before, after) = self.input.split_at_cursor();
    let input_line = Line::from(vec![
      Span::styled("/", Style::default().fg(palette.warning)),
      Span::raw(before),
      Span::styled("_", Style::default().fg(palette.warning)),
      Span::raw(after),
    ]);
    frame.render_widget(Paragraph::new(input_line), inner);
  }
}
