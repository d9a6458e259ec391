use crate::theme::Palette;
use crate::ui::renderfns::centered_rect;
use crate::ui::view::View;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tracing::error;

/// Wraps a view's render step. The first failure is logged and the view is
/// replaced by a fallback panel until `reset`.
#[derive(Debug, Default)]
pub struct ErrorBoundary {
  failure: Option<String>,
}

impl ErrorBoundary {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn has_failed(&self) -> bool {
    self.failure.is_some()
  }

  pub fn failure(&self) -> Option<&str> {
    self.failure.as_deref()
  }

  /// Clear the failure so the next frame renders the view again
  pub fn reset(&mut self) {
    self.failure = None;
  }

  /// `R` resets a failed boundary. Other keys are left to the caller.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    if self.has_failed() && key.code == KeyCode::Char('R') {
      self.reset();
      return true;
    }
    false
  }

  pub fn render(&mut self, view: &mut dyn View, frame: &mut Frame, area: Rect, palette: &Palette) {
    if self.failure.is_none() {
      match view.render(frame, area) {
        Ok(()) => return,
        Err(e) => {
          error!(view = %view.breadcrumb_label(), error = ?e, "view failed to render");
          self.failure = Some(e.to_string());
        }
      }
    }

    if let Some(message) = &self.failure {
      draw_fallback(frame, area, palette, message);
    }
  }
}

fn draw_fallback(frame: &mut Frame, area: Rect, palette: &Palette, message: &str) {
  frame.render_widget(Clear, area);

  let popup = centered_rect(70, 7, area);
  let block = Block::default()
    .title(" Something went wrong ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(palette.error))
    .style(Style::default().bg(palette.bg).fg(palette.fg));

  let text = vec![
    Line::styled(message.to_string(), Style::default().fg(palette.error)),
    Line::raw(""),
    Line::from(vec![
      Span::raw("Press "),
      Span::styled("R", Style::default().fg(palette.accent).bold()),
      Span::raw(" to reset, "),
      Span::styled(":", Style::default().fg(palette.accent).bold()),
      Span::raw(" to switch view"),
    ]),
  ];

  frame.render_widget(
    Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
    popup,
  );
}
