use crate::theme::{Palette, Theme};
use crate::ui::view::ShortcutInfo;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with logo, context, and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  palette: &Palette,
  theme: Theme,
  api_url: &str,
  shortcuts: &[ShortcutInfo],
) {
  let theme_label = match theme {
    Theme::Light => "☀ light",
    Theme::Dark => "☾ dark",
  };

  let mut spans = vec![
    Span::styled(" taskdeck ", Style::default().fg(palette.accent).bold()),
    Span::styled("│", Style::default().fg(palette.muted)),
    Span::styled(format!(" {} ", theme_label), Style::default().fg(palette.fg)),
    Span::styled("│", Style::default().fg(palette.muted)),
    Span::styled(
      format!(" {} ", extract_domain(api_url)),
      Style::default().fg(palette.warning),
    ),
    Span::raw(" "),
  ];

  let mut shortcuts = shortcuts.to_vec();
  shortcuts.sort_by_key(|s| s.priority);
  for shortcut in shortcuts {
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(palette.accent),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(palette.muted),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(palette.bg));
  frame.render_widget(paragraph, area);
}

/// Extract the host from the API base URL
fn extract_domain(url: &str) -> &str {
  let rest = url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url);
  rest.split('/').next().unwrap_or(rest)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_extract_domain() {
    assert_eq!(
      extract_domain("https://jsonplaceholder.typicode.com"),
      "jsonplaceholder.typicode.com"
    );
    assert_eq!(extract_domain("https://api.example.com/v1"), "api.example.com");
    assert_eq!(extract_domain("http://localhost:8080"), "localhost:8080");
  }
}
