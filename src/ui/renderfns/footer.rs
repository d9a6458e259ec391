use crate::theme::Palette;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the footer bar with view breadcrumb and, right-aligned, the latest
/// status message
pub fn draw_footer(
  frame: &mut Frame,
  area: Rect,
  palette: &Palette,
  breadcrumb: &[String],
  status: Option<&str>,
) {
  let mut spans = vec![Span::raw(" ")];

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(palette.muted)));
    }

    let style = if i == breadcrumb.len() - 1 {
      Style::default().fg(palette.accent).bold()
    } else {
      Style::default().fg(palette.fg)
    };

    spans.push(Span::styled(part.clone(), style));
  }

  let chunks = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
    .split(area);

  let style = Style::default().bg(palette.bg);
  frame.render_widget(Paragraph::new(Line::from(spans)).style(style), chunks[0]);

  if let Some(status) = status {
    let message = Paragraph::new(format!("{} ", status))
      .style(style.fg(palette.warning))
      .alignment(Alignment::Right);
    frame.render_widget(message, chunks[1]);
  } else {
    frame.render_widget(Paragraph::new("").style(style), chunks[1]);
  }
}
