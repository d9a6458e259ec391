use crate::tasks::Priority;
use crate::theme::Palette;
use ratatui::prelude::*;

/// Truncate a string to at most `max_len` characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for a task priority
pub fn priority_color(priority: Priority, palette: &Palette) -> Color {
  match priority {
    Priority::High => palette.error,
    Priority::Medium => palette.warning,
    Priority::Low => palette.success,
  }
}

/// A `width` percent wide, `height` rows tall rectangle centered in `area`
pub fn centered_rect(width_percent: u16, height: u16, area: Rect) -> Rect {
  let width = (area.width * width_percent / 100).max(20).min(area.width);
  let height = height.min(area.height);
  Rect::new(
    area.x + (area.width - width) / 2,
    area.y + (area.height - height) / 2,
    width,
    height,
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::theme::Theme;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("ünïcödé text", 7), "ünïc...");
  }

  #[test]
  fn test_priority_color() {
    let palette = Theme::Dark.palette();
    assert_eq!(priority_color(Priority::High, &palette), palette.error);
    assert_eq!(priority_color(Priority::Medium, &palette), palette.warning);
    assert_eq!(priority_color(Priority::Low, &palette), palette.success);
  }

  #[test]
  fn test_centered_rect_fits_inside() {
    let area = Rect::new(0, 0, 100, 40);
    let rect = centered_rect(60, 10, area);
    assert_eq!(rect, Rect::new(20, 15, 60, 10));

    let tiny = Rect::new(0, 0, 10, 4);
    let rect = centered_rect(60, 10, tiny);
    assert_eq!(rect, tiny);
  }
}
