pub mod boundary;
pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use color_eyre::{eyre::eyre, Result};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;

/// Keep a list selection inside `0..len`, selecting the first row when
/// nothing is selected and clearing it for an empty list.
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  if len == 0 {
    state.select(None);
    return;
  }
  match state.selected() {
    None => state.select(Some(0)),
    Some(i) if i >= len => state.select(Some(len - 1)),
    Some(_) => {}
  }
}

/// Fail when `area` is smaller than a view can lay itself out in.
pub fn ensure_min_size(area: Rect, width: u16, height: u16) -> Result<()> {
  if area.width < width || area.height < height {
    return Err(eyre!(
      "Terminal too small: need at least {}x{}, have {}x{}",
      width,
      height,
      area.width,
      area.height
    ));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_ensure_valid_selection() {
    let mut state = ListState::default();
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(0));

    state.select(Some(7));
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(2));

    ensure_valid_selection(&mut state, 0);
    assert_eq!(state.selected(), None);
  }

  #[test]
  fn test_ensure_min_size() {
    assert!(ensure_min_size(Rect::new(0, 0, 80, 24), 40, 10).is_ok());
    let err = ensure_min_size(Rect::new(0, 0, 30, 24), 40, 10).unwrap_err();
    assert_eq!(
      err.to_string(),
      "Terminal too small: need at least 40x10, have 30x24"
    );
  }
}
