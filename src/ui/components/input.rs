use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Result of handling a key event in an input component
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResult {
  /// Key was handled, continue input mode
  Consumed,
  /// Enter pressed, here's the submitted value
  Submitted(String),
  /// Escape pressed, input cancelled
  Cancelled,
  /// Key not handled, pass to next handler
  NotHandled,
}

/// Single-line text input.
///
/// The cursor counts characters, not bytes, so editing never splits a
/// multi-byte character.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
  buffer: String,
  cursor: usize,
}

impl TextInput {
  pub fn new() -> Self {
    Self::default()
  }

  /// Start with `value`, cursor at the end
  pub fn with_value(value: &str) -> Self {
    Self {
      buffer: value.to_string(),
      cursor: value.chars().count(),
    }
  }

  pub fn value(&self) -> &str {
    &self.buffer
  }

  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  pub fn clear(&mut self) {
    self.buffer.clear();
    self.cursor = 0;
  }

  fn len(&self) -> usize {
    self.buffer.chars().count()
  }

  /// Byte offset of the character at `cursor`
  fn byte_index(&self, cursor: usize) -> usize {
    self
      .buffer
      .char_indices()
      .nth(cursor)
      .map(|(i, _)| i)
      .unwrap_or(self.buffer.len())
  }

  /// Handle a key event, returning the result
  pub fn handle_key(&mut self, key: KeyEvent) -> InputResult {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
      KeyCode::Esc => InputResult::Cancelled,
      KeyCode::Enter => InputResult::Submitted(self.buffer.clone()),
      KeyCode::Backspace => {
        if self.cursor > 0 {
          self.cursor -= 1;
          let at = self.byte_index(self.cursor);
          self.buffer.remove(at);
        }
        InputResult::Consumed
      }
      KeyCode::Delete => {
        if self.cursor < self.len() {
          let at = self.byte_index(self.cursor);
          self.buffer.remove(at);
        }
        InputResult::Consumed
      }
      KeyCode::Left => {
        self.cursor = self.cursor.saturating_sub(1);
        InputResult::Consumed
      }
      KeyCode::Right => {
        if self.cursor < self.len() {
          self.cursor += 1;
        }
        InputResult::Consumed
      }
      KeyCode::Home => {
        self.cursor = 0;
        InputResult::Consumed
      }
      KeyCode::End => {
        self.cursor = self.len();
        InputResult::Consumed
      }
      KeyCode::Char('a') if ctrl => {
        self.cursor = 0;
        InputResult::Consumed
      }
      KeyCode::Char('e') if ctrl => {
        self.cursor = self.len();
        InputResult::Consumed
      }
      KeyCode::Char('u') if ctrl => {
        // Clear line before cursor
        let at = self.byte_index(self.cursor);
        self.buffer = self.buffer[at..].to_string();
        self.cursor = 0;
        InputResult::Consumed
      }
      KeyCode::Char('w') if ctrl => {
        // Delete word before cursor
        if self.cursor > 0 {
          let at = self.byte_index(self.cursor);
          let before = &self.buffer[..at];
          let start = before.trim_end().rfind(' ').map(|i| i + 1).unwrap_or(0);
          self.cursor = self.buffer[..start].chars().count();
          self.buffer.replace_range(start..at, "");
        }
        InputResult::Consumed
      }
      KeyCode::Char(_) if ctrl => InputResult::NotHandled,
      KeyCode::Char(c) => {
        let at = self.byte_index(self.cursor);
        self.buffer.insert(at, c);
        self.cursor += 1;
        InputResult::Consumed
      }
      _ => InputResult::NotHandled,
    }
  }

  /// Cursor position in characters, for rendering
  pub fn cursor_position(&self) -> usize {
    self.cursor
  }

  /// Text before and after the cursor
  pub fn split_at_cursor(&self) -> (&str, &str) {
    self.buffer.split_at(self.byte_index(self.cursor))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn ctrl_key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::CONTROL)
  }

  fn typed(text: &str) -> TextInput {
    let mut input = TextInput::new();
    for c in text.chars() {
      input.handle_key(key(KeyCode::Char(c)));
    }
    input
  }

  #[test]
  fn test_basic_input() {
    let input = typed("hi");
    assert_eq!(input.value(), "hi");
    assert_eq!(input.cursor_position(), 2);
  }

  #[test]
  fn test_submit() {
    let mut input = typed("test");
    let result = input.handle_key(key(KeyCode::Enter));
    assert_eq!(result, InputResult::Submitted("test".to_string()));
  }

  #[test]
  fn test_cancel() {
    let mut input = typed("x");
    assert_eq!(input.handle_key(key(KeyCode::Esc)), InputResult::Cancelled);
  }

  #[test]
  fn test_backspace() {
    let mut input = typed("abc");
    input.handle_key(key(KeyCode::Backspace));
    assert_eq!(input.value(), "ab");
  }

  #[test]
  fn test_cursor_movement() {
    let mut input = typed("ac");
    input.handle_key(key(KeyCode::Left));
    input.handle_key(key(KeyCode::Char('b')));
    assert_eq!(input.value(), "abc");
  }

  #[test]
  fn test_multibyte_editing() {
    let mut input = typed("café");
    input.handle_key(key(KeyCode::Left));
    input.handle_key(key(KeyCode::Backspace));
    assert_eq!(input.value(), "caé");

    input.handle_key(key(KeyCode::Delete));
    assert_eq!(input.value(), "ca");
    assert_eq!(input.split_at_cursor(), ("ca", ""));
  }

  #[test]
  fn test_ctrl_u_clear_before_cursor() {
    let mut input = typed("hello world");
    for _ in 0..5 {
      input.handle_key(key(KeyCode::Left));
    }
    input.handle_key(ctrl_key(KeyCode::Char('u')));
    assert_eq!(input.value(), "world");
    assert_eq!(input.cursor_position(), 0);
  }

  #[test]
  fn test_ctrl_w_deletes_previous_word() {
    let mut input = typed("buy oat milk");
    input.handle_key(ctrl_key(KeyCode::Char('w')));
    assert_eq!(input.value(), "buy oat ");
    assert_eq!(input.cursor_position(), 8);
  }

  #[test]
  fn test_with_value_places_cursor_at_end() {
    let mut input = TextInput::with_value("über");
    input.handle_key(key(KeyCode::Char('!')));
    assert_eq!(input.value(), "über!");
  }

  #[test]
  fn test_unbound_ctrl_chord_is_not_inserted() {
    let mut input = typed("a");
    assert_eq!(
      input.handle_key(ctrl_key(KeyCode::Char('c'))),
      InputResult::NotHandled
    );
    assert_eq!(input.value(), "a");
  }
}
