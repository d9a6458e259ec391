use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::tasks::{Priority, Task};
use crate::theme::Palette;
use crate::ui::renderfns::{centered_rect, priority_color};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Title,
  Description,
  Priority,
}

impl Field {
  fn next(self) -> Self {
    match self {
      Field::Title => Field::Description,
      Field::Description => Field::Priority,
      Field::Priority => Field::Title,
    }
  }

  fn previous(self) -> Self {
    match self {
      Field::Title => Field::Priority,
      Field::Description => Field::Title,
      Field::Priority => Field::Description,
    }
  }
}

/// Values entered in the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
  pub title: String,
  pub description: String,
  pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
  Submitted(TaskDraft),
  Cancelled,
}

/// Modal form for creating or editing a task
#[derive(Debug, Clone)]
pub struct TaskForm {
  editing: Option<Uuid>,
  title: TextInput,
  description: TextInput,
  priority: Priority,
  focus: Field,
  error: Option<String>,
}

impl TaskForm {
  pub fn new() -> Self {
    Self {
      editing: None,
      title: TextInput::new(),
      description: TextInput::new(),
      priority: Priority::default(),
      focus: Field::Title,
      error: None,
    }
  }

  pub fn edit(task: &Task) -> Self {
    Self {
      editing: Some(task.id),
      title: TextInput::with_value(&task.title),
      description: TextInput::with_value(&task.description),
      priority: task.priority,
      focus: Field::Title,
      error: None,
    }
  }

  /// Id of the task being edited, `None` when adding
  pub fn editing(&self) -> Option<Uuid> {
    self.editing
  }

  /// Show a validation message returned by the store
  pub fn set_error(&mut self, message: impl Into<String>) {
    self.error = Some(message.into());
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    match key.code {
      KeyCode::Esc => return KeyResult::Event(FormEvent::Cancelled),
      KeyCode::Tab => {
        self.focus = self.focus.next();
        return KeyResult::Handled;
      }
      KeyCode::BackTab => {
        self.focus = self.focus.previous();
        return KeyResult::Handled;
      }
      KeyCode::Enter => {
        if self.title.value().trim().is_empty() {
          self.error = Some("Title is required".to_string());
          self.focus = Field::Title;
          return KeyResult::Handled;
        }
        return KeyResult::Event(FormEvent::Submitted(TaskDraft {
          title: self.title.value().trim().to_string(),
          description: self.description.value().trim().to_string(),
          priority: self.priority,
        }));
      }
      _ => {}
    }

    let input = match self.focus {
      Field::Title => &mut self.title,
      Field::Description => &mut self.description,
      Field::Priority => {
        match key.code {
          KeyCode::Char(' ') | KeyCode::Right | KeyCode::Char('l') => {
            self.priority = self.priority.next()
          }
          KeyCode::Left | KeyCode::Char('h') => {
            self.priority = self.priority.next().next();
          }
          _ => {}
        }
        return KeyResult::Handled;
      }
    };

    if input.handle_key(key) == InputResult::Consumed {
      self.error = None;
    }
    KeyResult::Handled
  }

  pub fn render(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
    let popup = centered_rect(60, 11, area);
    frame.render_widget(Clear, popup);

    let title = if self.editing.is_some() {
      " Edit task "
    } else {
      " New task "
    };
    let block = Block::default()
      .title(title)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(palette.accent))
      .style(Style::default().bg(palette.bg).fg(palette.fg));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let label = |field: Field, text: &'static str| {
      let style = if self.focus == field {
        Style::default().fg(palette.accent).bold()
      } else {
        Style::default().fg(palette.muted)
      };
      Span::styled(format!("{:<13}", text), style)
    };
    let value = |field: Field, input: &TextInput| -> Vec<Span<'static>> {
      if self.focus == field {
        let (before, after) = input.split_at_cursor();
        vec![
          Span::raw(before.to_string()),
          Span::styled("_", Style::default().fg(palette.accent)),
          Span::raw(after.to_string()),
        ]
      } else {
        vec![Span::raw(input.value().to_string())]
      }
    };

    let mut title_line = vec![label(Field::Title, "Title")];
    title_line.extend(value(Field::Title, &self.title));
    let mut description_line = vec![label(Field::Description, "Description")];
    description_line.extend(value(Field::Description, &self.description));

    let mut lines = vec![
      Line::from(title_line),
      Line::raw(""),
      Line::from(description_line),
      Line::raw(""),
      Line::from(vec![
        label(Field::Priority, "Priority"),
        Span::styled(
          format!("< {} >", self.priority.label()),
          Style::default().fg(priority_color(self.priority, palette)),
        ),
      ]),
      Line::raw(""),
    ];

    match &self.error {
      Some(error) => lines.push(Line::styled(
        error.clone(),
        Style::default().fg(palette.error),
      )),
      None => lines.push(Line::styled(
        "Tab next field · Enter save · Esc cancel",
        Style::default().fg(palette.muted),
      )),
    }

    frame.render_widget(Paragraph::new(lines), inner);
  }
}

impl Default for TaskForm {
  fn default() -> Self {
    Self::new()
  }
}
