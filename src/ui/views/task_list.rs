use crate::storage::{keys, LocalStorage};
use crate::tasks::{Task, TaskFilter, TaskPatch, TaskStore};
use crate::theme::ThemeWatch;
use crate::ui::components::{FormEvent, KeyResult, SearchEvent, SearchInput, TaskDraft, TaskForm};
use crate::ui::renderfns::{priority_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::{ensure_min_size, ensure_valid_selection};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Tabs};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// The task manager: filter tabs, search, and add/edit/toggle/delete
pub struct TaskListView {
  store: TaskStore,
  storage: Arc<LocalStorage>,
  theme: ThemeWatch,
  filter: TaskFilter,
  search: SearchInput,
  list_state: ListState,
  form: Option<TaskForm>,
}

impl TaskListView {
  pub fn new(storage: Arc<LocalStorage>, theme: ThemeWatch) -> Result<Self> {
    let store = TaskStore::load(storage.clone())?;
    let filter = storage
      .get_json::<TaskFilter>(keys::TASK_FILTER)
      .unwrap_or_else(|e| {
        warn!(error = %e, "stored task filter is unreadable");
        None
      })
      .unwrap_or_default();

    Ok(Self {
      store,
      storage,
      theme,
      filter,
      search: SearchInput::new(),
      list_state: ListState::default(),
      form: None,
    })
  }

  /// Tasks currently on screen
  fn visible(&self) -> Vec<&Task> {
    self.store.search(self.filter, self.search.query())
  }

  fn selected_id(&self) -> Option<Uuid> {
    let index = self.list_state.selected()?;
    self.visible().get(index).map(|t| t.id)
  }

  fn set_filter(&mut self, filter: TaskFilter) {
    self.filter = filter;
    self.list_state.select(Some(0));
    if let Err(e) = self.storage.set_json(keys::TASK_FILTER, &filter) {
      warn!(error = %e, "failed to save task filter");
    }
  }

  fn submit_form(&mut self, draft: TaskDraft) -> ViewAction {
    let Some(form) = self.form.as_mut() else {
      return ViewAction::None;
    };

    let result = match form.editing() {
      Some(id) => self
        .store
        .update(
          id,
          TaskPatch {
            title: Some(draft.title.clone()),
            description: Some(draft.description),
            priority: Some(draft.priority),
          },
        )
        .map(|_| format!("Updated \"{}\"", draft.title)),
      None => self
        .store
        .add(&draft.title, &draft.description, draft.priority)
        .map(|_| format!("Added \"{}\"", draft.title)),
    };

    match result {
      Ok(message) => {
        let added = form.editing().is_none();
        self.form = None;
        if added {
          // New tasks go to the top
          self.list_state.select(Some(0));
        }
        ViewAction::Notify(message)
      }
      Err(e) => {
        form.set_error(e.to_string());
        ViewAction::None
      }
    }
  }

  fn toggle_selected(&mut self) -> ViewAction {
    let Some(id) = self.selected_id() else {
      return ViewAction::None;
    };
    match self.store.toggle(id) {
      Ok(true) => ViewAction::Notify("Task completed".to_string()),
      Ok(false) => ViewAction::Notify("Task reopened".to_string()),
      Err(e) => ViewAction::Notify(format!("Failed to update task: {}", e)),
    }
  }

  fn delete_selected(&mut self) -> ViewAction {
    let Some(id) = self.selected_id() else {
      return ViewAction::None;
    };
    match self.store.remove(id) {
      Ok(task) => ViewAction::Notify(format!("Deleted \"{}\"", truncate(&task.title, 30))),
      Err(e) => ViewAction::Notify(format!("Failed to delete task: {}", e)),
    }
  }

  fn clear_completed(&mut self) -> ViewAction {
    match self.store.clear_completed() {
      Ok(0) => ViewAction::Notify("No completed tasks".to_string()),
      Ok(n) => ViewAction::Notify(format!("Cleared {} completed task(s)", n)),
      Err(e) => ViewAction::Notify(format!("Failed to clear tasks: {}", e)),
    }
  }

  fn render_tabs(&self, frame: &mut Frame, area: Rect) {
    let palette = self.theme.palette();
    let stats = self.store.stats();
    let titles: Vec<String> = TaskFilter::ALL
      .iter()
      .map(|f| {
        let count = match f {
          TaskFilter::All => stats.total,
          TaskFilter::Active => stats.active,
          TaskFilter::Completed => stats.completed,
        };
        format!(" {} ({}) ", f.label(), count)
      })
      .collect();

    let tabs = Tabs::new(titles)
      .select(self.filter.index())
      .block(
        Block::default()
          .borders(Borders::ALL)
          .border_style(Style::default().fg(palette.border))
          .title(" Tasks "),
      )
      .style(Style::default().fg(palette.muted))
      .highlight_style(Style::default().fg(palette.accent).bold());
    frame.render_widget(tabs, area);
  }

  fn render_progress(&self, frame: &mut Frame, area: Rect) {
    let palette = self.theme.palette();
    let stats = self.store.stats();
    let label = format!(
      "{} of {} done ({}%)",
      stats.completed,
      stats.total,
      stats.completion_percent()
    );
    let gauge = Gauge::default()
      .gauge_style(Style::default().fg(palette.success).bg(palette.bg))
      .percent(u16::from(stats.completion_percent()))
      .label(label);
    frame.render_widget(gauge, area);
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let palette = self.theme.palette();
    let query = self.search.query().to_string();

    let title = if query.is_empty() {
      format!(" {} ", self.filter.label())
    } else {
      format!(" {} matching \"{}\" ", self.filter.label(), query)
    };
    let block = Block::default()
      .title(title)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(palette.border));

    let visible = self.visible();
    let len = visible.len();

    if visible.is_empty() {
      let content = if !query.is_empty() {
        "No tasks match your search."
      } else {
        match self.filter {
          TaskFilter::All => "No tasks yet. Press 'a' to add one.",
          TaskFilter::Active => "Nothing left to do.",
          TaskFilter::Completed => "No completed tasks.",
        }
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(palette.muted));
      frame.render_widget(paragraph, area);
      return;
    }

    let title_width = (area.width as usize).saturating_sub(20).clamp(10, 60);
    let items: Vec<ListItem> = visible
      .iter()
      .map(|task| {
        let (check, title_style) = if task.completed {
          (
            "[x]",
            Style::default()
              .fg(palette.muted)
              .add_modifier(Modifier::CROSSED_OUT),
          )
        } else {
          ("[ ]", Style::default().fg(palette.fg))
        };

        let mut spans = vec![
          Span::styled(format!("{} ", check), Style::default().fg(palette.accent)),
          Span::styled(
            format!("{:<7}", task.priority.label()),
            Style::default().fg(priority_color(task.priority, &palette)),
          ),
          Span::styled(truncate(&task.title, title_width), title_style),
        ];
        if !task.description.is_empty() {
          spans.push(Span::styled(
            format!("  {}", truncate(&task.description, 40)),
            Style::default().fg(palette.muted),
          ));
        }
        ListItem::new(Line::from(spans))
      })
      .collect();
    drop(visible);

    ensure_valid_selection(&mut self.list_state, len);

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(palette.highlight)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }
}

impl View for TaskListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let Some(form) = self.form.as_mut() {
      return match form.handle_key(key) {
        KeyResult::Event(FormEvent::Submitted(draft)) => self.submit_form(draft),
        KeyResult::Event(FormEvent::Cancelled) => {
          self.form = None;
          ViewAction::None
        }
        KeyResult::Handled | KeyResult::NotHandled => ViewAction::None,
      };
    }

    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(_)) | KeyResult::Handled => {
        self.list_state.select(Some(0));
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted(_)) => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('g') | KeyCode::Home => self.list_state.select_first(),
      KeyCode::Char('G') | KeyCode::End => self.list_state.select_last(),
      KeyCode::Tab => self.set_filter(self.filter.next()),
      KeyCode::BackTab => self.set_filter(self.filter.next().next()),
      KeyCode::Char('1') => self.set_filter(TaskFilter::All),
      KeyCode::Char('2') => self.set_filter(TaskFilter::Active),
      KeyCode::Char('3') => self.set_filter(TaskFilter::Completed),
      KeyCode::Char('a') => self.form = Some(TaskForm::new()),
      KeyCode::Char('e') | KeyCode::Enter => {
        if let Some(task) = self.selected_id().and_then(|id| self.store.get(id)) {
          self.form = Some(TaskForm::edit(task));
        }
      }
      KeyCode::Char(' ') | KeyCode::Char('x') => return self.toggle_selected(),
      KeyCode::Char('d') | KeyCode::Delete => return self.delete_selected(),
      KeyCode::Char('C') => return self.clear_completed(),
      KeyCode::Esc if !self.search.query().is_empty() => {
        self.search.clear();
      }
      KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
    ensure_min_size(area, 40, 8)?;

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(3), // Filter tabs
        Constraint::Length(1), // Progress
        Constraint::Min(3),    // List
      ])
      .split(area);

    self.render_tabs(frame, chunks[0]);
    self.render_progress(frame, chunks[1]);
    self.render_list(frame, chunks[2]);

    let palette = self.theme.palette();
    self.search.render_overlay(frame, chunks[2], &palette);
    if let Some(form) = &self.form {
      form.render(frame, area, &palette);
    }
    Ok(())
  }

  fn breadcrumb_label(&self) -> String {
    format!("Tasks [{}]", self.filter.label())
  }

  fn captures_input(&self) -> bool {
    self.form.is_some() || self.search.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("a", "add").with_priority(20),
      ShortcutInfo::new("space", "toggle").with_priority(30),
      ShortcutInfo::new("e", "edit").with_priority(40),
      ShortcutInfo::new("d", "delete").with_priority(50),
      ShortcutInfo::new("/", "search").with_priority(60),
      ShortcutInfo::new("tab", "filter").with_priority(70),
      ShortcutInfo::new("t", "theme").with_priority(80),
    ]
  }
}
