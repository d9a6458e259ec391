use super::types::{Priority, Task, TaskFilter, TaskPatch, TaskStats};
use crate::storage::{keys, LocalStorage};
use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Task list persisted as one JSON document in local storage.
///
/// Every mutation rewrites the whole list, and the in-memory copy only
/// changes once that write succeeds.
pub struct TaskStore {
  storage: Arc<LocalStorage>,
  tasks: Vec<Task>,
}

impl TaskStore {
  /// Load tasks from storage. A stored list that fails to parse is logged
  /// and replaced by an empty one.
  pub fn load(storage: Arc<LocalStorage>) -> Result<Self> {
    let tasks: Vec<Task> = match storage.get(keys::TASKS)? {
      Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(error = %e, "stored tasks are unreadable, starting with an empty list");
        Vec::new()
      }),
      None => Vec::new(),
    };
    debug!(count = tasks.len(), "tasks loaded");

    Ok(Self { storage, tasks })
  }

  pub fn tasks(&self) -> &[Task] {
    &self.tasks
  }

  pub fn get(&self, id: Uuid) -> Option<&Task> {
    self.tasks.iter().find(|t| t.id == id)
  }

  /// Add a task at the top of the list and return its id.
  pub fn add(&mut self, title: &str, description: &str, priority: Priority) -> Result<Uuid> {
    let title = title.trim();
    if title.is_empty() {
      return Err(eyre!("Task title cannot be empty"));
    }

    let now = Utc::now();
    let task = Task {
      id: Uuid::new_v4(),
      title: title.to_string(),
      description: description.trim().to_string(),
      priority,
      completed: false,
      created_at: now,
      updated_at: now,
    };
    let id = task.id;
    let mut tasks = self.tasks.clone();
    tasks.insert(0, task);
    self.commit(tasks)?;

    debug!(%id, "task added");
    Ok(id)
  }

  pub fn update(&mut self, id: Uuid, patch: TaskPatch) -> Result<()> {
    let title = match patch.title {
      Some(title) => {
        let title = title.trim().to_string();
        if title.is_empty() {
          return Err(eyre!("Task title cannot be empty"));
        }
        Some(title)
      }
      None => None,
    };

    let mut tasks = self.tasks.clone();
    let task = find_mut(&mut tasks, id)?;
    if let Some(title) = title {
      task.title = title;
    }
    if let Some(description) = patch.description {
      task.description = description.trim().to_string();
    }
    if let Some(priority) = patch.priority {
      task.priority = priority;
    }
    task.updated_at = Utc::now();

    self.commit(tasks)
  }

  /// Flip completion. Returns the new completed flag.
  pub fn toggle(&mut self, id: Uuid) -> Result<bool> {
    let mut tasks = self.tasks.clone();
    let task = find_mut(&mut tasks, id)?;
    task.completed = !task.completed;
    task.updated_at = Utc::now();
    let completed = task.completed;

    self.commit(tasks)?;
    Ok(completed)
  }

  pub fn remove(&mut self, id: Uuid) -> Result<Task> {
    let index = self
      .tasks
      .iter()
      .position(|t| t.id == id)
      .ok_or_else(|| eyre!("Task {} not found", id))?;
    let mut tasks = self.tasks.clone();
    let task = tasks.remove(index);

    self.commit(tasks)?;
    debug!(%id, "task removed");
    Ok(task)
  }

  /// Drop every completed task. Returns how many were removed.
  pub fn clear_completed(&mut self) -> Result<usize> {
    let tasks: Vec<Task> = self.tasks.iter().filter(|t| !t.completed).cloned().collect();
    let removed = self.tasks.len() - tasks.len();

    if removed > 0 {
      self.commit(tasks)?;
    }
    Ok(removed)
  }

  pub fn filtered(&self, filter: TaskFilter) -> Vec<&Task> {
    self.tasks.iter().filter(|t| filter.matches(t)).collect()
  }

  /// Tasks passing `filter` whose title or description contains `query`,
  /// ignoring case. An empty query matches everything.
  pub fn search(&self, filter: TaskFilter, query: &str) -> Vec<&Task> {
    let query = query.trim().to_lowercase();
    self
      .tasks
      .iter()
      .filter(|t| filter.matches(t))
      .filter(|t| {
        query.is_empty()
          || t.title.to_lowercase().contains(&query)
          || t.description.to_lowercase().contains(&query)
      })
      .collect()
  }

  pub fn stats(&self) -> TaskStats {
    let completed = self.tasks.iter().filter(|t| t.completed).count();
    TaskStats {
      total: self.tasks.len(),
      completed,
      active: self.tasks.len() - completed,
    }
  }

  /// Persist `tasks`, then adopt them. A failed write leaves the
  /// in-memory list untouched.
  fn commit(&mut self, tasks: Vec<Task>) -> Result<()> {
    self.storage.set_json(keys::TASKS, &tasks)?;
    self.tasks = tasks;
    Ok(())
  }
}

fn find_mut(tasks: &mut [Task], id: Uuid) -> Result<&mut Task> {
  tasks
    .iter_mut()
    .find(|t| t.id == id)
    .ok_or_else(|| eyre!("Task {} not found", id))
}
