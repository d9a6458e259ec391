use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  Low,
  #[default]
  Medium,
  High,
}

impl Priority {
  pub fn label(&self) -> &'static str {
    match self {
      Priority::Low => "low",
      Priority::Medium => "medium",
      Priority::High => "high",
    }
  }

  /// Cycle low -> medium -> high -> low
  pub fn next(self) -> Self {
    match self {
      Priority::Low => Priority::Medium,
      Priority::Medium => Priority::High,
      Priority::High => Priority::Low,
    }
  }
}

/// A single to-do item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
  pub id: Uuid,
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub priority: Priority,
  #[serde(default)]
  pub completed: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Fields to change on an existing task
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
  pub title: Option<String>,
  pub description: Option<String>,
  pub priority: Option<Priority>,
}

/// Which tasks a list shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
  #[default]
  All,
  Active,
  Completed,
}

impl TaskFilter {
  pub const ALL: [TaskFilter; 3] = [TaskFilter::All, TaskFilter::Active, TaskFilter::Completed];

  pub fn label(&self) -> &'static str {
    match self {
      TaskFilter::All => "All",
      TaskFilter::Active => "Active",
      TaskFilter::Completed => "Completed",
    }
  }

  pub fn matches(&self, task: &Task) -> bool {
    match self {
      TaskFilter::All => true,
      TaskFilter::Active => !task.completed,
      TaskFilter::Completed => task.completed,
    }
  }

  pub fn next(self) -> Self {
    match self {
      TaskFilter::All => TaskFilter::Active,
      TaskFilter::Active => TaskFilter::Completed,
      TaskFilter::Completed => TaskFilter::All,
    }
  }

  pub fn index(&self) -> usize {
    match self {
      TaskFilter::All => 0,
      TaskFilter::Active => 1,
      TaskFilter::Completed => 2,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStats {
  pub total: usize,
  pub completed: usize,
  pub active: usize,
}

impl TaskStats {
  /// Share of completed tasks, rounded down. Zero when there are no tasks.
  pub fn completion_percent(&self) -> u8 {
    if self.total == 0 {
      return 0;
    }
    (self.completed * 100 / self.total) as u8
  }
}
