//! To-do items persisted in local storage.

mod store;
mod types;

pub use store::TaskStore;
pub use types::{Priority, Task, TaskFilter, TaskPatch, TaskStats};
