use crate::storage::{keys, LocalStorage};
use std::sync::Arc;
use tracing::warn;

const MAX_ENTRIES: usize = 10;

/// Recent search queries, newest first, persisted across runs.
pub struct SearchHistory {
  storage: Arc<LocalStorage>,
  entries: Vec<String>,
}

impl SearchHistory {
  pub fn load(storage: Arc<LocalStorage>) -> Self {
    let entries = storage
      .get_json::<Vec<String>>(keys::SEARCH_HISTORY)
      .unwrap_or_else(|e| {
        warn!(error = %e, "stored search history is unreadable");
        None
      })
      .unwrap_or_default();
    Self { storage, entries }
  }

  pub fn entries(&self) -> &[String] {
    &self.entries
  }

  /// Move `query` to the front, dropping case-insensitive duplicates and
  /// the oldest entries past the limit. Blank queries are ignored.
  pub fn record(&mut self, query: &str) {
    let query = query.trim();
    if query.is_empty() {
      return;
    }

    let lowered = query.to_lowercase();
    self.entries.retain(|e| e.to_lowercase() != lowered);
    self.entries.insert(0, query.to_string());
    self.entries.truncate(MAX_ENTRIES);

    if let Err(e) = self.storage.set_json(keys::SEARCH_HISTORY, &self.entries) {
      warn!(error = %e, "failed to save search history");
    }
  }

  pub fn clear(&mut self) {
    self.entries.clear();
    if let Err(e) = self.storage.remove(keys::SEARCH_HISTORY) {
      warn!(error = %e, "failed to clear search history");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn storage() -> Arc<LocalStorage> {
    Arc::new(LocalStorage::open_in_memory().unwrap())
  }

  #[test]
  fn test_newest_first_without_duplicates() {
    let mut history = SearchHistory::load(storage());
    history.record("ann");
    history.record("bob");
    history.record("  ANN ");
    history.record("   ");

    assert_eq!(history.entries(), &["ANN", "bob"]);
  }

  #[test]
  fn test_keeps_ten_most_recent() {
    let mut history = SearchHistory::load(storage());
    for i in 0..15 {
      history.record(&format!("q{}", i));
    }
    assert_eq!(history.entries().len(), 10);
    assert_eq!(history.entries()[0], "q14");
    assert_eq!(history.entries()[9], "q5");
  }

  #[test]
  fn test_persists_and_clears() {
    let storage = storage();
    let mut history = SearchHistory::load(storage.clone());
    history.record("delectus");

    let reloaded = SearchHistory::load(storage.clone());
    assert_eq!(reloaded.entries(), &["delectus"]);

    history.clear();
    assert!(SearchHistory::load(storage).entries().is_empty());
  }
}
