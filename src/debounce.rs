//! Debounced values for inputs that change faster than they should be acted on.
//!
//! A [`Debounced<T>`] holds a derived value that only follows its input once
//! the input has stopped changing for `delay`. Every `set()` reschedules the
//! pending update, so a burst of keystrokes publishes only its last value.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::trace;

/// Default delay for search inputs.
pub const SEARCH_DELAY: Duration = Duration::from_millis(300);

pub struct Debounced<T> {
  delay: Duration,
  tx: Arc<watch::Sender<T>>,
  rx: watch::Receiver<T>,
  pending: Option<JoinHandle<()>>,
}

impl<T: Clone + Send + Sync + 'static> Debounced<T> {
  /// Start with `initial` as the settled value.
  pub fn new(initial: T, delay: Duration) -> Self {
    let (tx, rx) = watch::channel(initial);
    Self {
      delay,
      tx: Arc::new(tx),
      rx,
      pending: None,
    }
  }

  pub fn delay(&self) -> Duration {
    self.delay
  }

  /// Change the delay used for subsequent updates.
  pub fn set_delay(&mut self, delay: Duration) {
    self.delay = delay;
  }

  /// Feed a new input value, restarting the timer.
  pub fn set(&mut self, value: T) {
    self.cancel_pending();

    let tx = Arc::clone(&self.tx);
    let delay = self.delay;
    self.pending = Some(tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      trace!(?delay, "debounced value settled");
      tx.send_replace(value);
    }));
  }

  /// Publish `value` right away, dropping anything pending.
  pub fn set_now(&mut self, value: T) {
    self.cancel_pending();
    self.tx.send_replace(value);
  }

  /// The most recent settled value.
  pub fn value(&self) -> T {
    self.rx.borrow().clone()
  }

  /// Whether an update is scheduled but not yet published.
  pub fn is_pending(&self) -> bool {
    self
      .pending
      .as_ref()
      .is_some_and(|handle| !handle.is_finished())
  }

  /// Returns `true` if a new value settled since the previous poll.
  /// Call this in your event loop tick handler.
  pub fn poll(&mut self) -> bool {
    match self.rx.has_changed() {
      Ok(true) => {
        drop(self.rx.borrow_and_update());
        true
      }
      _ => false,
    }
  }

  /// Wait for the next settled value.
  pub async fn changed(&mut self) -> T {
    // The sender lives in self, so the channel cannot close under us
    let _ = self.rx.changed().await;
    self.rx.borrow_and_update().clone()
  }

  /// Independent receiver that observes every settled value.
  pub fn subscribe(&self) -> watch::Receiver<T> {
    self.tx.subscribe()
  }

  fn cancel_pending(&mut self) {
    if let Some(handle) = self.pending.take() {
      handle.abort();
    }
  }
}

impl<T> Drop for Debounced<T> {
  fn drop(&mut self) {
    if let Some(handle) = self.pending.take() {
      handle.abort();
    }
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Debounced<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Debounced")
      .field("value", &*self.rx.borrow())
      .field("delay", &self.delay)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::time::{sleep, Instant};

  const DELAY: Duration = Duration::from_millis(300);

  #[tokio::test(start_paused = true)]
  async fn test_burst_publishes_only_last_value() {
    let mut search = Debounced::new(String::new(), DELAY);
    let mut observer = search.subscribe();

    search.set("r".to_string());
    sleep(Duration::from_millis(100)).await;
    search.set("ru".to_string());
    sleep(Duration::from_millis(100)).await;
    search.set("rus".to_string());

    sleep(Duration::from_millis(299)).await;
    assert_eq!(search.value(), "");
    assert!(search.is_pending());
    assert!(!search.poll());

    sleep(Duration::from_millis(2)).await;
    assert_eq!(search.value(), "rus");
    assert!(search.poll());
    assert!(!search.poll());

    // Only one value ever reached subscribers
    assert!(observer.has_changed().unwrap());
    assert_eq!(*observer.borrow_and_update(), "rus");
    assert!(!observer.has_changed().unwrap());
  }

  #[tokio::test(start_paused = true)]
  async fn test_value_settles_no_earlier_than_delay() {
    let mut debounced = Debounced::new(0u32, DELAY);
    let start = Instant::now();

    debounced.set(5);
    let value = debounced.changed().await;

    assert_eq!(value, 5);
    assert!(start.elapsed() >= DELAY);
    assert!(!debounced.is_pending());
  }

  #[tokio::test(start_paused = true)]
  async fn test_set_now_publishes_immediately() {
    let mut debounced = Debounced::new("old", DELAY);
    debounced.set("typed");
    debounced.set_now("");

    assert_eq!(debounced.value(), "");
    sleep(DELAY * 2).await;
    assert_eq!(debounced.value(), "");
  }

  #[tokio::test(start_paused = true)]
  async fn test_drop_cancels_pending_update() {
    let mut debounced = Debounced::new(1u8, DELAY);
    let observer = debounced.subscribe();

    debounced.set(2);
    drop(debounced);
    sleep(DELAY * 2).await;

    assert_eq!(*observer.borrow(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_set_delay_applies_to_next_update() {
    let mut debounced = Debounced::new(0u8, DELAY);
    debounced.set_delay(Duration::from_millis(50));

    debounced.set(1);
    sleep(Duration::from_millis(60)).await;
    assert_eq!(debounced.value(), 1);
  }
}
