//! Async query abstraction for data fetching with caching support.
//!
//! Inspired by TanStack Query, this module provides a `Query<A, T, E>` type
//! that wraps an async fetcher taking arguments of type `A` and exposes its
//! progress as a [`QueryState`]. Each query instance owns a small time-boxed
//! cache and honors at most one in-flight request: starting a new one cancels
//! the previous, whose outcome is then discarded.
//!
//! # Example
//!
//! ```ignore
//! let api = client.clone();
//! let mut query = Query::new(move |page: u32| {
//!     let api = api.clone();
//!     async move { api.posts().paginated(page, 10).await }
//! })
//! .with_cache_key("posts-1-10");
//!
//! // Fire and forget from the UI; the view polls on tick
//! tokio::spawn(query.execute(1));
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//!
//! // In render
//! match query.status() {
//!     QueryStatus::Loading => render_spinner(),
//!     QueryStatus::Success => render_data(query.data()),
//!     QueryStatus::Error => render_error(query.error()),
//!     QueryStatus::Idle => {}
//! }
//! ```

mod cache;

pub use cache::QueryCache;

use futures::future::BoxFuture;
use std::collections::hash_map::DefaultHasher;
use std::fmt::Display;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Message published when a failure renders as an empty string.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Default lifetime of a cache entry.
pub const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(5 * 60);

/// Lifecycle status of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
  /// Query has not been started (or was reset)
  #[default]
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Last attempt completed successfully
  Success,
  /// Last attempt failed
  Error,
}

/// Published view of a query: status plus the last data and error.
///
/// Data survives a failed attempt so the UI can keep showing what it had.
#[derive(Debug, Clone)]
pub struct QueryState<T> {
  status: QueryStatus,
  data: Option<T>,
  error: Option<String>,
}

impl<T> Default for QueryState<T> {
  fn default() -> Self {
    Self {
      status: QueryStatus::Idle,
      data: None,
      error: None,
    }
  }
}

impl<T> QueryState<T> {
  fn success(data: T) -> Self {
    Self {
      status: QueryStatus::Success,
      data: Some(data),
      error: None,
    }
  }

  pub fn status(&self) -> QueryStatus {
    self.status
  }

  pub fn is_idle(&self) -> bool {
    self.status == QueryStatus::Idle
  }

  pub fn is_loading(&self) -> bool {
    self.status == QueryStatus::Loading
  }

  pub fn is_success(&self) -> bool {
    self.status == QueryStatus::Success
  }

  pub fn is_error(&self) -> bool {
    self.status == QueryStatus::Error
  }

  pub fn data(&self) -> Option<&T> {
    self.data.as_ref()
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }
}

/// Outcome of a manually invoked query that did not produce data.
#[derive(Debug, thiserror::Error)]
pub enum QueryError<E> {
  /// The fetcher failed; state has already been moved to `Error`.
  #[error("{0}")]
  Failed(E),
  /// A newer request superseded this one, or the query was torn down.
  #[error("query was superseded or cancelled")]
  Cancelled,
}

impl<E> QueryError<E> {
  pub fn is_cancelled(&self) -> bool {
    matches!(self, QueryError::Cancelled)
  }

  /// The raw failure, if the fetcher produced one.
  pub fn failure(&self) -> Option<&E> {
    match self {
      QueryError::Failed(e) => Some(e),
      QueryError::Cancelled => None,
    }
  }
}

type Fetcher<A, T, E> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;
type SuccessCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;
type ErrorCallback<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// State shared between a query and the futures it hands out.
struct Inner<T, E> {
  state: QueryState<T>,
  /// Bumped on every publish so pollers can detect changes
  version: u64,
  cache: QueryCache<T>,
  cache_key: Option<String>,
  /// Identifies the most recently started request
  generation: u64,
  in_flight: Option<CancellationToken>,
  on_success: Option<SuccessCallback<T>>,
  on_error: Option<ErrorCallback<E>>,
}

impl<T, E> Inner<T, E> {
  fn publish(&mut self, state: QueryState<T>) {
    self.state = state;
    self.version += 1;
  }

  fn cancel_in_flight(&mut self) {
    if let Some(token) = self.in_flight.take() {
      token.cancel();
    }
  }
}

fn lock<T, E>(shared: &Mutex<Inner<T, E>>) -> MutexGuard<'_, Inner<T, E>> {
  // Callbacks run outside the lock, so a poisoned guard still holds consistent state
  shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

enum Pending<T, E> {
  Cached(T),
  Fetch {
    generation: u64,
    token: CancellationToken,
    cache_key: Option<String>,
    future: BoxFuture<'static, Result<T, E>>,
  },
}

/// Async query for data fetching with state management.
///
/// Query<A, T, E> encapsulates:
/// - The fetching logic (via a closure taking `A`)
/// - Idle/loading/success/error states
/// - A per-instance cache keyed by an optional cache key
/// - Cancellation of superseded requests
///
/// `execute` and `refresh` return `'static` futures so callers can either
/// await them or spawn them and pick up the result with [`Query::poll`].
/// Dropping the query cancels whatever is still in flight.
pub struct Query<A, T, E> {
  shared: Arc<Mutex<Inner<T, E>>>,
  fetcher: Fetcher<A, T, E>,
  /// Snapshot taken at the last poll, borrowed by render code
  state: QueryState<T>,
  seen_version: u64,
  immediate: bool,
  mounted: bool,
  dependencies: Option<u64>,
}

impl<A, T, E> Query<A, T, E>
where
  A: Send + 'static,
  T: Clone + Send + 'static,
  E: Display + Send + 'static,
{
  /// Create a new query with the given fetcher function.
  ///
  /// The fetcher is called with the arguments passed to `execute()` or
  /// `refresh()` each time a request is actually issued.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    Self {
      shared: Arc::new(Mutex::new(Inner {
        state: QueryState::default(),
        version: 0,
        cache: QueryCache::new(DEFAULT_CACHE_DURATION),
        cache_key: None,
        generation: 0,
        in_flight: None,
        on_success: None,
        on_error: None,
      })),
      fetcher: Arc::new(move |args| Box::pin(fetcher(args))),
      state: QueryState::default(),
      seen_version: 0,
      immediate: true,
      mounted: false,
      dependencies: None,
    }
  }

  /// Enable caching of successful results under `key`.
  pub fn with_cache_key(self, key: impl Into<String>) -> Self {
    self.set_cache_key(Some(key.into()));
    self
  }

  /// Set how long a cached result stays fresh.
  pub fn with_cache_duration(self, duration: Duration) -> Self {
    lock(&self.shared).cache.set_ttl(duration);
    self
  }

  /// Whether `mount()` and dependency changes trigger a fetch.
  pub fn with_immediate(mut self, immediate: bool) -> Self {
    self.immediate = immediate;
    self
  }

  /// Register the initial dependency values without triggering a fetch.
  pub fn with_dependencies<D: Hash + ?Sized>(mut self, deps: &D) -> Self {
    self.dependencies = Some(fingerprint(deps));
    self
  }

  /// Callback invoked with fresh data after a successful fetch.
  pub fn on_success<F>(self, callback: F) -> Self
  where
    F: Fn(&T) + Send + Sync + 'static,
  {
    lock(&self.shared).on_success = Some(Arc::new(callback));
    self
  }

  /// Callback invoked with the raw failure after a failed fetch.
  pub fn on_error<F>(self, callback: F) -> Self
  where
    F: Fn(&E) + Send + Sync + 'static,
  {
    lock(&self.shared).on_error = Some(Arc::new(callback));
    self
  }

  /// Change the cache key used by subsequent requests. `None` disables caching.
  pub fn set_cache_key(&self, key: Option<String>) {
    lock(&self.shared).cache_key = key;
  }

  pub fn cache_key(&self) -> Option<String> {
    lock(&self.shared).cache_key.clone()
  }

  /// Get the state as of the last poll.
  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn status(&self) -> QueryStatus {
    self.state.status()
  }

  /// Get the last successfully fetched data.
  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  /// Get the error message if the last attempt failed.
  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }

  pub fn is_idle(&self) -> bool {
    self.state.is_idle()
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  pub fn is_success(&self) -> bool {
    self.state.is_success()
  }

  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  /// Pull the latest published state into the local snapshot.
  ///
  /// Returns `true` if the state changed since the previous poll.
  /// Call this in your event loop tick handler.
  pub fn poll(&mut self) -> bool {
    let inner = lock(&self.shared);
    if inner.version == self.seen_version {
      return false;
    }
    self.state = inner.state.clone();
    self.seen_version = inner.version;
    true
  }

  /// Run the fetcher with `args`, or serve a fresh cached result.
  ///
  /// Everything up to issuing the request happens synchronously: a cache hit
  /// is visible through `state()` as soon as this returns, and so is the
  /// transition to `Loading`. The returned future resolves with the data, the
  /// fetcher's failure (after state was updated), or
  /// [`QueryError::Cancelled`] if a newer request superseded this one.
  pub fn execute(&mut self, args: A) -> impl Future<Output = Result<T, QueryError<E>>> + Send + 'static {
    let pending = self.begin(args);
    self.poll();

    let shared = Arc::clone(&self.shared);
    async move {
      match pending {
        Pending::Cached(data) => Ok(data),
        Pending::Fetch {
          generation,
          token,
          cache_key,
          future,
        } => {
          let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(QueryError::Cancelled),
            outcome = future => outcome,
          };
          settle(&shared, generation, &token, cache_key, outcome)
        }
      }
    }
  }

  /// Drop the cached entry for the current key, then `execute`.
  pub fn refresh(&mut self, args: A) -> impl Future<Output = Result<T, QueryError<E>>> + Send + 'static {
    {
      let mut inner = lock(&self.shared);
      if let Some(key) = inner.cache_key.clone() {
        inner.cache.invalidate(&key);
      }
    }
    self.execute(args)
  }

  /// Return to `Idle`, clearing data and error.
  ///
  /// A request still in flight is left alone and will publish when it lands.
  pub fn reset(&mut self) {
    lock(&self.shared).publish(QueryState::default());
    self.poll();
  }

  fn begin(&mut self, args: A) -> Pending<T, E> {
    let mut inner = lock(&self.shared);

    // Whatever happens next supersedes the previous request
    inner.cancel_in_flight();

    let cache_key = inner.cache_key.clone();
    if let Some(key) = cache_key.as_deref() {
      if let Some(data) = inner.cache.get(key) {
        debug!(key, "query served from cache");
        inner.publish(QueryState::success(data.clone()));
        return Pending::Cached(data);
      }
    }

    inner.generation += 1;
    let generation = inner.generation;
    let token = CancellationToken::new();
    inner.in_flight = Some(token.clone());

    let data = inner.state.data.clone();
    inner.publish(QueryState {
      status: QueryStatus::Loading,
      data,
      error: None,
    });
    drop(inner);

    debug!(generation, key = ?cache_key, "query started");
    Pending::Fetch {
      generation,
      token,
      cache_key,
      future: (self.fetcher)(args),
    }
  }
}

impl<A, T, E> Query<A, T, E>
where
  A: Default + Send + 'static,
  T: Clone + Send + 'static,
  E: Display + Send + 'static,
{
  /// Attach the query to its owner, running it once if `immediate`.
  pub fn mount(&mut self) {
    self.mounted = true;
    if self.immediate {
      self.spawn_automatic();
    }
  }

  /// Record new dependency values, re-running the query if they changed.
  ///
  /// Returns `true` when a fetch was triggered.
  pub fn set_dependencies<D: Hash + ?Sized>(&mut self, deps: &D) -> bool {
    let fingerprint = fingerprint(deps);
    if self.dependencies == Some(fingerprint) {
      return false;
    }
    self.dependencies = Some(fingerprint);

    if self.mounted && self.immediate {
      self.spawn_automatic();
      return true;
    }
    false
  }

  /// Automatic runs only surface failures through state and `on_error`.
  fn spawn_automatic(&mut self) {
    let future = self.execute(A::default());
    tokio::spawn(async move {
      if let Err(QueryError::Failed(e)) = future.await {
        debug!(error = %e, "automatic query run failed");
      }
    });
  }
}

impl<A, T, E> Drop for Query<A, T, E> {
  fn drop(&mut self) {
    let mut inner = lock(&self.shared);
    inner.cancel_in_flight();
    inner.cache.clear();
  }
}

fn fingerprint<D: Hash + ?Sized>(deps: &D) -> u64 {
  let mut hasher = DefaultHasher::new();
  deps.hash(&mut hasher);
  hasher.finish()
}

fn error_message<E: Display>(error: &E) -> String {
  let message = error.to_string();
  if message.trim().is_empty() {
    GENERIC_ERROR_MESSAGE.to_string()
  } else {
    message
  }
}

/// Publish a finished request unless it was superseded in the meantime.
fn settle<T: Clone, E: Display>(
  shared: &Mutex<Inner<T, E>>,
  generation: u64,
  token: &CancellationToken,
  cache_key: Option<String>,
  outcome: Result<T, E>,
) -> Result<T, QueryError<E>> {
  let mut inner = lock(shared);
  if token.is_cancelled() || inner.generation != generation {
    debug!(generation, "discarding superseded query result");
    return Err(QueryError::Cancelled);
  }
  inner.in_flight = None;

  match outcome {
    Ok(data) => {
      if let Some(key) = cache_key {
        inner.cache.insert(key, data.clone());
      }
      inner.publish(QueryState::success(data.clone()));
      let callback = inner.on_success.clone();
      drop(inner);

      if let Some(callback) = callback {
        callback(&data);
      }
      Ok(data)
    }
    Err(e) => {
      let message = error_message(&e);
      warn!(generation, error = %message, "query failed");

      let data = inner.state.data.clone();
      inner.publish(QueryState {
        status: QueryStatus::Error,
        data,
        error: Some(message),
      });
      let callback = inner.on_error.clone();
      drop(inner);

      if let Some(callback) = callback {
        callback(&e);
      }
      Err(QueryError::Failed(e))
    }
  }
}

// Query is not Clone: it owns the cancellation handle for its requests.
// Share it behind the view that owns it rather than duplicating it.

impl<A, T: std::fmt::Debug, E> std::fmt::Debug for Query<A, T, E> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("immediate", &self.immediate)
      .field("mounted", &self.mounted)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};

  #[derive(Debug, Clone, PartialEq)]
  struct User {
    id: u32,
    name: String,
  }

  fn ann() -> Vec<User> {
    vec![User {
      id: 1,
      name: "Ann".to_string(),
    }]
  }

  fn counting_query(calls: Arc<AtomicU32>) -> Query<(), Vec<User>, String> {
    Query::new(move |()| {
      let calls = calls.clone();
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(ann())
      }
    })
  }

  /// Fetcher whose argument decides how long to sleep and what to return.
  fn delayed_query() -> Query<(u64, Result<u32, String>), u32, String> {
    Query::new(|(delay_ms, outcome): (u64, Result<u32, String>)| async move {
      tokio::time::sleep(Duration::from_millis(delay_ms)).await;
      outcome
    })
  }

  #[tokio::test]
  async fn test_query_success() {
    let mut query = Query::new(|()| async { Ok::<_, String>(vec![1, 2, 3]) });
    assert!(query.is_idle());

    let result = query.execute(()).await;
    assert_eq!(result.unwrap(), vec![1, 2, 3]);

    assert!(query.poll());
    assert!(query.is_success());
    assert_eq!(query.data(), Some(&vec![1, 2, 3]));
    assert_eq!(query.error(), None);
  }

  #[tokio::test]
  async fn test_execute_transitions_to_loading_synchronously() {
    let mut query = delayed_query();
    let pending = query.execute((50, Ok(1)));
    assert!(query.is_loading());

    pending.await.unwrap();
    query.poll();
    assert!(query.is_success());
  }

  #[tokio::test]
  async fn test_query_error_keeps_previous_data() {
    let mut query = delayed_query();
    query.execute((0, Ok(7))).await.unwrap();

    let result = query.execute((0, Err("Something went wrong".to_string()))).await;
    match result {
      Err(QueryError::Failed(e)) => assert_eq!(e, "Something went wrong"),
      other => panic!("expected failure, got {:?}", other),
    }

    query.poll();
    assert!(query.is_error());
    assert_eq!(query.error(), Some("Something went wrong"));
    assert_eq!(query.data(), Some(&7));
  }

  #[tokio::test]
  async fn test_empty_error_message_falls_back_to_generic() {
    let mut query: Query<(), i32, String> = Query::new(|()| async { Err(String::new()) });

    assert!(query.execute(()).await.is_err());
    query.poll();
    assert_eq!(query.error(), Some(GENERIC_ERROR_MESSAGE));
  }

  #[tokio::test(start_paused = true)]
  async fn test_second_execute_supersedes_slower_first() {
    let mut query = delayed_query();

    let first = query.execute((100, Ok(1)));
    let second = query.execute((10, Ok(2)));
    let (first, second) = tokio::join!(first, second);

    assert!(first.unwrap_err().is_cancelled());
    assert_eq!(second.unwrap(), 2);
    query.poll();
    assert_eq!(query.data(), Some(&2));
  }

  #[tokio::test(start_paused = true)]
  async fn test_second_execute_supersedes_faster_first() {
    let mut query = delayed_query();

    let first = tokio::spawn(query.execute((10, Ok(1))));
    let second = query.execute((100, Ok(2)));

    // The first response lands while the second is still pending
    tokio::time::sleep(Duration::from_millis(50)).await;
    query.poll();
    assert!(query.is_loading());
    assert_eq!(query.data(), None);

    assert!(first.await.unwrap().unwrap_err().is_cancelled());
    assert_eq!(second.await.unwrap(), 2);
    query.poll();
    assert_eq!(query.data(), Some(&2));
  }

  #[tokio::test(start_paused = true)]
  async fn test_superseded_failure_is_not_published() {
    let fired = Arc::new(AtomicU32::new(0));
    let fired_clone = fired.clone();
    let mut query = delayed_query().on_error(move |_| {
      fired_clone.fetch_add(1, Ordering::SeqCst);
    });

    let first = query.execute((10, Err("stale".to_string())));
    let second = query.execute((50, Ok(3)));
    let (first, second) = tokio::join!(first, second);

    assert!(first.unwrap_err().is_cancelled());
    assert_eq!(second.unwrap(), 3);
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    query.poll();
    assert_eq!(query.error(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn test_cache_scenario() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(calls.clone())
      .with_cache_key("users-all")
      .with_cache_duration(Duration::from_millis(5000));

    assert_eq!(query.execute(()).await.unwrap(), ann());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_millis(3000)).await;
    assert_eq!(query.execute(()).await.unwrap(), ann());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_millis(3000)).await;
    assert_eq!(query.execute(()).await.unwrap(), ann());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_cache_expires_one_ms_past_duration() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(calls.clone())
      .with_cache_key("users-all")
      .with_cache_duration(Duration::from_millis(1000));

    query.execute(()).await.unwrap();
    tokio::time::advance(Duration::from_millis(1001)).await;
    query.execute(()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_cache_hit_is_visible_without_awaiting() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(calls.clone()).with_cache_key("users-all");

    query.execute(()).await.unwrap();
    query.reset();
    assert!(query.is_idle());

    let _ = query.execute(());
    assert!(query.is_success());
    assert_eq!(query.data(), Some(&ann()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_without_cache_key_every_execute_fetches() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(calls.clone());

    query.execute(()).await.unwrap();
    query.execute(()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_refresh_bypasses_cache() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(calls.clone()).with_cache_key("users-all");

    query.execute(()).await.unwrap();
    query.refresh(()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // The refreshed result repopulates the cache
    query.execute(()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_cache_key_change_misses() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(calls.clone()).with_cache_key("posts-1-10");

    query.execute(()).await.unwrap();
    query.set_cache_key(Some("posts-2-10".to_string()));
    query.execute(()).await.unwrap();
    query.set_cache_key(Some("posts-1-10".to_string()));
    query.execute(()).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_reset_returns_to_idle() {
    let mut query = Query::new(|()| async { Ok::<_, String>(5) });
    query.execute(()).await.unwrap();
    query.poll();

    query.reset();
    assert!(query.is_idle());
    assert_eq!(query.data(), None);
    assert_eq!(query.error(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn test_reset_does_not_cancel_in_flight() {
    let mut query = delayed_query();
    let pending = query.execute((20, Ok(9)));

    query.reset();
    assert!(query.is_idle());

    assert_eq!(pending.await.unwrap(), 9);
    query.poll();
    assert_eq!(query.data(), Some(&9));
  }

  #[tokio::test]
  async fn test_callbacks_receive_data_and_failure() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_ok = seen.clone();
    let seen_err = seen.clone();

    let mut query = delayed_query()
      .on_success(move |data| seen_ok.lock().unwrap().push(format!("ok:{}", data)))
      .on_error(move |e| seen_err.lock().unwrap().push(format!("err:{}", e)));

    query.execute((0, Ok(1))).await.unwrap();
    let _ = query.execute((0, Err("bad gateway".to_string()))).await;

    assert_eq!(*seen.lock().unwrap(), vec!["ok:1", "err:bad gateway"]);
  }

  #[tokio::test(start_paused = true)]
  async fn test_mount_runs_immediately() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(calls.clone());

    query.mount();
    assert!(query.is_loading());

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(query.poll());
    assert_eq!(query.data(), Some(&ann()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_mount_without_immediate_does_nothing() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(calls.clone()).with_immediate(false);

    query.mount();
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(!query.poll());
    assert!(query.is_idle());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_dependency_change_reruns() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(calls.clone()).with_dependencies(&("posts", 1));

    query.mount();
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert!(!query.set_dependencies(&("posts", 1)));
    assert!(query.set_dependencies(&("posts", 2)));
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_automatic_failure_is_published_not_raised() {
    let mut query: Query<(), u8, String> = Query::new(|()| async { Err("offline".to_string()) });

    query.mount();
    tokio::time::sleep(Duration::from_millis(1)).await;

    query.poll();
    assert!(query.is_error());
    assert_eq!(query.error(), Some("offline"));
  }

  #[tokio::test(start_paused = true)]
  async fn test_drop_cancels_in_flight() {
    let fired = Arc::new(AtomicU32::new(0));
    let fired_clone = fired.clone();
    let mut query = delayed_query().on_success(move |_| {
      fired_clone.fetch_add(1, Ordering::SeqCst);
    });

    let pending = query.execute((20, Ok(1)));
    drop(query);

    assert!(pending.await.unwrap_err().is_cancelled());
    assert_eq!(fired.load(Ordering::SeqCst), 0);
  }
}
