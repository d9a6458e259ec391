/// Generic result type for component key handling.
///
/// Components report back to their view through this instead of each
/// defining its own result enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Key was consumed, no event for parent to handle
  Handled,
  /// Key was consumed, here's an event for parent to process
  Event(T),
  /// Key was not consumed, parent should try next handler
  NotHandled,
}
