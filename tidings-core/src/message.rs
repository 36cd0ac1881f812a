//! Message and Subject traits for event types.

use crate::error::ListenerError;
use serde_json::Value;

/// A marker trait for values that can be dispatched.
///
/// Messages must be `Send + Sync + 'static` so dispatchers and emitters can be
/// shared between threads.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid Message",
    label = "must be `Send + Sync + 'static`",
    note = "All events in Tidings must be thread-safe and static."
)]
pub trait Message: Send + Sync + 'static {}

impl Message for () {}
impl Message for String {}
impl<T: Message> Message for Box<T> {}
impl<T: Message> Message for std::sync::Arc<T> {}

/// A message that carries dispatch state.
///
/// The emitter in `tidings-std` drives any `Subject`. It stops once
/// [`is_stopped`] turns true and records each callback's return value or
/// failure.
///
/// [`is_stopped`]: Subject::is_stopped
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be emitted",
    label = "missing `Subject` implementation",
    note = "Implement `Subject` to track stop state, results and failures."
)]
pub trait Subject: Message {
    /// Identifier used in collected errors, e.g. `app.start`.
    fn label(&self) -> String;

    /// Whether further callbacks must be skipped.
    fn is_stopped(&self) -> bool;

    /// Record the value returned by the callback identified by `key`.
    fn record(&mut self, key: &str, value: Value);

    /// Append a callback failure.
    fn collect(&mut self, error: ListenerError);
}
