//! Testing utilities for tidings.
//!
//! This module provides listeners and a logger that make dispatch tests easy
//! to write and read.
//!
//! # Features
//!
//! - [`Journal`]: a shared, ordered log of which listener ran
//! - [`RecordingListener`]: records every call and returns a fixed value
//! - [`FailingListener`]: always fails
//! - [`StoppingListener`]: stops propagation, optionally failing afterwards
//! - [`PanickingListener`]: panics inside the failure boundary
//! - [`RecordingLogger`]: keeps every registry notice

use serde_json::Value;
use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};
use tidings_core::{BoxError, Event, Executable, Logger};

// ============================================================================
// Journal
// ============================================================================

/// A shared log of listener labels, in execution order.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&self, entry: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.into());
    }

    /// Every entry so far.
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forget every entry.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

// ============================================================================
// Recording Listener
// ============================================================================

/// A listener that records each call and returns a fixed value.
///
/// # Example
///
/// ```rust,ignore
/// let journal = Journal::new();
/// let extension = Extension::new("x")
///     .library("a", { let j = journal.clone(); move || RecordingListener::new("a", &j) });
///
/// dispatcher.trigger("app", "start", Map::new())?;
/// assert_eq!(journal.entries(), vec!["a"]);
/// ```
#[derive(Debug, Clone)]
pub struct RecordingListener {
    label: String,
    journal: Journal,
    value: Value,
    seen: Arc<Mutex<Vec<(String, Value)>>>,
    calls: Arc<AtomicUsize>,
}

impl RecordingListener {
    /// Create a listener that writes `label` to `journal` and returns it.
    pub fn new(label: impl Into<String>, journal: &Journal) -> Self {
        let label = label.into();
        Self {
            value: Value::String(label.clone()),
            label,
            journal: journal.clone(),
            seen: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A listener with its own private journal.
    pub fn detached() -> Self {
        Self::new("detached", &Journal::new())
    }

    /// Return `value` instead of the label.
    pub fn returning(mut self, value: Value) -> Self {
        self.value = value;
        self
    }

    /// Number of times the listener ran.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(event id, subscription data)` for every call.
    pub fn seen(&self) -> Vec<(String, Value)> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Executable for RecordingListener {
    fn execute(&self, event_id: &str, _event: &mut Event, data: &Value) -> Result<Value, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((event_id.to_owned(), data.clone()));
        self.journal.push(self.label.clone());
        Ok(self.value.clone())
    }
}

// ============================================================================
// Failing Listener
// ============================================================================

/// A listener that journals its label and then fails with `message`.
#[derive(Debug, Clone)]
pub struct FailingListener {
    label: String,
    journal: Journal,
    message: String,
}

impl FailingListener {
    /// Create a failing listener.
    pub fn new(label: impl Into<String>, journal: &Journal, message: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            journal: journal.clone(),
            message: message.into(),
        }
    }
}

impl Executable for FailingListener {
    fn execute(
        &self,
        _event_id: &str,
        _event: &mut Event,
        _data: &Value,
    ) -> Result<Value, BoxError> {
        self.journal.push(self.label.clone());
        Err(self.message.clone().into())
    }
}

// ============================================================================
// Stopping Listener
// ============================================================================

/// A listener that stops propagation.
///
/// With [`then_fail`](Self::then_fail) it fails after setting the flag, which
/// must still stop the listeners behind it.
#[derive(Debug, Clone)]
pub struct StoppingListener {
    label: String,
    journal: Journal,
    failure: Option<String>,
}

impl StoppingListener {
    /// Create a listener that stops the event and returns its label.
    pub fn new(label: impl Into<String>, journal: &Journal) -> Self {
        Self {
            label: label.into(),
            journal: journal.clone(),
            failure: None,
        }
    }

    /// Fail with `message` after stopping the event.
    pub fn then_fail(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }
}

impl Executable for StoppingListener {
    fn execute(
        &self,
        _event_id: &str,
        event: &mut Event,
        _data: &Value,
    ) -> Result<Value, BoxError> {
        self.journal.push(self.label.clone());
        event.set_stopped(true);
        match &self.failure {
            Some(message) => Err(message.clone().into()),
            None => Ok(Value::String(self.label.clone())),
        }
    }
}

// ============================================================================
// Panicking Listener
// ============================================================================

/// A listener that panics with `message`.
#[derive(Debug, Clone)]
pub struct PanickingListener {
    label: String,
    journal: Journal,
    message: String,
}

impl PanickingListener {
    /// Create a panicking listener.
    pub fn new(label: impl Into<String>, journal: &Journal, message: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            journal: journal.clone(),
            message: message.into(),
        }
    }
}

impl Executable for PanickingListener {
    fn execute(
        &self,
        _event_id: &str,
        _event: &mut Event,
        _data: &Value,
    ) -> Result<Value, BoxError> {
        self.journal.push(self.label.clone());
        panic!("{}", self.message);
    }
}

// ============================================================================
// Recording Logger
// ============================================================================

/// One notice captured by [`RecordingLogger`].
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    /// The notice text.
    pub message: String,
    /// Structured context.
    pub context: Value,
    /// The component that emitted it.
    pub source: String,
}

/// A logger that keeps every notice for later inspection.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingLogger {
    /// Create an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices received so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Logger for RecordingLogger {
    fn notice(&self, message: &str, context: &Value, source: &str) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Notice {
                message: message.to_owned(),
                context: context.clone(),
                source: source.to_owned(),
            });
    }
}
