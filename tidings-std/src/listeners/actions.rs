//! Listener that routes each event id to its own action.

use serde_json::Value;
use std::{collections::HashMap, fmt};
use tidings_core::{BoxError, Event, Executable, UsageError};

type Action = Box<dyn Fn(&mut Event, &Value) -> Result<Value, BoxError> + Send + Sync>;

/// A listener backed by a table of actions keyed by event id.
///
/// One library can serve several events: the table decides which action runs
/// for the firing event, and [`Executable::handles`] reports only the events
/// it has an action for, so the registry skips bindings to anything else.
///
/// # Example
/// ```ignore
/// let table = ActionTable::new()
///     .on("app.start", |event, _data| Ok(json!(event.id())))?
///     .on("app.stop", |_event, data| Ok(data.clone()))?;
/// ```
#[derive(Default)]
pub struct ActionTable {
    actions: HashMap<String, Action>,
}

impl ActionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action` for `event_id`.
    ///
    /// Registering the same event id twice is a usage error.
    pub fn on<F>(mut self, event_id: impl Into<String>, action: F) -> Result<Self, UsageError>
    where
        F: Fn(&mut Event, &Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        let event_id = event_id.into();
        if self.actions.contains_key(&event_id) {
            return Err(UsageError::DuplicateAction(event_id));
        }
        self.actions.insert(event_id, Box::new(action));
        Ok(self)
    }

    /// Event ids with a registered action, sorted.
    pub fn actions(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Get the number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Executable for ActionTable {
    fn execute(&self, event_id: &str, event: &mut Event, data: &Value) -> Result<Value, BoxError> {
        match self.actions.get(event_id) {
            Some(action) => action(event, data),
            None => Err(format!("no action registered for `{event_id}`").into()),
        }
    }

    fn handles(&self, event_id: &str) -> bool {
        self.actions.contains_key(event_id)
    }
}

impl fmt::Debug for ActionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionTable")
            .field("actions", &self.actions())
            .finish()
    }
}
