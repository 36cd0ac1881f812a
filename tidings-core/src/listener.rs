//! # Listener
//!
//! A listener is a resolved execution unit: a [`ListenerKey`], a shared
//! [`Executable`] instance and the per-subscription `data` / `enabled` pair
//! taken from its descriptor.
//!
//! Many listeners may share one instance. The instance is a singleton per key
//! inside a listener cache, while `data` and `enabled` stay local to each
//! descriptor.

use crate::{
    error::{BoxError, ListenerError},
    event::Event,
};
use serde_json::Value;
use std::{
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};

/// The execution capability every listener instance exposes.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not `Executable`",
    label = "missing `Executable` implementation",
    note = "Listener instances must implement `execute(event_id, event, data)`."
)]
pub trait Executable: Send + Sync + 'static {
    /// Run the listener for `event_id` (`namespace.name`).
    ///
    /// `data` is the configuration attached to the subscription that is
    /// firing, not to the instance.
    fn execute(&self, event_id: &str, event: &mut Event, data: &Value) -> Result<Value, BoxError>;

    /// Whether this instance can execute `event_id`.
    ///
    /// Checked when the listener is loaded for an event; listeners that
    /// answer `false` are skipped with a notice instead of failing later.
    fn handles(&self, event_id: &str) -> bool {
        let _ = event_id;
        true
    }
}

impl<F> Executable for F
where
    F: Fn(&str, &mut Event, &Value) -> Result<Value, BoxError> + Send + Sync + 'static,
{
    fn execute(&self, event_id: &str, event: &mut Event, data: &Value) -> Result<Value, BoxError> {
        self(event_id, event, data)
    }
}

/// Uniqueness key of a listener: `extension:library`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerKey {
    extension: String,
    library: String,
}

impl ListenerKey {
    /// Create a key.
    pub fn new(extension: impl Into<String>, library: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            library: library.into(),
        }
    }

    /// The owning extension.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// The library inside the extension.
    pub fn library(&self) -> &str {
        &self.library
    }
}

impl fmt::Display for ListenerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.extension, self.library)
    }
}

/// A resolved listener ready to run.
#[derive(Clone)]
pub struct Listener {
    key: ListenerKey,
    instance: Arc<dyn Executable>,
    data: Value,
    enabled: bool,
}

impl Listener {
    /// Bind an instance to one subscription's data and enabled flag.
    pub fn new(
        key: ListenerKey,
        instance: Arc<dyn Executable>,
        data: Value,
        enabled: bool,
    ) -> Self {
        Self {
            key,
            instance,
            data,
            enabled,
        }
    }

    /// The listener key.
    pub fn key(&self) -> &ListenerKey {
        &self.key
    }

    /// The shared instance.
    pub fn instance(&self) -> &Arc<dyn Executable> {
        &self.instance
    }

    /// Subscription data passed to every execution.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Whether this subscription runs.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether both listeners are backed by the very same instance.
    pub fn shares_instance_with(&self, other: &Listener) -> bool {
        same_instance(&self.instance, &other.instance)
    }

    /// Run the listener against `event`.
    ///
    /// A disabled listener returns `Null` without touching its instance.
    /// Errors and panics raised by the instance come back as
    /// [`ListenerError`]; they never unwind past this call.
    pub fn execute(&self, event: &mut Event) -> Result<Value, ListenerError> {
        if !self.enabled {
            return Ok(Value::Null);
        }
        let event_id = event.id();
        let listener = self.key.to_string();
        isolate(&listener, &event_id, || {
            self.instance.execute(&event_id, event, &self.data)
        })
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("key", &self.key)
            .field("data", &self.data)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// Pointer identity of two instances, ignoring vtables.
pub fn same_instance(a: &Arc<dyn Executable>, b: &Arc<dyn Executable>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Run `f` inside a failure boundary for `listener` on `event`.
///
/// Returned errors become [`ListenerError::Failed`], panics become
/// [`ListenerError::Panicked`].
pub fn isolate<F>(listener: &str, event: &str, f: F) -> Result<Value, ListenerError>
where
    F: FnOnce() -> Result<Value, BoxError>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(ListenerError::Failed {
            listener: listener.to_owned(),
            event: event.to_owned(),
            source,
        }),
        Err(payload) => {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_owned()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "non-string panic payload".to_owned()
            };
            Err(ListenerError::Panicked {
                listener: listener.to_owned(),
                event: event.to_owned(),
                message,
            })
        }
    }
}
