//! Programmatic, priority-ordered subscriptions.
//!
//! An [`Emitter`] holds the callbacks attached to one event type. Unlike the
//! registry it is not backed by a store: callbacks are attached and detached
//! in code and live as long as the emitter.

use crate::priority::{DEFAULT_PRIORITY, PriorityList};
use serde_json::Value;
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::{Arc, PoisonError, RwLock},
};
use tidings_core::{BoxError, Subject, UsageError, isolate};

type CallbackFn<E> = dyn Fn(&mut E, &Emitter<E>) -> Result<Value, BoxError> + Send + Sync;

/// A named callback. Identity is the allocation, not the key or the code.
pub struct Callback<E> {
    key: Arc<str>,
    func: Arc<CallbackFn<E>>,
}

impl<E: Subject> Callback<E> {
    /// Wrap `func` under `key`, the name its result is recorded under.
    ///
    /// An empty key is a usage error.
    pub fn new<F>(key: impl Into<String>, func: F) -> Result<Self, UsageError>
    where
        F: Fn(&mut E, &Emitter<E>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        let key: String = key.into();
        if key.trim().is_empty() {
            return Err(UsageError::EmptyCallbackKey);
        }
        Ok(Self {
            key: key.into(),
            func: Arc::new(func),
        })
    }
}

impl<E> Callback<E> {
    /// The key results and failures are recorded under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether `other` is a clone of this very callback.
    pub fn is_same(&self, other: &Callback<E>) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.func) as *const (),
            Arc::as_ptr(&other.func) as *const (),
        )
    }
}

impl<E> Clone for Callback<E> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            func: self.func.clone(),
        }
    }
}

impl<E> fmt::Debug for Callback<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback").field(&self.key).finish()
    }
}

/// One attached callback and its priority.
#[derive(Debug)]
pub struct CallbackEntry<E> {
    /// The callback.
    pub callback: Callback<E>,
    /// Its priority; lower runs earlier.
    pub priority: f64,
}

impl<E> Clone for CallbackEntry<E> {
    fn clone(&self) -> Self {
        Self {
            callback: self.callback.clone(),
            priority: self.priority,
        }
    }
}

/// Priority-sorted callbacks for one event type.
pub struct Emitter<E> {
    callbacks: RwLock<PriorityList<Callback<E>>>,
}

impl<E: Subject> Emitter<E> {
    /// Create an emitter with no callbacks.
    pub fn new() -> Self {
        Self {
            callbacks: RwLock::new(PriorityList::new()),
        }
    }

    /// Attach `callback` at [`DEFAULT_PRIORITY`].
    pub fn attach(&self, callback: &Callback<E>) {
        self.attach_with_priority(callback, DEFAULT_PRIORITY);
    }

    /// Attach `callback` at `priority`.
    ///
    /// Attaching a callback that is already attached replaces its entry: it
    /// moves to the new priority, behind existing entries of equal priority.
    pub fn attach_with_priority(&self, callback: &Callback<E>, priority: f64) {
        let mut callbacks = self.callbacks.write().unwrap_or_else(PoisonError::into_inner);
        callbacks.retain(|attached| !attached.is_same(callback));
        callbacks.insert(callback.clone(), priority);
    }

    /// Detach `callback`. Returns whether it was attached.
    pub fn detach(&self, callback: &Callback<E>) -> bool {
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|attached| !attached.is_same(callback))
            > 0
    }

    /// Detach every callback.
    pub fn detach_all(&self) {
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Attached callbacks in execution order.
    pub fn callback_list(&self) -> Vec<CallbackEntry<E>> {
        self.callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(callback, priority)| CallbackEntry {
                callback: callback.clone(),
                priority,
            })
            .collect()
    }

    /// Number of attached callbacks.
    pub fn len(&self) -> usize {
        self.callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no callback is attached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every callback against `event` in ascending priority.
    ///
    /// Stops before the next callback once the event is stopped. A failing
    /// callback is recorded as `Null` and its error collected on the event;
    /// the remaining callbacks still run. Callbacks attached or detached
    /// while this runs take effect on the next trigger.
    pub fn trigger(&self, event: &mut E) {
        let label = event.label();
        for entry in self.callback_list() {
            if event.is_stopped() {
                break;
            }
            let callback = &entry.callback;
            match isolate(callback.key(), &label, || (callback.func)(&mut *event, self)) {
                Ok(value) => event.record(callback.key(), value),
                Err(err) => {
                    event.record(callback.key(), Value::Null);
                    event.collect(err);
                }
            }
        }
    }
}

impl<E: Subject> Default for Emitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Emitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self
            .callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("Emitter").field("callbacks", &len).finish()
    }
}

// ============================================================================
// Emitters - one emitter per event type
// ============================================================================

/// Lazily created emitters, one per event type.
#[derive(Default)]
pub struct Emitters {
    emitters: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl Emitters {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The emitter for `E`, created on first use.
    pub fn get<E: Subject>(&self) -> Arc<Emitter<E>> {
        let id = TypeId::of::<E>();
        let existing = self
            .emitters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned();
        if let Some(Ok(emitter)) = existing.map(|any| any.downcast::<Emitter<E>>()) {
            return emitter;
        }

        let mut emitters = self.emitters.write().unwrap_or_else(PoisonError::into_inner);
        let slot = emitters
            .entry(id)
            .or_insert_with(|| Arc::new(Emitter::<E>::new()) as Arc<dyn Any + Send + Sync>);
        match slot.clone().downcast::<Emitter<E>>() {
            Ok(emitter) => emitter,
            Err(_) => {
                let emitter = Arc::new(Emitter::<E>::new());
                *slot = emitter.clone() as Arc<dyn Any + Send + Sync>;
                emitter
            }
        }
    }

    /// Whether an emitter for `E` has been created.
    pub fn contains<E: Subject>(&self) -> bool {
        self.emitters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<E>())
    }

    /// Number of emitters created.
    pub fn len(&self) -> usize {
        self.emitters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no emitter has been created.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every emitter and its callbacks.
    pub fn clear(&self) {
        self.emitters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl fmt::Debug for Emitters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitters").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};
    use std::sync::Mutex;
    use tidings_core::Event;

    fn recorder(key: &str, log: &Arc<Mutex<Vec<String>>>) -> Callback<Event> {
        let log = log.clone();
        let name = key.to_owned();
        Callback::new(key, move |_: &mut Event, _: &Emitter<Event>| {
            log.lock().unwrap().push(name.clone());
            Ok(json!(name))
        })
        .unwrap()
    }

    fn event() -> Event {
        Event::new("app", "start", Map::new())
    }

    #[test]
    fn runs_in_ascending_priority() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let emitter = Emitter::new();
        emitter.attach_with_priority(&recorder("A", &log), 1.0);
        emitter.attach_with_priority(&recorder("B", &log), 5.0);
        emitter.attach_with_priority(&recorder("C", &log), 3.0);

        let mut event = event();
        emitter.trigger(&mut event);

        assert_eq!(*log.lock().unwrap(), vec!["A", "C", "B"]);
        assert_eq!(event.invoked(), vec!["A", "C", "B"]);
    }

    #[test]
    fn ties_run_in_attach_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let emitter = Emitter::new();
        for key in ["first", "second", "third"] {
            emitter.attach(&recorder(key, &log));
        }

        emitter.trigger(&mut event());
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn reattach_replaces_instead_of_duplicating() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let emitter = Emitter::new();
        let a = recorder("a", &log);
        let b = recorder("b", &log);
        emitter.attach(&a);
        emitter.attach(&b);
        emitter.attach_with_priority(&a.clone(), 10.0);

        assert_eq!(emitter.len(), 2);
        let order: Vec<String> = emitter
            .callback_list()
            .iter()
            .map(|e| e.callback.key().to_owned())
            .collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn detach_uses_identity_not_key() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let emitter = Emitter::new();
        let original = recorder("same", &log);
        let lookalike = recorder("same", &log);
        emitter.attach(&original);

        assert!(!emitter.detach(&lookalike));
        assert_eq!(emitter.len(), 1);
        assert!(emitter.detach(&original));
        assert!(emitter.is_empty());

        emitter.attach(&original);
        emitter.attach(&lookalike);
        emitter.detach_all();
        assert!(emitter.is_empty());
    }

    #[test]
    fn stop_skips_later_callbacks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let emitter = Emitter::new();
        let stopper = Callback::new("stopper", |event: &mut Event, _: &Emitter<Event>| {
            event.set_stopped(true);
            Ok(json!("stopped"))
        })
        .unwrap();
        emitter.attach_with_priority(&stopper, 0.0);
        emitter.attach_with_priority(&recorder("late", &log), 1.0);

        let mut event = event();
        emitter.trigger(&mut event);

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(event.result("stopper"), Some(&json!("stopped")));
        assert_eq!(event.result("late"), None);
    }

    #[test]
    fn failures_are_collected_and_dispatch_continues() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let emitter = Emitter::new();
        let failing = Callback::new("failing", |_: &mut Event, _: &Emitter<Event>| {
            Err::<Value, BoxError>("boom".into())
        })
        .unwrap();
        emitter.attach_with_priority(&failing, 0.0);
        emitter.attach_with_priority(&recorder("after", &log), 1.0);

        let mut event = event();
        emitter.trigger(&mut event);

        assert_eq!(*log.lock().unwrap(), vec!["after"]);
        assert_eq!(event.collector().len(), 1);
        assert!(event.collector()[0].message().contains("boom"));
        assert_eq!(event.result("failing"), Some(&Value::Null));
    }

    #[test]
    fn callbacks_may_attach_during_trigger() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let emitter = Emitter::new();
        let late = recorder("late", &log);
        let attacher = Callback::new("attacher", move |_: &mut Event, emitter: &Emitter<Event>| {
            emitter.attach(&late);
            Ok(Value::Null)
        })
        .unwrap();
        emitter.attach(&attacher);

        emitter.trigger(&mut event());
        assert!(log.lock().unwrap().is_empty());

        emitter.trigger(&mut event());
        assert_eq!(*log.lock().unwrap(), vec!["late"]);
    }

    #[test]
    fn empty_key_is_rejected() {
        let result = Callback::new("  ", |_: &mut Event, _: &Emitter<Event>| Ok(Value::Null));
        assert_eq!(result.err(), Some(UsageError::EmptyCallbackKey));
    }

    #[test]
    fn emitters_are_cached_per_type() {
        #[derive(Debug, Default)]
        struct Ping {
            stopped: bool,
            seen: Vec<String>,
        }
        impl tidings_core::Message for Ping {}
        impl Subject for Ping {
            fn label(&self) -> String {
                "ping".into()
            }
            fn is_stopped(&self) -> bool {
                self.stopped
            }
            fn record(&mut self, key: &str, _value: Value) {
                self.seen.push(key.to_owned());
            }
            fn collect(&mut self, _error: tidings_core::ListenerError) {}
        }

        let emitters = Emitters::new();
        assert!(!emitters.contains::<Ping>());

        let first = emitters.get::<Ping>();
        let second = emitters.get::<Ping>();
        assert!(Arc::ptr_eq(&first, &second));
        let _events = emitters.get::<Event>();
        assert_eq!(emitters.len(), 2);

        let pong =
            Callback::new("pong", |_: &mut Ping, _: &Emitter<Ping>| Ok(Value::Null)).unwrap();
        first.attach(&pong);
        let mut ping = Ping::default();
        second.trigger(&mut ping);
        assert_eq!(ping.seen, vec!["pong"]);

        emitters.clear();
        assert!(emitters.is_empty());
        assert!(emitters.get::<Ping>().is_empty());
    }
}
