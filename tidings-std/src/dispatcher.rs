//! Event dispatcher.
//!
//! The dispatcher turns `trigger(namespace, name, arguments)` into one
//! dispatch run over a fresh [`Event`]:
//!
//! 1. global subscribers: persisted listeners stored under the reserved
//!    `global:global` key, then programmatic global callbacks;
//! 2. event subscribers: persisted listeners for `namespace:name`, then
//!    programmatic callbacks for that event.
//!
//! Every listener runs inside a failure boundary. Failures are collected on
//! the event and never returned; the only error a trigger can return is a
//! [`UsageError`].

use crate::{
    emitter::{Emitter, Emitters},
    registry::Registry,
};
use serde_json::{Map, Value};
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};
use tidings_core::{Event, GLOBAL_NAME, GLOBAL_NAMESPACE, Subject, UsageError, event_id, is_global};

/// Builder for a [`Dispatcher`].
#[derive(Debug, Default)]
pub struct DispatcherBuilder {
    registry: Option<Registry>,
}

impl DispatcherBuilder {
    /// Create a builder without a registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load persisted listeners from `registry`.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Build the dispatcher.
    pub fn build(self) -> Dispatcher {
        Dispatcher {
            registry: self.registry,
            subscriptions: RwLock::new(HashMap::new()),
            emitters: Emitters::new(),
        }
    }
}

/// Orchestrates event firings over persisted and programmatic listeners.
///
/// The dispatcher owns every cache involved in dispatch: the registry's
/// listener cache, the per-event subscription emitters and the per-type
/// [`Emitters`]. Dropping it drops them all.
pub struct Dispatcher {
    registry: Option<Registry>,
    subscriptions: RwLock<HashMap<String, Arc<Emitter<Event>>>>,
    emitters: Emitters,
}

impl Dispatcher {
    /// A dispatcher with programmatic subscriptions only.
    pub fn new() -> Self {
        DispatcherBuilder::new().build()
    }

    /// Start building a dispatcher.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Fire `namespace.name` and return the finalized event.
    ///
    /// Listener failures end up in [`Event::collector`]. Triggering the
    /// reserved global pseudo-event is a [`UsageError`].
    pub fn trigger(
        &self,
        namespace: &str,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Event, UsageError> {
        if is_global(namespace, name) {
            return Err(UsageError::ReservedEvent(event_id(namespace, name)));
        }

        let mut event = Event::new(namespace, name, arguments);

        #[cfg(feature = "tracing")]
        tracing::debug!(event = %event.id(), "triggering event");

        self.run(GLOBAL_NAMESPACE, GLOBAL_NAME, &mut event);
        self.run(namespace, name, &mut event);
        event.finalize();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            event = %event.id(),
            invoked = event.invoked().len(),
            failures = event.collector().len(),
            stopped = event.is_stopped(),
            prevented = event.is_prevented(),
            "event dispatched"
        );

        Ok(event)
    }

    /// The subscription emitter for `namespace.name`, created on first use.
    ///
    /// `global.global` returns the global emitter.
    pub fn emitter(&self, namespace: &str, name: &str) -> Arc<Emitter<Event>> {
        let id = event_id(namespace, name);
        if let Some(emitter) = self.subscription(&id) {
            return emitter;
        }
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_default()
            .clone()
    }

    /// The emitter whose callbacks run before every event.
    pub fn global_emitter(&self) -> Arc<Emitter<Event>> {
        self.emitter(GLOBAL_NAMESPACE, GLOBAL_NAME)
    }

    /// Run the per-type emitter for `E` over `event` and hand it back.
    pub fn emit<E: Subject>(&self, mut event: E) -> E {
        self.emitters.get::<E>().trigger(&mut event);
        event
    }

    /// Per-type emitters used by [`emit`](Self::emit).
    pub fn emitters(&self) -> &Emitters {
        &self.emitters
    }

    /// The persisted-listener registry, if configured.
    pub fn registry(&self) -> Option<&Registry> {
        self.registry.as_ref()
    }

    fn run(&self, namespace: &str, name: &str, event: &mut Event) {
        if let Some(registry) = &self.registry {
            let current = event.id();
            for listener in registry.load_for(namespace, name, &current) {
                if event.is_stopped() {
                    return;
                }
                let key = listener.key().to_string();
                match listener.execute(event) {
                    Ok(value) => event.record_result(key, value),
                    Err(err) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(error = %err, "listener failed");

                        event.record_result(key, Value::Null);
                        event.collect(err);
                    }
                }
            }
        }

        if event.is_stopped() {
            return;
        }
        if let Some(emitter) = self.subscription(&event_id(namespace, name)) {
            emitter.trigger(event);
        }
    }

    fn subscription(&self, id: &str) -> Option<Arc<Emitter<Event>>> {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscriptions = self
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("subscriptions", &subscriptions)
            .field("emitters", &self.emitters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::Callback;
    use serde_json::json;

    #[test]
    fn reserved_event_cannot_be_triggered() {
        let dispatcher = Dispatcher::new();
        let err = dispatcher
            .trigger(GLOBAL_NAMESPACE, GLOBAL_NAME, Map::new())
            .unwrap_err();
        assert_eq!(err, UsageError::ReservedEvent("global.global".into()));
    }

    #[test]
    fn trigger_without_subscribers_returns_clean_event() {
        let dispatcher = Dispatcher::new();
        let mut args = Map::new();
        args.insert("path".into(), json!("/"));

        let event = dispatcher.trigger("request", "begin", args).unwrap();
        assert_eq!(event.id(), "request.begin");
        assert_eq!(event.argument("path"), Some(&json!("/")));
        assert!(event.invoked().is_empty());
        assert!(event.is_finalized());
    }

    #[test]
    fn global_callbacks_run_first() {
        let dispatcher = Dispatcher::new();
        let specific = Callback::new("specific", |event: &mut Event, _: &Emitter<Event>| {
            Ok(json!(event.result("global").is_some()))
        })
        .unwrap();
        let global = Callback::new("global", |event: &mut Event, _: &Emitter<Event>| {
            Ok(json!(event.id()))
        })
        .unwrap();
        dispatcher.emitter("app", "start").attach(&specific);
        dispatcher.global_emitter().attach(&global);

        let event = dispatcher.trigger("app", "start", Map::new()).unwrap();
        assert_eq!(event.invoked(), vec!["global", "specific"]);
        assert_eq!(event.result("global"), Some(&json!("app.start")));
        assert_eq!(event.result("specific"), Some(&json!(true)));
    }

    #[test]
    fn emitter_is_shared_per_event() {
        let dispatcher = Dispatcher::new();
        assert!(Arc::ptr_eq(
            &dispatcher.emitter("app", "start"),
            &dispatcher.emitter("app", "start")
        ));
        assert!(!Arc::ptr_eq(
            &dispatcher.emitter("app", "start"),
            &dispatcher.emitter("app", "stop")
        ));
        assert!(Arc::ptr_eq(
            &dispatcher.global_emitter(),
            &dispatcher.emitter(GLOBAL_NAMESPACE, GLOBAL_NAME)
        ));
    }

    #[test]
    fn prevented_is_left_to_the_caller() {
        let dispatcher = Dispatcher::new();
        let preventer = Callback::new("preventer", |event: &mut Event, _: &Emitter<Event>| {
            event.set_prevented(true);
            Ok(Value::Null)
        })
        .unwrap();
        let after =
            Callback::new("after", |_: &mut Event, _: &Emitter<Event>| Ok(json!(1))).unwrap();
        let emitter = dispatcher.emitter("render", "page");
        emitter.attach(&preventer);
        emitter.attach(&after);

        let event = dispatcher.trigger("render", "page", Map::new()).unwrap();
        assert!(event.is_prevented());
        assert_eq!(event.result("after"), Some(&json!(1)));
    }

    #[test]
    fn emit_uses_the_type_emitter() {
        let dispatcher = Dispatcher::new();
        let tag = Callback::new("tag", |event: &mut Event, _: &Emitter<Event>| {
            Ok(json!(event.name()))
        })
        .unwrap();
        dispatcher.emitters().get::<Event>().attach(&tag);

        let event = dispatcher.emit(Event::new("custom", "thing", Map::new()));
        assert_eq!(event.result("tag"), Some(&json!("thing")));
        assert!(!event.is_finalized());
    }
}
