//! # Event
//!
//! One firing of a named occurrence. The identity (`namespace`, `name`) and
//! the argument bag are fixed at construction. During dispatch listeners may
//! raise the [`STOPPED`] and [`PREVENTED`] flags; the dispatcher records every
//! listener's return value and collects every listener failure on the event.
//!
//! Once dispatch completes the event is finalized and the flag mutators
//! become no-ops.
//!
//! [`STOPPED`]: EventFlags::STOPPED
//! [`PREVENTED`]: EventFlags::PREVENTED

use crate::{
    error::ListenerError,
    message::{Message, Subject},
};
use bitflags::bitflags;
use serde_json::{Map, Value};

/// Namespace of the reserved pseudo-event fired before every other event.
pub const GLOBAL_NAMESPACE: &str = "global";

/// Name of the reserved pseudo-event fired before every other event.
pub const GLOBAL_NAME: &str = "global";

/// Whether `(namespace, name)` identifies the reserved global pseudo-event.
pub fn is_global(namespace: &str, name: &str) -> bool {
    namespace == GLOBAL_NAMESPACE && name == GLOBAL_NAME
}

/// Builds the dotted event id handed to listeners, e.g. `app.start`.
pub fn event_id(namespace: &str, name: &str) -> String {
    format!("{namespace}.{name}")
}

bitflags! {
    /// Control flags carried by an [`Event`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventFlags: u8 {
        /// No further listener runs in the current dispatch.
        const STOPPED = 1;
        /// The triggering code should skip its default behavior.
        const PREVENTED = 1 << 1;
        /// Dispatch has completed; flags are frozen.
        const FINALIZED = 1 << 2;
    }
}

/// An event being dispatched, or the outcome of a finished dispatch.
#[derive(Debug)]
pub struct Event {
    namespace: String,
    name: String,
    arguments: Map<String, Value>,
    flags: EventFlags,
    results: Vec<(String, Value)>,
    collector: Vec<ListenerError>,
}

impl Event {
    /// Create a fresh event. Construction cannot fail.
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        arguments: Map<String, Value>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            arguments,
            flags: EventFlags::empty(),
            results: Vec::new(),
            collector: Vec::new(),
        }
    }

    /// The event namespace, e.g. `app`.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The event name, e.g. `start`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The dotted id `namespace.name`.
    pub fn id(&self) -> String {
        event_id(&self.namespace, &self.name)
    }

    /// The caller-supplied argument bag.
    pub fn arguments(&self) -> &Map<String, Value> {
        &self.arguments
    }

    /// A single argument by name.
    pub fn argument(&self, key: &str) -> Option<&Value> {
        self.arguments.get(key)
    }

    /// Current flag set.
    pub fn flags(&self) -> EventFlags {
        self.flags
    }

    /// Whether a listener has stopped the dispatch.
    pub fn is_stopped(&self) -> bool {
        self.flags.contains(EventFlags::STOPPED)
    }

    /// Stop (or un-stop) the dispatch.
    ///
    /// The listener calling this still completes; the flag is checked before
    /// the next listener. Ignored after the event is finalized.
    pub fn set_stopped(&mut self, stopped: bool) {
        self.set_flag(EventFlags::STOPPED, stopped);
    }

    /// Whether a listener asked the caller to skip its default behavior.
    ///
    /// The dispatcher itself never acts on this flag.
    pub fn is_prevented(&self) -> bool {
        self.flags.contains(EventFlags::PREVENTED)
    }

    /// Mark (or unmark) the default behavior as prevented. Ignored after the
    /// event is finalized.
    pub fn set_prevented(&mut self, prevented: bool) {
        self.set_flag(EventFlags::PREVENTED, prevented);
    }

    /// Whether dispatch has completed.
    pub fn is_finalized(&self) -> bool {
        self.flags.contains(EventFlags::FINALIZED)
    }

    /// Freeze the event. Called by the dispatcher when a run completes.
    pub fn finalize(&mut self) {
        self.flags.insert(EventFlags::FINALIZED);
    }

    /// Recorded results in invocation order.
    pub fn results(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.results.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// The value recorded for `listener`, `None` if it never ran.
    ///
    /// Disabled and failed listeners are recorded as [`Value::Null`].
    pub fn result(&self, listener: &str) -> Option<&Value> {
        self.results
            .iter()
            .find(|(key, _)| key == listener)
            .map(|(_, value)| value)
    }

    /// Keys of the listeners reached, in invocation order.
    pub fn invoked(&self) -> Vec<&str> {
        self.results.iter().map(|(key, _)| key.as_str()).collect()
    }

    /// Record a listener's return value.
    ///
    /// A key recorded twice keeps its first position and takes the latest
    /// value. Ignored after the event is finalized.
    pub fn record_result(&mut self, listener: impl Into<String>, value: Value) {
        if self.is_finalized() {
            return;
        }
        let listener = listener.into();
        match self.results.iter_mut().find(|(key, _)| *key == listener) {
            Some(slot) => slot.1 = value,
            None => self.results.push((listener, value)),
        }
    }

    /// Failures collected during dispatch, in occurrence order.
    pub fn collector(&self) -> &[ListenerError] {
        &self.collector
    }

    /// Whether any listener failed.
    pub fn has_failures(&self) -> bool {
        !self.collector.is_empty()
    }

    /// Append a listener failure. Ignored after the event is finalized.
    pub fn collect(&mut self, error: ListenerError) {
        if !self.is_finalized() {
            self.collector.push(error);
        }
    }

    fn set_flag(&mut self, flag: EventFlags, on: bool) {
        if !self.is_finalized() {
            self.flags.set(flag, on);
        }
    }
}

impl Message for Event {}

impl Subject for Event {
    fn label(&self) -> String {
        self.id()
    }

    fn is_stopped(&self) -> bool {
        Event::is_stopped(self)
    }

    fn record(&mut self, key: &str, value: Value) {
        self.record_result(key, value);
    }

    fn collect(&mut self, error: ListenerError) {
        Event::collect(self, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn start() -> Event {
        let mut args = Map::new();
        args.insert("user".into(), json!("ada"));
        Event::new("app", "start", args)
    }

    #[test]
    fn identity_and_arguments() {
        let event = start();
        assert_eq!(event.namespace(), "app");
        assert_eq!(event.name(), "start");
        assert_eq!(event.id(), "app.start");
        assert_eq!(event.argument("user"), Some(&json!("ada")));
        assert!(event.argument("missing").is_none());
        assert_eq!(event.flags(), EventFlags::empty());
    }

    #[test]
    fn flags_are_independent() {
        let mut event = start();
        event.set_prevented(true);
        assert!(event.is_prevented());
        assert!(!event.is_stopped());

        event.set_stopped(true);
        event.set_prevented(false);
        assert!(event.is_stopped());
        assert!(!event.is_prevented());
    }

    #[test]
    fn results_keep_first_position() {
        let mut event = start();
        event.record_result("x:a", json!(1));
        event.record_result("x:b", Value::Null);
        event.record_result("x:a", json!(2));

        assert_eq!(event.invoked(), vec!["x:a", "x:b"]);
        assert_eq!(event.result("x:a"), Some(&json!(2)));
        assert_eq!(event.result("x:b"), Some(&Value::Null));
        assert_eq!(event.result("x:c"), None);
    }

    #[test]
    fn finalized_event_is_read_only() {
        let mut event = start();
        event.record_result("x:a", json!(true));
        event.finalize();

        event.set_stopped(true);
        event.set_prevented(true);
        event.record_result("x:b", json!(false));
        event.collect(ListenerError::Panicked {
            listener: "x:b".into(),
            event: "app.start".into(),
            message: "late".into(),
        });

        assert!(event.is_finalized());
        assert!(!event.is_stopped());
        assert!(!event.is_prevented());
        assert_eq!(event.invoked(), vec!["x:a"]);
        assert!(!event.has_failures());
    }

    #[test]
    fn global_pseudo_event_is_recognized() {
        assert!(is_global(GLOBAL_NAMESPACE, GLOBAL_NAME));
        assert!(!is_global("global", "start"));
        assert!(!is_global("app", "global"));
    }
}
