#![allow(dead_code)]

use std::sync::Arc;
use tidings::{
    Dispatcher, Extension, ExtensionResolver, ListenerDescriptor, Map, MemoryStore, Registry,
    Value,
    testing::{
        FailingListener, Journal, PanickingListener, RecordingListener, RecordingLogger,
        StoppingListener,
    },
};

// ============================================================================
// Extensions
// ============================================================================

/// Extension `x` with one library per listener behaviour.
///
/// - `a`, `b`, `c`, `g`: record their label and return it
/// - `fail`: fails with "boom"
/// - `stop`: stops propagation
/// - `stopfail`: stops propagation, then fails with "late failure"
/// - `panic`: panics with "kaboom"
pub fn extension(journal: &Journal) -> Extension {
    let mut extension = Extension::new("x");
    for label in ["a", "b", "c", "g"] {
        let journal = journal.clone();
        extension = extension.library(label, move || RecordingListener::new(label, &journal));
    }

    let j = journal.clone();
    extension = extension.library("fail", move || FailingListener::new("fail", &j, "boom"));
    let j = journal.clone();
    extension = extension.library("stop", move || StoppingListener::new("stop", &j));
    let j = journal.clone();
    extension = extension.library("stopfail", move || {
        StoppingListener::new("stopfail", &j).then_fail("late failure")
    });
    let j = journal.clone();
    extension.library("panic", move || PanickingListener::new("panic", &j, "kaboom"))
}

pub fn resolver(journal: &Journal) -> Arc<ExtensionResolver> {
    let resolver = ExtensionResolver::new();
    resolver.install(extension(journal));
    Arc::new(resolver)
}

// ============================================================================
// Fixture
// ============================================================================

pub struct Fixture {
    pub journal: Journal,
    pub resolver: Arc<ExtensionResolver>,
    pub logger: Arc<RecordingLogger>,
    pub dispatcher: Dispatcher,
}

/// A dispatcher over `store` and extension `x`.
pub fn fixture(store: MemoryStore) -> Fixture {
    let journal = Journal::new();
    let resolver = resolver(&journal);
    let logger = Arc::new(RecordingLogger::new());
    let registry = Registry::builder(Arc::new(store), resolver.clone())
        .logger(logger.clone())
        .build();
    Fixture {
        journal,
        resolver,
        logger,
        dispatcher: Dispatcher::builder().registry(registry).build(),
    }
}

/// Descriptors for extension `x`, in the given order.
pub fn descriptors(libraries: &[&str]) -> Vec<ListenerDescriptor> {
    libraries
        .iter()
        .map(|library| ListenerDescriptor::new("x", *library))
        .collect()
}

pub fn args(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), value.clone()))
        .collect()
}
