//! # tidings - Namespaced Event Dispatch
//!
//! `tidings` fires named events (`namespace` + `name`) through two kinds of
//! subscribers:
//!
//! - **persisted listeners**, described in a configuration store and resolved
//!   from installed extensions, shared across events by `(extension, library)`;
//! - **programmatic callbacks**, attached to an [`Emitter`] with a priority.
//!
//! Global subscribers run before the subscribers of every event. Listener
//! failures never abort a dispatch; they are collected on the event.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tidings::prelude::*;
//! use std::sync::Arc;
//!
//! let resolver = ExtensionResolver::new();
//! resolver.install(
//!     Extension::new("session")
//!         .library("tracker", || MyTracker::default())
//!         .listen("app", "start", "tracker"),
//! );
//! let resolver = Arc::new(resolver);
//! let store = Arc::new(JsonFileStore::open("listeners.json")?);
//!
//! let registry = Registry::builder(store, resolver.clone()).build();
//! registry.reload(resolver.as_ref())?;
//!
//! let dispatcher = Dispatcher::builder().registry(registry).build();
//! let event = dispatcher.trigger("app", "start", Map::new())?;
//! for failure in event.collector() {
//!     eprintln!("{failure}");
//! }
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use serde_json::{Map, Value};

pub use tidings_core::{
    // Errors
    BoxError,
    // Collaborators
    ConfigurationStore,
    DescriptorError,
    // Descriptors
    DESCRIPTOR_KEY_PREFIX,
    // Event
    Event,
    EventFlags,
    // Listener
    Executable,
    GLOBAL_NAME,
    GLOBAL_NAMESPACE,
    Listener,
    ListenerDescriptor,
    ListenerError,
    ListenerKey,
    Logger,
    // Message
    Message,
    NullLogger,
    ResolveError,
    Resolver,
    StoreError,
    Subject,
    TidingsError,
    UsageError,
    descriptor_key,
    event_id,
    is_global,
    isolate,
    parse_descriptor_key,
    same_instance,
};

pub use tidings_std::{
    // Dispatch
    Dispatcher,
    DispatcherBuilder,
    // Emitters
    Callback,
    CallbackEntry,
    DEFAULT_PRIORITY,
    Emitter,
    Emitters,
    PriorityList,
    // Registry
    Binding,
    BindingSource,
    ListenerCache,
    Registry,
    RegistryBuilder,
    ReloadReport,
    // Collaborators
    Extension,
    ExtensionResolver,
    JsonFileStore,
    MemoryStore,
    TracingLogger,
    default_logger,
};

#[cfg(feature = "inventory")]
pub use tidings_std::{CollectedBindings, DeclaredBinding};

/// Standard listener implementations.
pub mod listeners {
    pub use tidings_std::listeners::ActionTable;
}

/// Testing utilities.
pub mod testing {
    pub use tidings_std::testing::{
        FailingListener, Journal, Notice, PanickingListener, RecordingListener, RecordingLogger,
        StoppingListener,
    };
}

/// Prelude module - common imports for tidings.
///
/// # Usage
///
/// ```rust,ignore
/// use tidings::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BoxError, Callback, ConfigurationStore, Dispatcher, Emitter, Event, Executable,
        Extension, ExtensionResolver, JsonFileStore, Listener, ListenerDescriptor, Map,
        MemoryStore, Registry, Resolver, Subject, TidingsError, UsageError, Value,
    };
}

#[cfg(feature = "inventory")]
pub use inventory;
