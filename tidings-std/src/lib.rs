//! # tidings-std
//!
//! Standard implementations for the tidings event dispatch engine.
//!
//! This crate provides:
//! - **Dispatch**: [`Dispatcher`] runs global then event-specific listeners
//! - **Persisted listeners**: [`Registry`] with load and reload, backed by a
//!   [`ListenerCache`] so one `(extension, library)` pair is built once
//! - **Programmatic listeners**: [`Emitter`] and per-type [`Emitters`]
//! - **Collaborators**: [`MemoryStore`], [`JsonFileStore`],
//!   [`ExtensionResolver`], [`TracingLogger`]
//! - **Standard listeners**: [`ActionTable`]
//! - **Testing utilities**: [`testing`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use tidings_core;

pub mod bindings;
pub mod cache;
pub mod dispatcher;
pub mod emitter;
pub mod listeners;
pub mod logging;
pub mod priority;
pub mod registry;
pub mod resolver;
pub mod stores;
pub mod testing;

pub use bindings::{Binding, BindingSource};
#[cfg(feature = "inventory")]
pub use bindings::{CollectedBindings, DeclaredBinding};
pub use cache::ListenerCache;
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use emitter::{Callback, CallbackEntry, Emitter, Emitters};
pub use listeners::ActionTable;
pub use logging::{TracingLogger, default_logger};
pub use priority::{DEFAULT_PRIORITY, PriorityList};
pub use registry::{Registry, RegistryBuilder, ReloadReport};
pub use resolver::{Extension, ExtensionResolver};
pub use stores::{JsonFileStore, MemoryStore};

#[cfg(feature = "inventory")]
pub use inventory;
