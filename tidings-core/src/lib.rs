//! # tidings-core
//!
//! Core types for the Tidings event dispatch engine.
//!
//! This crate has minimal dependencies and is meant to be imported by
//! extensions that only need to implement listeners, without pulling in the
//! registry and dispatcher from `tidings-std`.
//!
//! # Building Blocks
//!
//! ## [`Event`]
//!
//! One firing of a named occurrence (`namespace.name`). Carries the
//! caller's arguments, the `stopped` / `prevented` flags, the ordered result
//! map and the collector of listener failures.
//!
//! ## [`Executable`] and [`Listener`]
//!
//! `Executable` is the capability every listener instance exposes. A
//! `Listener` binds a shared instance to one subscription's data and enabled
//! flag, and runs it inside a failure boundary.
//!
//! ## [`ListenerDescriptor`]
//!
//! The persisted form of a subscription, stored as ordered arrays under
//! `event-<namespace>:<name>`.
//!
//! ## Collaborators
//!
//! - [`Resolver`] - turns `(extension, library)` into an instance
//! - [`ConfigurationStore`] - persists descriptor arrays
//! - [`Logger`] - receives notices for skipped listeners
//!
//! # Error Types
//!
//! - [`TidingsError`] - Top-level error type
//! - [`UsageError`] - Caller bugs
//! - [`ListenerError`] - Failures collected on an event

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod collaborators;
mod descriptor;
mod error;
mod event;
mod listener;
mod message;

// Re-exports
pub use collaborators::{ConfigurationStore, Logger, NullLogger, Resolver};
pub use descriptor::{
    DESCRIPTOR_KEY_PREFIX, ListenerDescriptor, descriptor_key, parse_descriptor_key,
};
pub use error::{
    BoxError, DescriptorError, ListenerError, ResolveError, StoreError, TidingsError, UsageError,
};
pub use event::{Event, EventFlags, GLOBAL_NAME, GLOBAL_NAMESPACE, event_id, is_global};
pub use listener::{Executable, Listener, ListenerKey, isolate, same_instance};
pub use message::{Message, Subject};
