//! Traits for the collaborators the engine consumes: the resolver turning a
//! listener identifier into an instance, the store persisting descriptors,
//! and the logger receiving notices.

use crate::{
    descriptor::ListenerDescriptor,
    error::{ResolveError, StoreError},
    listener::Executable,
};
use serde_json::Value;
use std::sync::Arc;

/// Turns `(extension, library)` into a callable instance.
pub trait Resolver: Send + Sync {
    /// Resolve a listener instance. Called once per key per cache.
    fn resolve(&self, extension: &str, library: &str)
    -> Result<Arc<dyn Executable>, ResolveError>;
}

impl<R: Resolver + ?Sized> Resolver for Arc<R> {
    fn resolve(
        &self,
        extension: &str,
        library: &str,
    ) -> Result<Arc<dyn Executable>, ResolveError> {
        (**self).resolve(extension, library)
    }
}

/// Persists ordered descriptor arrays by key.
///
/// Writes go through `&self`; implementations guard their own state.
pub trait ConfigurationStore: Send + Sync {
    /// Descriptors stored under `key`; empty when the key is absent.
    fn get_array(&self, key: &str) -> Result<Vec<ListenerDescriptor>, StoreError>;

    /// Replace the descriptors under `key`. Not durable until [`save`].
    ///
    /// [`save`]: ConfigurationStore::save
    fn set(&self, key: &str, descriptors: Vec<ListenerDescriptor>) -> Result<(), StoreError>;

    /// Remove `key`.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Every key currently stored, sorted.
    fn keys(&self) -> Result<Vec<String>, StoreError>;

    /// Persist pending changes.
    fn save(&self) -> Result<(), StoreError>;
}

impl<S: ConfigurationStore + ?Sized> ConfigurationStore for Arc<S> {
    fn get_array(&self, key: &str) -> Result<Vec<ListenerDescriptor>, StoreError> {
        (**self).get_array(key)
    }

    fn set(&self, key: &str, descriptors: Vec<ListenerDescriptor>) -> Result<(), StoreError> {
        (**self).set(key, descriptors)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).keys()
    }

    fn save(&self) -> Result<(), StoreError> {
        (**self).save()
    }
}

/// Receives notices about skipped descriptors and failed resolutions.
///
/// Implementations must not block or panic.
pub trait Logger: Send + Sync {
    /// Log a notice. `source` names the component, e.g. `tidings::registry`.
    fn notice(&self, message: &str, context: &Value, source: &str);
}

impl<L: Logger + ?Sized> Logger for Arc<L> {
    fn notice(&self, message: &str, context: &Value, source: &str) {
        (**self).notice(message, context, source)
    }
}

/// A logger that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn notice(&self, _message: &str, _context: &Value, _source: &str) {}
}
