//! Singleton cache of listener instances.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};
use tidings_core::{Executable, Listener, ListenerDescriptor, ListenerKey, ResolveError, Resolver};

/// Resolves descriptors into [`Listener`]s, creating at most one instance per
/// [`ListenerKey`].
///
/// The cache lives as long as the registry that owns it. Instances are
/// created on first resolution and dropped by [`clear`](Self::clear) or when
/// the cache itself is dropped.
#[derive(Default)]
pub struct ListenerCache {
    instances: RwLock<HashMap<ListenerKey, Arc<dyn Executable>>>,
}

impl ListenerCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `descriptor` for `event_id`.
    ///
    /// The first resolution of a key asks `resolver` for an instance and
    /// caches it; later ones reuse it. The returned listener always carries
    /// the descriptor's own `data` and `enabled`.
    pub fn resolve(
        &self,
        descriptor: &ListenerDescriptor,
        event_id: &str,
        resolver: &dyn Resolver,
    ) -> Result<Listener, ResolveError> {
        let key = descriptor.key();
        let instance = match self.get(&key) {
            Some(instance) => instance,
            None => {
                let resolved = resolver.resolve(key.extension(), key.library())?;
                let mut instances = self.instances.write().unwrap_or_else(PoisonError::into_inner);
                // Another thread may have won the race; keep the first instance.
                instances.entry(key.clone()).or_insert(resolved).clone()
            }
        };

        if !instance.handles(event_id) {
            return Err(ResolveError::NotExecutable {
                listener: key.to_string(),
                event: event_id.to_owned(),
            });
        }

        Ok(Listener::new(
            key,
            instance,
            descriptor.data.clone(),
            descriptor.enabled,
        ))
    }

    /// The cached instance for `key`, if any.
    pub fn get(&self, key: &ListenerKey) -> Option<Arc<dyn Executable>> {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Whether `key` has been resolved.
    pub fn contains(&self, key: &ListenerKey) -> bool {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Number of cached instances.
    pub fn len(&self) -> usize {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached instance. Later resolutions call the resolver again.
    pub fn clear(&self) {
        self.instances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl std::fmt::Debug for ListenerCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerCache")
            .field("len", &self.len())
            .finish()
    }
}
