//! Descriptor-driven listener registry.
//!
//! The registry reads ordered descriptor arrays from a
//! [`ConfigurationStore`], resolves them through a [`Resolver`] and hands out
//! [`Listener`]s in stored order. Invalid descriptors and failed resolutions
//! are logged as notices and skipped, so one broken extension never empties
//! an event.
//!
//! [`Registry::reload`] rebuilds the stored arrays from the bindings that
//! extensions declare, keeping any order and enabled state already recorded.

use crate::{
    bindings::{Binding, BindingSource},
    cache::ListenerCache,
    logging::default_logger,
    priority::PriorityList,
};
use serde_json::json;
use std::{collections::BTreeMap, sync::Arc};
use tidings_core::{
    ConfigurationStore, Listener, ListenerDescriptor, Logger, Resolver, StoreError, event_id,
    parse_descriptor_key,
};

const SOURCE: &str = "tidings::registry";

/// Outcome of a [`Registry::reload`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReloadReport {
    /// Events with at least one declared binding.
    pub events: usize,
    /// Bindings that already had a descriptor.
    pub kept: usize,
    /// Bindings seen for the first time.
    pub added: usize,
    /// Stored descriptors no longer declared by any extension.
    pub removed: usize,
    /// Store keys written or removed.
    pub rewritten: usize,
}

impl ReloadReport {
    /// Whether the reload changed the store.
    pub fn changed(&self) -> bool {
        self.rewritten > 0
    }
}

// ============================================================================
// RegistryBuilder
// ============================================================================

/// Builder for a [`Registry`].
///
/// # Example
/// ```ignore
/// let registry = RegistryBuilder::new(store, resolver)
///     .logger(Arc::new(TracingLogger))
///     .build();
/// ```
pub struct RegistryBuilder {
    store: Arc<dyn ConfigurationStore>,
    resolver: Arc<dyn Resolver>,
    logger: Option<Arc<dyn Logger>>,
}

impl RegistryBuilder {
    /// Start a builder from the two required collaborators.
    pub fn new(store: Arc<dyn ConfigurationStore>, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            store,
            resolver,
            logger: None,
        }
    }

    /// Use `logger` for notices instead of the default.
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Build the registry with an empty listener cache.
    pub fn build(self) -> Registry {
        Registry {
            store: self.store,
            resolver: self.resolver,
            cache: ListenerCache::new(),
            logger: self.logger.unwrap_or_else(default_logger),
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Loads persisted listeners for namespaced events.
pub struct Registry {
    store: Arc<dyn ConfigurationStore>,
    resolver: Arc<dyn Resolver>,
    cache: ListenerCache,
    logger: Arc<dyn Logger>,
}

impl Registry {
    /// Start building a registry.
    pub fn builder(
        store: Arc<dyn ConfigurationStore>,
        resolver: Arc<dyn Resolver>,
    ) -> RegistryBuilder {
        RegistryBuilder::new(store, resolver)
    }

    /// Listeners for `namespace:name`, in stored order.
    pub fn load(&self, namespace: &str, name: &str) -> Vec<Listener> {
        self.load_for(namespace, name, &event_id(namespace, name))
    }

    /// Listeners stored under `namespace:name`, checked against `event_id`.
    ///
    /// The dispatcher uses this for global listeners, which are stored under
    /// the global key but execute for whichever event is firing.
    pub fn load_for(&self, namespace: &str, name: &str, event_id: &str) -> Vec<Listener> {
        let key = tidings_core::descriptor_key(namespace, name);
        let descriptors = match self.store.get_array(&key) {
            Ok(descriptors) => descriptors,
            Err(err) => {
                self.notice(
                    "unable to read listener descriptors",
                    json!({ "key": key, "error": err.to_string() }),
                );
                return Vec::new();
            }
        };

        let listeners: Vec<Listener> = descriptors
            .iter()
            .enumerate()
            .filter_map(|(index, descriptor)| {
                if let Err(err) = descriptor.validate(index) {
                    self.notice(
                        "skipping invalid listener descriptor",
                        json!({ "key": key, "error": err.to_string() }),
                    );
                    return None;
                }
                match self.cache.resolve(descriptor, event_id, self.resolver.as_ref()) {
                    Ok(listener) => Some(listener),
                    Err(err) => {
                        self.notice(
                            "skipping unresolvable listener",
                            json!({
                                "key": key,
                                "listener": descriptor.key().to_string(),
                                "error": err.to_string(),
                            }),
                        );
                        None
                    }
                }
            })
            .collect();

        #[cfg(feature = "tracing")]
        tracing::trace!(key = %key, count = listeners.len(), "loaded listeners");

        listeners
    }

    /// Rebuild every stored descriptor array from `source`.
    ///
    /// For each event with declared bindings:
    /// - a binding with an existing descriptor keeps its stored position and
    ///   `enabled`, and takes the binding's current `data`; array position is
    ///   what dispatch follows, so stale or repeated `order` values never
    ///   reorder listeners;
    /// - a new binding is added with `order = -1` and sorted after all
    ///   ordered ones, in declaration order;
    /// - descriptors no longer declared are dropped;
    /// - the result is renumbered `0..n`.
    ///
    /// Event keys with no remaining bindings are removed. The store is only
    /// written and saved when something changed, so running this twice in a
    /// row leaves the second run with nothing to do.
    pub fn reload(&self, source: &dyn BindingSource) -> Result<ReloadReport, StoreError> {
        let mut declared: BTreeMap<String, Vec<Binding>> = BTreeMap::new();
        for binding in source.bindings() {
            let bucket = declared.entry(binding.descriptor_key()).or_default();
            if !bucket.iter().any(|b| b.key() == binding.key()) {
                bucket.push(binding);
            }
        }

        let mut report = ReloadReport {
            events: declared.len(),
            ..ReloadReport::default()
        };

        for (key, bindings) in &declared {
            let current = match self.store.get_array(key) {
                Ok(current) => current,
                Err(err) => {
                    self.notice(
                        "discarding unreadable listener descriptors",
                        json!({ "key": key, "error": err.to_string() }),
                    );
                    Vec::new()
                }
            };

            let mut ordered = PriorityList::new();
            for binding in bindings {
                let existing = current
                    .iter()
                    .position(|d| d.same_listener(&binding.extension, &binding.library));
                match existing {
                    Some(position) => {
                        report.kept += 1;
                        let stored = &current[position];
                        let descriptor =
                            ListenerDescriptor::new(&binding.extension, &binding.library)
                                .with_enabled(stored.enabled)
                                .with_data(binding.data.clone());
                        ordered.insert(descriptor, position as f64);
                    }
                    None => {
                        report.added += 1;
                        ordered.insert(binding.to_unordered_descriptor(), f64::INFINITY);
                    }
                }
            }
            report.removed += current
                .iter()
                .filter(|d| {
                    !bindings
                        .iter()
                        .any(|b| d.same_listener(&b.extension, &b.library))
                })
                .count();

            let normalized: Vec<ListenerDescriptor> = ordered
                .into_items()
                .into_iter()
                .enumerate()
                .map(|(position, descriptor)| descriptor.with_order(position as i64))
                .collect();

            if normalized != current {
                self.store.set(key, normalized)?;
                report.rewritten += 1;
            }
        }

        for key in self.store.keys()? {
            if parse_descriptor_key(&key).is_none() || declared.contains_key(&key) {
                continue;
            }
            report.removed += self.store.get_array(&key).map(|d| d.len()).unwrap_or(0);
            self.store.remove(&key)?;
            report.rewritten += 1;
        }

        if report.changed() {
            self.store.save()?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            events = report.events,
            kept = report.kept,
            added = report.added,
            removed = report.removed,
            rewritten = report.rewritten,
            "reloaded listener bindings"
        );

        Ok(report)
    }

    /// The listener instance cache.
    pub fn cache(&self) -> &ListenerCache {
        &self.cache
    }

    /// The backing configuration store.
    pub fn store(&self) -> &dyn ConfigurationStore {
        self.store.as_ref()
    }

    fn notice(&self, message: &str, context: serde_json::Value) {
        self.logger.notice(message, &context, SOURCE);
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
