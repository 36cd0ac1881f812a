//! In-process extension resolver.
//!
//! Extensions register their libraries as factories and declare which events
//! those libraries listen to. The resolver serves both sides of the registry:
//! it resolves listener instances ([`Resolver`]) and enumerates declared
//! bindings ([`BindingSource`]) for reloads.

use crate::bindings::{Binding, BindingSource};
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, RwLock},
};
use tidings_core::{Executable, ListenerKey, ResolveError, Resolver};

type Factory = Arc<dyn Fn() -> Arc<dyn Executable> + Send + Sync>;

/// An installable extension: named libraries plus event bindings.
pub struct Extension {
    name: String,
    libraries: Vec<(String, Factory)>,
    bindings: Vec<Binding>,
}

impl Extension {
    /// Create an extension with no libraries.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            libraries: Vec::new(),
            bindings: Vec::new(),
        }
    }

    /// The extension name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a library built by `factory` on first resolution.
    pub fn library<X, F>(mut self, library: impl Into<String>, factory: F) -> Self
    where
        X: Executable,
        F: Fn() -> X + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || Arc::new(factory()) as Arc<dyn Executable>);
        self.libraries.push((library.into(), factory));
        self
    }

    /// Register a library backed by an existing instance.
    pub fn instance(mut self, library: impl Into<String>, instance: Arc<dyn Executable>) -> Self {
        let factory: Factory = Arc::new(move || instance.clone());
        self.libraries.push((library.into(), factory));
        self
    }

    /// Declare that `library` listens to `namespace:name`.
    pub fn listen(self, namespace: &str, name: &str, library: &str) -> Self {
        self.listen_with(namespace, name, library, Value::Null)
    }

    /// Declare a binding carrying subscription data.
    pub fn listen_with(mut self, namespace: &str, name: &str, library: &str, data: Value) -> Self {
        let binding = Binding::new(self.name.clone(), library, namespace, name).with_data(data);
        self.bindings.push(binding);
        self
    }

    /// Declared bindings, in declaration order.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    fn factory(&self, library: &str) -> Option<Factory> {
        self.libraries
            .iter()
            .find(|(name, _)| name == library)
            .map(|(_, factory)| factory.clone())
    }
}

impl std::fmt::Debug for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let libraries: Vec<&str> = self.libraries.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("Extension")
            .field("name", &self.name)
            .field("libraries", &libraries)
            .field("bindings", &self.bindings)
            .finish()
    }
}

/// Resolver over a set of installed [`Extension`]s.
#[derive(Default)]
pub struct ExtensionResolver {
    extensions: RwLock<Vec<Extension>>,
    instantiations: Mutex<HashMap<ListenerKey, usize>>,
}

impl ExtensionResolver {
    /// Create a resolver with nothing installed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `extension`, replacing an installed one with the same name in
    /// place.
    pub fn install(&self, extension: Extension) {
        let mut extensions = self.extensions.write().unwrap_or_else(PoisonError::into_inner);
        match extensions.iter_mut().find(|e| e.name == extension.name) {
            Some(slot) => *slot = extension,
            None => extensions.push(extension),
        }
    }

    /// Uninstall an extension. Returns whether it was installed.
    pub fn uninstall(&self, name: &str) -> bool {
        let mut extensions = self.extensions.write().unwrap_or_else(PoisonError::into_inner);
        let before = extensions.len();
        extensions.retain(|e| e.name != name);
        extensions.len() != before
    }

    /// Names of installed extensions, in install order.
    pub fn installed(&self) -> Vec<String> {
        self.extensions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    /// How many instances this resolver has built for `extension:library`.
    pub fn instantiations(&self, extension: &str, library: &str) -> usize {
        self.instantiations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&ListenerKey::new(extension, library))
            .copied()
            .unwrap_or(0)
    }
}

impl Resolver for ExtensionResolver {
    fn resolve(
        &self,
        extension: &str,
        library: &str,
    ) -> Result<Arc<dyn Executable>, ResolveError> {
        let factory = {
            let extensions = self.extensions.read().unwrap_or_else(PoisonError::into_inner);
            let installed = extensions
                .iter()
                .find(|e| e.name == extension)
                .ok_or_else(|| ResolveError::UnknownExtension(extension.to_owned()))?;
            installed
                .factory(library)
                .ok_or_else(|| ResolveError::UnknownLibrary {
                    extension: extension.to_owned(),
                    library: library.to_owned(),
                })?
        };

        // The lock is released before running extension code.
        let instance = factory();
        *self
            .instantiations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(ListenerKey::new(extension, library))
            .or_default() += 1;
        Ok(instance)
    }
}

impl BindingSource for ExtensionResolver {
    fn bindings(&self) -> Vec<Binding> {
        self.extensions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .flat_map(|e| e.bindings.iter().cloned())
            .collect()
    }
}

impl std::fmt::Debug for ExtensionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionResolver")
            .field("installed", &self.installed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingListener;
    use serde_json::json;

    #[test]
    fn resolve_reports_what_is_missing() {
        let resolver = ExtensionResolver::new();
        resolver.install(Extension::new("x").library("a", RecordingListener::detached));

        assert!(resolver.resolve("x", "a").is_ok());
        assert_eq!(
            resolver.resolve("y", "a").err(),
            Some(ResolveError::UnknownExtension("y".into()))
        );
        assert_eq!(
            resolver.resolve("x", "b").err(),
            Some(ResolveError::UnknownLibrary {
                extension: "x".into(),
                library: "b".into()
            })
        );
    }

    #[test]
    fn every_resolution_builds_an_instance() {
        let resolver = ExtensionResolver::new();
        resolver.install(Extension::new("x").library("a", RecordingListener::detached));

        resolver.resolve("x", "a").unwrap();
        resolver.resolve("x", "a").unwrap();
        assert_eq!(resolver.instantiations("x", "a"), 2);
        assert_eq!(resolver.instantiations("x", "b"), 0);
    }

    #[test]
    fn bindings_follow_install_then_declaration_order() {
        let resolver = ExtensionResolver::new();
        resolver.install(
            Extension::new("x")
                .library("a", RecordingListener::detached)
                .listen("app", "start", "a")
                .listen_with("app", "stop", "a", json!({"flush": true})),
        );
        resolver.install(Extension::new("y").listen("app", "start", "b"));

        let keys: Vec<(String, String)> = resolver
            .bindings()
            .into_iter()
            .map(|b| (b.key().to_string(), b.descriptor_key()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("x:a".to_string(), "event-app:start".to_string()),
                ("x:a".to_string(), "event-app:stop".to_string()),
                ("y:b".to_string(), "event-app:start".to_string()),
            ]
        );
    }

    #[test]
    fn reinstall_replaces_in_place() {
        let resolver = ExtensionResolver::new();
        resolver.install(Extension::new("x"));
        resolver.install(Extension::new("y"));
        resolver.install(Extension::new("x").listen("app", "start", "a"));

        assert_eq!(resolver.installed(), vec!["x", "y"]);
        assert_eq!(resolver.bindings().len(), 1);
        assert!(resolver.uninstall("x"));
        assert!(!resolver.uninstall("x"));
        assert_eq!(resolver.installed(), vec!["y"]);
    }
}
