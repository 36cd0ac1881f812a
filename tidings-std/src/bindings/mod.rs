//! Listener bindings declared by extensions.
//!
//! A binding says "library `L` of extension `X` listens to `namespace:name`".
//! Bindings are the source of truth for [`Registry::reload`], which turns
//! them into ordered descriptor arrays in the configuration store.
//!
//! [`Registry::reload`]: crate::registry::Registry::reload

#[cfg(feature = "inventory")]
pub mod collected;

#[cfg(feature = "inventory")]
pub use collected::{CollectedBindings, DeclaredBinding};

use serde_json::Value;
use std::sync::Arc;
use tidings_core::{ListenerDescriptor, ListenerKey, descriptor_key};

/// One extension library subscribed to one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// Extension shipping the listener.
    pub extension: String,
    /// Library inside the extension.
    pub library: String,
    /// Event namespace.
    pub namespace: String,
    /// Event name.
    pub name: String,
    /// Initial enabled flag for a binding seen for the first time.
    pub enabled: bool,
    /// Subscription data.
    pub data: Value,
}

impl Binding {
    /// An enabled binding without data.
    pub fn new(
        extension: impl Into<String>,
        library: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            extension: extension.into(),
            library: library.into(),
            namespace: namespace.into(),
            name: name.into(),
            enabled: true,
            data: Value::Null,
        }
    }

    /// Set the subscription data.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Set the initial enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The listener key.
    pub fn key(&self) -> ListenerKey {
        ListenerKey::new(&self.extension, &self.library)
    }

    /// Store key of the event this binding subscribes to.
    pub fn descriptor_key(&self) -> String {
        descriptor_key(&self.namespace, &self.name)
    }

    /// A fresh descriptor for a binding that has never been ordered.
    pub(crate) fn to_unordered_descriptor(&self) -> ListenerDescriptor {
        ListenerDescriptor::new(&self.extension, &self.library)
            .with_enabled(self.enabled)
            .with_order(-1)
            .with_data(self.data.clone())
    }
}

/// Anything that can enumerate the bindings of every installed extension.
pub trait BindingSource {
    /// All declared bindings, in declaration order.
    fn bindings(&self) -> Vec<Binding>;
}

impl BindingSource for [Binding] {
    fn bindings(&self) -> Vec<Binding> {
        self.to_vec()
    }
}

impl BindingSource for Vec<Binding> {
    fn bindings(&self) -> Vec<Binding> {
        self.clone()
    }
}

impl<S: BindingSource + ?Sized> BindingSource for Arc<S> {
    fn bindings(&self) -> Vec<Binding> {
        (**self).bindings()
    }
}
