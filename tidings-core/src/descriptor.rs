//! Persisted listener descriptors.

use crate::{error::DescriptorError, listener::ListenerKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix of every store key holding listener descriptors.
pub const DESCRIPTOR_KEY_PREFIX: &str = "event-";

/// Store key for the descriptors of `namespace:name`, e.g. `event-app:start`.
pub fn descriptor_key(namespace: &str, name: &str) -> String {
    format!("{DESCRIPTOR_KEY_PREFIX}{namespace}:{name}")
}

/// Split a descriptor key back into `(namespace, name)`.
pub fn parse_descriptor_key(key: &str) -> Option<(&str, &str)> {
    key.strip_prefix(DESCRIPTOR_KEY_PREFIX)?.split_once(':')
}

/// The persisted form of one subscription.
///
/// Descriptors are stored as an ordered array per event; array position is
/// the execution priority. `order` mirrors that position after a registry
/// reload and is what a reload preserves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenerDescriptor {
    /// Extension shipping the listener.
    #[serde(default)]
    pub extension: String,
    /// Library inside the extension.
    #[serde(default)]
    pub library: String,
    /// Whether the subscription runs.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Recorded position; `-1` for bindings not yet ordered.
    #[serde(default)]
    pub order: i64,
    /// Subscription data handed to the listener.
    #[serde(default)]
    pub data: Value,
}

fn enabled_by_default() -> bool {
    true
}

impl ListenerDescriptor {
    /// An enabled descriptor with no data.
    pub fn new(extension: impl Into<String>, library: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            library: library.into(),
            enabled: true,
            order: 0,
            data: Value::Null,
        }
    }

    /// Set the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the recorded order.
    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    /// Set the subscription data.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// The listener key this descriptor resolves to.
    pub fn key(&self) -> ListenerKey {
        ListenerKey::new(&self.extension, &self.library)
    }

    /// Whether this descriptor names `extension:library`.
    pub fn same_listener(&self, extension: &str, library: &str) -> bool {
        self.extension == extension && self.library == library
    }

    /// Check the identifying fields. `index` is the array position, used in
    /// the error.
    pub fn validate(&self, index: usize) -> Result<(), DescriptorError> {
        if self.extension.trim().is_empty() {
            return Err(DescriptorError::MissingExtension {
                index,
                library: self.library.clone(),
            });
        }
        if self.library.trim().is_empty() {
            return Err(DescriptorError::MissingLibrary {
                index,
                extension: self.extension.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_round_trips_through_parse() {
        let key = descriptor_key("app", "start");
        assert_eq!(key, "event-app:start");
        assert_eq!(parse_descriptor_key(&key), Some(("app", "start")));
        assert_eq!(parse_descriptor_key("locale-en"), None);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let descriptor: ListenerDescriptor =
            serde_json::from_value(json!({ "extension": "x", "library": "a" })).unwrap();
        assert!(descriptor.enabled);
        assert_eq!(descriptor.order, 0);
        assert_eq!(descriptor.data, Value::Null);
        assert_eq!(descriptor.key().to_string(), "x:a");
    }

    #[test]
    fn validation_names_the_missing_field() {
        assert!(ListenerDescriptor::new("x", "a").validate(0).is_ok());
        assert_eq!(
            ListenerDescriptor::new("", "a").validate(3),
            Err(DescriptorError::MissingExtension {
                index: 3,
                library: "a".into()
            })
        );
        assert_eq!(
            ListenerDescriptor::new("x", " ").validate(1),
            Err(DescriptorError::MissingLibrary {
                index: 1,
                extension: "x".into()
            })
        );
    }
}
