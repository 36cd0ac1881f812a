//! In-memory configuration store.

use super::{Entries, decode, encode};
use serde_json::Value;
use std::sync::{
    PoisonError, RwLock,
    atomic::{AtomicUsize, Ordering},
};
use tidings_core::{ConfigurationStore, ListenerDescriptor, StoreError};

/// A configuration store held in memory.
///
/// `save` only counts calls, which lets tests observe whether a reload
/// wrote anything.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<Entries>,
    saves: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a descriptor array.
    ///
    /// Descriptor fields are strings, booleans, integers and JSON values, so
    /// encoding them cannot fail; if it ever did, the key would read back as
    /// [`StoreError::Malformed`]. [`try_with`](Self::try_with) reports the
    /// failure directly.
    pub fn with(self, key: &str, descriptors: Vec<ListenerDescriptor>) -> Self {
        let value = encode(descriptors).unwrap_or_else(|err| Value::String(err.to_string()));
        self.insert_raw(key, value);
        self
    }

    /// Builder-style insert that reports encoding failures.
    pub fn try_with(
        self,
        key: &str,
        descriptors: Vec<ListenerDescriptor>,
    ) -> Result<Self, StoreError> {
        self.insert_raw(key, encode(descriptors)?);
        Ok(self)
    }

    /// Store an arbitrary JSON value under `key`.
    pub fn insert_raw(&self, key: &str, value: Value) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value);
    }

    /// The raw JSON value under `key`.
    pub fn raw(&self, key: &str) -> Option<Value> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// The whole store as one JSON document.
    pub fn snapshot(&self) -> Value {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Value::Object(entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl ConfigurationStore for MemoryStore {
    fn get_array(&self, key: &str) -> Result<Vec<ListenerDescriptor>, StoreError> {
        decode(&self.entries.read().unwrap_or_else(PoisonError::into_inner), key)
    }

    fn set(&self, key: &str, descriptors: Vec<ListenerDescriptor>) -> Result<(), StoreError> {
        let value = encode(descriptors)?;
        self.insert_raw(key, value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect())
    }

    fn save(&self) -> Result<(), StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
