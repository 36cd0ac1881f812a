//! Configuration store implementations.
//!
//! Both stores keep a key-sorted map of JSON values, so the same content
//! always serializes to the same bytes.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use serde_json::Value;
use std::collections::BTreeMap;
use tidings_core::{ListenerDescriptor, StoreError};

type Entries = BTreeMap<String, Value>;

fn decode(entries: &Entries, key: &str) -> Result<Vec<ListenerDescriptor>, StoreError> {
    match entries.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => {
            serde_json::from_value(value.clone()).map_err(|source| StoreError::Malformed {
                key: key.to_owned(),
                source,
            })
        }
    }
}

fn encode(descriptors: Vec<ListenerDescriptor>) -> Result<Value, StoreError> {
    serde_json::to_value(descriptors).map_err(StoreError::Serialization)
}
