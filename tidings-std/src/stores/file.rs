//! Configuration store persisted as a JSON file.

use super::{Entries, decode, encode};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};
use tidings_core::{ConfigurationStore, ListenerDescriptor, StoreError};

/// A configuration store persisted as one pretty-printed JSON document.
///
/// Keys are written in sorted order with a trailing newline; saving the same
/// content twice produces byte-identical files.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<Entries>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file opens as an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => Entries::new(),
            Ok(text) => serde_json::from_str(&text).map_err(StoreError::Serialization)?,
            Err(err) if err.kind() == ErrorKind::NotFound => Entries::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigurationStore for JsonFileStore {
    fn get_array(&self, key: &str) -> Result<Vec<ListenerDescriptor>, StoreError> {
        decode(&self.entries.read().unwrap_or_else(PoisonError::into_inner), key)
    }

    fn set(&self, key: &str, descriptors: Vec<ListenerDescriptor>) -> Result<(), StoreError> {
        let value = encode(descriptors)?;
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value);
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
        let mut text = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            serde_json::to_string_pretty(&*entries).map_err(StoreError::Serialization)?
        };
        text.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, text).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("listeners.json")).unwrap();
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn saved_content_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("listeners.json");

        let store = JsonFileStore::open(&path).unwrap();
        store
            .set(
                "event-app:start",
                vec![ListenerDescriptor::new("x", "a").with_data(json!({"n": 1}))],
            )
            .unwrap();
        store.save().unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        let descriptors = reopened.get_array("event-app:start").unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].data, json!({"n": 1}));
    }

    #[test]
    fn saving_twice_is_byte_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listeners.json");
        let store = JsonFileStore::open(&path).unwrap();
        store
            .set("event-b:b", vec![ListenerDescriptor::new("x", "b")])
            .unwrap();
        store
            .set("event-a:a", vec![ListenerDescriptor::new("x", "a")])
            .unwrap();

        store.save().unwrap();
        let first = fs::read(&path).unwrap();
        store.save().unwrap();
        let second = fs::read(&path).unwrap();

        assert_eq!(first, second);
        let text = String::from_utf8(first).unwrap();
        assert!(text.find("event-a:a").unwrap() < text.find("event-b:b").unwrap());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listeners.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(StoreError::Serialization(_))
        ));
    }
}
