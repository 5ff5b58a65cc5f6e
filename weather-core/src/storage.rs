//! Durable string storage shared by the offline queue, recent searches and
//! the notification permission.

use std::{
    collections::HashMap,
    fmt::Debug,
    fs, io,
    path::PathBuf,
    sync::Mutex,
};

use serde::{Serialize, de::DeserializeOwned};

use crate::error::StorageError;

pub const RECENT_SEARCHES_KEY: &str = "recentSearches";
pub const QUEUE_KEY: &str = "weather-request-queue";
pub const NOTIFICATION_PERMISSION_KEY: &str = "notificationPermission";

pub trait KeyValueStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and decode a JSON value. Undecodable content reads as absent.
pub fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            tracing::warn!(key, error = %err, "discarding unreadable stored value");
            Ok(None)
        }
    }
}

pub fn set_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)
        .map_err(|source| StorageError::Serde { key: key.to_string(), source })?;
    store.set(key, &raw)
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn io_err(key: &str) -> impl FnOnce(io::Error) -> StorageError + '_ {
        move |source| StorageError::Io { key: key.to_string(), source }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Self::io_err(key)(err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(Self::io_err(key))?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(Self::io_err(key))?;
        fs::rename(&tmp, &path).map_err(Self::io_err(key))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Self::io_err(key)(err)),
        }
    }
}

/// Process-local store, used in tests and with `--ephemeral`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A panic while holding the lock cannot leave a half-written String.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.get(QUEUE_KEY).unwrap(), None);

        store.set(QUEUE_KEY, "[]").unwrap();
        assert_eq!(store.get(QUEUE_KEY).unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("nested").join("weather-request-queue.json").exists());

        store.remove(QUEUE_KEY).unwrap();
        assert_eq!(store.get(QUEUE_KEY).unwrap(), None);
    }

    #[test]
    fn removing_missing_key_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.remove("absent").is_ok());
    }

    #[test]
    fn file_store_overwrites_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.set(RECENT_SEARCHES_KEY, r#"["Oslo"]"#).unwrap();
        store.set(RECENT_SEARCHES_KEY, r#"["Tokyo","Oslo"]"#).unwrap();

        assert_eq!(store.get(RECENT_SEARCHES_KEY).unwrap().as_deref(), Some(r#"["Tokyo","Oslo"]"#));
        assert!(!dir.path().join("recentSearches.json.tmp").exists());
    }

    #[test]
    fn json_helpers_treat_garbage_as_absent() {
        let store = MemoryStore::new();
        store.set(RECENT_SEARCHES_KEY, "{not json").unwrap();

        let value: Option<Vec<String>> = get_json(&store, RECENT_SEARCHES_KEY).unwrap();
        assert!(value.is_none());

        set_json(&store, RECENT_SEARCHES_KEY, &["Oslo"]).unwrap();
        let value: Option<Vec<String>> = get_json(&store, RECENT_SEARCHES_KEY).unwrap();
        assert_eq!(value, Some(vec!["Oslo".to_string()]));
    }
}
