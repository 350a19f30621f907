//! Connection registry.
//!
//! Holds the saved named connection strings and the name of the active one.
//! Every call goes straight to storage; nothing is cached. Storage failures
//! never reach the caller: reads degrade to "empty registry" / "no active
//! connection" and failed writes are logged.

pub mod storage;

use crate::errors::AppError;
use crate::models::{ConnectionString, RegistrySnapshot};

pub use storage::{FileStorage, MemoryStorage, RegistryStorage};

/// Storage key of the saved connection list (a JSON array).
pub const CONNECTIONS_KEY: &str = "connection_strings";
/// Storage key of the active connection name (a plain string).
pub const ACTIVE_NAME_KEY: &str = "active_connection_string_name";

pub struct ConnectionRegistry {
    storage: Box<dyn RegistryStorage>,
}

impl ConnectionRegistry {
    pub fn new(storage: impl RegistryStorage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
        }
    }

    /// Registry over in-process storage.
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// Saved connections in storage order.
    pub fn list(&self) -> Vec<ConnectionString> {
        let raw = match self.storage.get_item(CONNECTIONS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read saved connections");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "saved connections are not valid JSON");
                Vec::new()
            }
        }
    }

    /// Looks up a saved connection by name.
    pub fn get(&self, name: &str) -> Option<ConnectionString> {
        self.list().into_iter().find(|entry| entry.name == name)
    }

    /// Replaces the entry with the same name in place, or appends it.
    pub fn upsert(&mut self, entry: ConnectionString) {
        let mut entries = self.list();
        match entries.iter_mut().find(|existing| existing.name == entry.name) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        self.save(&entries);
    }

    /// Deletes an entry, clearing the active name if it pointed at it.
    /// Returns whether an entry was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let mut entries = self.list();
        let before = entries.len();
        entries.retain(|entry| entry.name != name);
        let removed = entries.len() != before;
        if removed {
            self.save(&entries);
        }
        if self.get_active().as_deref() == Some(name) {
            self.clear_active();
        }
        removed
    }

    /// Sets the active name. No existence check is made here.
    pub fn set_active(&mut self, name: &str) {
        if let Err(e) = self.storage.set_item(ACTIVE_NAME_KEY, name) {
            tracing::warn!(name = %name, error = %e, "failed to save active connection name");
        }
    }

    pub fn clear_active(&mut self) {
        if let Err(e) = self.storage.remove_item(ACTIVE_NAME_KEY) {
            tracing::warn!(error = %e, "failed to clear active connection name");
        }
    }

    pub fn get_active(&self) -> Option<String> {
        match self.storage.get_item(ACTIVE_NAME_KEY) {
            Ok(name) => name.filter(|n| !n.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read active connection name");
                None
            }
        }
    }

    /// The saved entry the active name points at, if any.
    pub fn active_entry(&self) -> Option<ConnectionString> {
        self.snapshot().active_entry().cloned()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            connections: self.list(),
            active: self.get_active(),
        }
    }

    fn save(&self, entries: &[ConnectionString]) {
        let result = serde_json::to_string(entries)
            .map_err(AppError::from)
            .and_then(|raw| self.storage.set_item(CONNECTIONS_KEY, &raw));
        if let Err(e) = result {
            tracing::warn!(error = %e, count = entries.len(), "failed to save connections");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppResult;

    fn entry(name: &str, uri: &str) -> ConnectionString {
        ConnectionString::new(name, uri)
    }

    #[test]
    fn test_upsert_appends_then_replaces() {
        let mut registry = ConnectionRegistry::in_memory();
        registry.upsert(entry("A", "mysql://a/one"));
        registry.upsert(entry("B", "mysql://b/two"));
        registry.upsert(entry("A", "mysql://a/three"));

        let entries = registry.list();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], entry("A", "mysql://a/three"));
        assert_eq!(entries[1].name, "B");
        assert_eq!(entries.iter().filter(|e| e.name == "A").count(), 1);
    }

    #[test]
    fn test_remove_drops_entry() {
        let mut registry = ConnectionRegistry::in_memory();
        registry.upsert(entry("A", "mysql://a/one"));
        registry.upsert(entry("B", "mysql://b/two"));

        assert!(registry.remove("A"));
        assert!(!registry.remove("A"));
        assert!(registry.list().iter().all(|e| e.name != "A"));
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn test_removing_active_clears_it() {
        let mut registry = ConnectionRegistry::in_memory();
        registry.upsert(entry("A", "mysql://a/one"));
        registry.set_active("A");
        assert_eq!(registry.active_entry(), Some(entry("A", "mysql://a/one")));

        registry.remove("A");
        assert_eq!(registry.get_active(), None);
        assert_eq!(registry.active_entry(), None);
    }

    #[test]
    fn test_removing_other_entry_keeps_active() {
        let mut registry = ConnectionRegistry::in_memory();
        registry.upsert(entry("A", "mysql://a/one"));
        registry.upsert(entry("B", "mysql://b/two"));
        registry.set_active("A");

        registry.remove("B");
        assert_eq!(registry.get_active().as_deref(), Some("A"));
    }

    #[test]
    fn test_set_active_is_unconditional() {
        let mut registry = ConnectionRegistry::in_memory();
        registry.set_active("ghost");
        assert_eq!(registry.get_active().as_deref(), Some("ghost"));
        assert_eq!(registry.active_entry(), None);
    }

    #[test]
    fn test_corrupt_list_reads_as_empty() {
        let storage = MemoryStorage::new();
        storage.set_item(CONNECTIONS_KEY, "[{broken").unwrap();
        let registry = ConnectionRegistry::new(storage);
        assert!(registry.list().is_empty());
    }

    struct FailingStorage;

    impl RegistryStorage for FailingStorage {
        fn get_item(&self, _key: &str) -> AppResult<Option<String>> {
            Err(AppError::Storage("quota exceeded".into()))
        }

        fn set_item(&self, _key: &str, _value: &str) -> AppResult<()> {
            Err(AppError::Storage("quota exceeded".into()))
        }

        fn remove_item(&self, _key: &str) -> AppResult<()> {
            Err(AppError::Storage("quota exceeded".into()))
        }
    }

    #[test]
    fn test_storage_failures_degrade_to_empty_state() {
        let mut registry = ConnectionRegistry::new(FailingStorage);
        registry.upsert(entry("A", "mysql://a/one"));
        registry.set_active("A");
        assert!(registry.list().is_empty());
        assert_eq!(registry.get_active(), None);
        assert!(!registry.remove("A"));
    }

    #[test]
    fn test_file_backed_registry_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        {
            let mut registry = ConnectionRegistry::new(FileStorage::new(&path));
            registry.upsert(entry("local", "mysql://root@localhost/shop"));
            registry.set_active("local");
        }
        let registry = ConnectionRegistry::new(FileStorage::new(&path));
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.connections, vec![entry("local", "mysql://root@localhost/shop")]);
        assert_eq!(snapshot.active.as_deref(), Some("local"));
    }
}
