use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use keyring::Entry;
use tracing::debug;

use super::{KeyValueStore, StorageError};

const SERVICE_NAME: &str = "carecue";

/// Key-value storage in the OS keychain, one keychain entry per key.
///
/// Keeps the auth token out of plain files on shared machines. Entries are
/// opened once per key and reused for every later read and write.
pub struct KeyringStore {
    service: String,
    entries: RefCell<HashMap<String, Entry>>,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Use a separate keychain namespace, e.g. one per backend.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            entries: RefCell::new(HashMap::new()),
        }
    }

    fn with_entry<T>(
        &self,
        key: &str,
        f: impl FnOnce(&Entry) -> keyring::Result<T>,
    ) -> Result<keyring::Result<T>, StorageError> {
        let mut entries = self.entries.borrow_mut();
        if !entries.contains_key(key) {
            let entry = Entry::new(&self.service, key)?;
            entries.insert(key.to_string(), entry);
        }
        Ok(f(&entries[key]))
    }
}

impl fmt::Debug for KeyringStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyringStore")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.with_entry(key, Entry::get_password)? {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_entry(key, |entry| entry.set_password(value))??;
        debug!(service = %self.service, key, "Keychain entry stored");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match self.with_entry(key, Entry::delete_credential)? {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_store(service: &str) -> KeyringStore {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        KeyringStore::with_service(service)
    }

    #[test]
    fn test_set_get_remove() {
        let mut store = mock_store("carecue-test-roundtrip");
        assert_eq!(store.get("token").unwrap(), None);

        store.set("token", "T1").unwrap();
        store.set("user_details", r#"{"username":"a"}"#).unwrap();
        assert_eq!(store.get("token").unwrap().as_deref(), Some("T1"));

        store.set("token", "T2").unwrap();
        assert_eq!(store.get("token").unwrap().as_deref(), Some("T2"));

        store.remove("token").unwrap();
        assert_eq!(store.get("token").unwrap(), None);
        assert_eq!(
            store.get("user_details").unwrap().as_deref(),
            Some(r#"{"username":"a"}"#)
        );
    }

    #[test]
    fn test_remove_missing_entry_is_ok() {
        let mut store = mock_store("carecue-test-missing");
        store.remove("never-set").unwrap();
        store.remove("never-set").unwrap();
        assert_eq!(store.get("never-set").unwrap(), None);
    }
}
