//! In-memory storage location for testing.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::{check_name, StorageError, StorageLocation, StorageResult};

/// An in-memory location backed by a BTreeMap.
///
/// Clones share the same entries, so a test can hand one clone to `save`
/// and inspect or corrupt entries through another.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    /// Create a new empty location.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageLocation for MemoryStorage {
    fn create(&self) -> StorageResult<()> {
        Ok(())
    }

    fn list(&self) -> StorageResult<Vec<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(entries.keys().cloned().collect())
    }

    fn read(&self, name: &str) -> StorageResult<Option<Vec<u8>>> {
        check_name(name)?;
        let entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(entries.get(name).cloned())
    }

    fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        check_name(name)?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        entries.insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn remove(&self, name: &str) -> StorageResult<()> {
        check_name(name)?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        entries.remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let loc = MemoryStorage::new();
        loc.create().unwrap();

        loc.write("b", b"2").unwrap();
        loc.write("a", b"1").unwrap();
        assert_eq!(loc.read("a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(loc.read("missing").unwrap(), None);
        assert_eq!(loc.list().unwrap(), ["a", "b"]);

        loc.write("a", b"3").unwrap();
        assert_eq!(loc.read("a").unwrap(), Some(b"3".to_vec()));

        loc.remove("a").unwrap();
        loc.remove("a").unwrap();
        assert_eq!(loc.list().unwrap(), ["b"]);
    }

    #[test]
    fn test_clones_share_entries() {
        let loc = MemoryStorage::new();
        let other = loc.clone();
        loc.write("x", b"1").unwrap();
        assert_eq!(other.read("x").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn test_invalid_name() {
        let loc = MemoryStorage::new();
        assert!(matches!(
            loc.write("../x", b""),
            Err(StorageError::InvalidName(_))
        ));
    }
}
