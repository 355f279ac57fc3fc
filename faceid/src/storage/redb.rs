//! Redb-backed storage location.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use super::{check_name, StorageError, StorageLocation, StorageResult};

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("faceid");

fn backend_err<E: ToString>(e: E) -> StorageError {
    StorageError::Backend(e.to_string())
}

/// A location stored as the `<namespace>/`-prefixed keys of one redb table.
///
/// Several galleries can live in a single database file; use
/// [`RedbStorage::namespace`] to address a sibling location.
#[derive(Clone)]
pub struct RedbStorage {
    db: Arc<Database>,
    prefix: String,
}

impl RedbStorage {
    /// Open or create the database at `path` and address `namespace` in it.
    pub fn open<P: AsRef<Path>>(path: P, namespace: &str) -> StorageResult<Self> {
        check_name(namespace)?;
        let db = Database::create(path).map_err(backend_err)?;

        // Create the table if it doesn't exist
        let tx = db.begin_write().map_err(backend_err)?;
        {
            let _ = tx.open_table(TABLE).map_err(backend_err)?;
        }
        tx.commit().map_err(backend_err)?;

        Ok(Self {
            db: Arc::new(db),
            prefix: format!("{namespace}/"),
        })
    }

    /// Returns another location in the same database file.
    pub fn namespace(&self, namespace: &str) -> StorageResult<Self> {
        check_name(namespace)?;
        Ok(Self {
            db: Arc::clone(&self.db),
            prefix: format!("{namespace}/"),
        })
    }

    fn key(&self, name: &str) -> StorageResult<String> {
        check_name(name)?;
        Ok(format!("{}{name}", self.prefix))
    }
}

impl StorageLocation for RedbStorage {
    fn create(&self) -> StorageResult<()> {
        Ok(())
    }

    fn list(&self) -> StorageResult<Vec<String>> {
        let tx = self.db.begin_read().map_err(backend_err)?;
        let table = tx.open_table(TABLE).map_err(backend_err)?;

        let mut names = Vec::new();
        for item in table.iter().map_err(backend_err)? {
            let (key, _) = item.map_err(backend_err)?;
            if let Some(name) = key.value().strip_prefix(self.prefix.as_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn read(&self, name: &str) -> StorageResult<Option<Vec<u8>>> {
        let key = self.key(name)?;
        let tx = self.db.begin_read().map_err(backend_err)?;
        let table = tx.open_table(TABLE).map_err(backend_err)?;

        match table.get(key.as_str()).map_err(backend_err)? {
            Some(value) => Ok(Some(value.value().to_vec())),
            None => Ok(None),
        }
    }

    fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        let key = self.key(name)?;
        let tx = self.db.begin_write().map_err(backend_err)?;
        {
            let mut table = tx.open_table(TABLE).map_err(backend_err)?;
            table.insert(key.as_str(), data).map_err(backend_err)?;
        }
        tx.commit().map_err(backend_err)?;
        Ok(())
    }

    fn remove(&self, name: &str) -> StorageResult<()> {
        let key = self.key(name)?;
        let tx = self.db.begin_write().map_err(backend_err)?;
        {
            let mut table = tx.open_table(TABLE).map_err(backend_err)?;
            table.remove(key.as_str()).map_err(backend_err)?;
        }
        tx.commit().map_err(backend_err)?;
        Ok(())
    }
}
