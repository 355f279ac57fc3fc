//! Storage locations the persistence layer reads and writes.
//!
//! A location is a flat container of named entries. [`DirStorage`] maps it to
//! a filesystem directory, [`MemoryStorage`] keeps it in memory for tests,
//! and [`RedbStorage`] keeps several namespaced locations in one redb file.

mod dir;
mod memory;
mod redb;

use std::fmt;

use thiserror::Error;

pub use self::dir::DirStorage;
pub use self::memory::MemoryStorage;
pub use self::redb::RedbStorage;

/// Errors that can occur in storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage: invalid entry name {0:?}")]
    InvalidName(String),

    #[error("storage: {0}")]
    Backend(String),
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        Self::Backend(e.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A named-entry container.
///
/// Entry names are plain file names: non-empty, no `/`, `\` or NUL, and not
/// `.` or `..`. Implementations must be safe for concurrent use.
pub trait StorageLocation: Send + Sync {
    /// Creates the location if it does not exist yet.
    fn create(&self) -> StorageResult<()>;

    /// Names of all entries, sorted ascending. A location that does not
    /// exist has no entries.
    fn list(&self) -> StorageResult<Vec<String>>;

    /// Reads an entry; `None` if it does not exist.
    fn read(&self, name: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Writes an entry, replacing any previous content.
    fn write(&self, name: &str, data: &[u8]) -> StorageResult<()>;

    /// Removes an entry. No error if it does not exist.
    fn remove(&self, name: &str) -> StorageResult<()>;
}

impl fmt::Debug for dyn StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageLocation {{ ... }}")
    }
}

pub(crate) fn check_name(name: &str) -> StorageResult<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}
