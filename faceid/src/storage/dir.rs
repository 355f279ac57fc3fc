//! Filesystem directory storage location.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{check_name, StorageLocation, StorageResult};

/// Suffix of in-flight writes; renamed over the target once complete.
const TMP_SUFFIX: &str = ".tmp";

/// A location backed by one directory. Each entry is a regular file.
#[derive(Debug, Clone)]
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }
}

impl StorageLocation for DirStorage {
    fn create(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    fn list(&self) -> StorageResult<Vec<String>> {
        let rd = match fs::read_dir(&self.root) {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names = Vec::new();
        for entry in rd {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            // Non-UTF-8 names can't be entries we wrote.
            if let Ok(name) = entry.file_name().into_string() {
                if !name.ends_with(TMP_SUFFIX) {
                    names.push(name);
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn read(&self, name: &str) -> StorageResult<Option<Vec<u8>>> {
        check_name(name)?;
        match fs::read(self.root.join(name)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        check_name(name)?;
        let target = self.root.join(name);
        let tmp = self.root.join(format!("{name}{TMP_SUFFIX}"));
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }

    fn remove(&self, name: &str) -> StorageResult<()> {
        check_name(name)?;
        match fs::remove_file(self.root.join(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_dir_basic() {
        let dir = tempdir().unwrap();
        let loc = DirStorage::new(dir.path().join("gallery"));

        assert_eq!(loc.list().unwrap(), Vec::<String>::new());
        assert_eq!(loc.read("a").unwrap(), None);

        loc.create().unwrap();
        loc.create().unwrap();
        loc.write("b.fvec", b"2").unwrap();
        loc.write("a.fvec", b"1").unwrap();
        assert_eq!(loc.read("a.fvec").unwrap(), Some(b"1".to_vec()));
        assert_eq!(loc.list().unwrap(), ["a.fvec", "b.fvec"]);

        loc.remove("a.fvec").unwrap();
        loc.remove("a.fvec").unwrap();
        assert_eq!(loc.list().unwrap(), ["b.fvec"]);
    }

    #[test]
    fn test_dir_list_skips_subdirs_and_tmp() {
        let dir = tempdir().unwrap();
        let loc = DirStorage::new(dir.path());
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("x.fvec.tmp"), b"partial").unwrap();
        loc.write("x.fvec", b"done").unwrap();
        assert_eq!(loc.list().unwrap(), ["x.fvec"]);
    }

    #[test]
    fn test_dir_write_without_create_fails() {
        let dir = tempdir().unwrap();
        let loc = DirStorage::new(dir.path().join("missing"));
        assert!(loc.write("a", b"1").is_err());
    }
}
