//! Labeled corpus enumeration.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Lists the labeled images of a corpus directory.
///
/// Every regular, non-hidden file directly inside `dir` is one image; its
/// label is the file name without the last extension (`alice.png` ->
/// `alice`). If `extensions` is non-empty only files with one of those
/// extensions (case-insensitive, without the dot) are listed. Results are
/// in file-name order so training is reproducible.
pub fn read_dir_corpus<P: AsRef<Path>>(dir: P, extensions: &[&str]) -> Result<Vec<(String, PathBuf)>> {
    let mut items = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if !extensions.is_empty() {
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)) {
                continue;
            }
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        items.push((stem.to_string(), path.clone()));
    }
    items.sort_by(|a, b| a.1.file_name().cmp(&b.1.file_name()));
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_dir_corpus() {
        let dir = tempdir().unwrap();
        for name in ["bob.json", "alice.json", "carol.f32", ".hidden.json", "notes.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("sub.json")).unwrap();

        let all = read_dir_corpus(dir.path(), &[]).unwrap();
        let labels: Vec<&str> = all.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, ["alice", "bob", "carol", "notes"]);

        let some = read_dir_corpus(dir.path(), &["JSON", "f32"]).unwrap();
        let labels: Vec<&str> = some.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, ["alice", "bob", "carol"]);
        assert_eq!(some[0].1, dir.path().join("alice.json"));
    }

    #[test]
    fn test_missing_dir() {
        let dir = tempdir().unwrap();
        assert!(read_dir_corpus(dir.path().join("nope"), &[]).is_err());
    }
}
