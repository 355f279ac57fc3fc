//! Persistence of an [`IdentityStore`] and its extractor configuration.
//!
//! Layout of a location:
//!
//! ```text
//! dataset.json    extractor configuration, pretty JSON
//! <entry>.fvec    one vector per identity, entry = label::encode(label)
//! manifest.json   {"version":1,"entries":[...]} in store enumeration order
//! ```
//!
//! The manifest is written last. `save` never deletes entries, so vectors
//! from an earlier save with different labels stay behind and are picked up
//! again by `load`. [`save_clean`] also removes them, leaving exactly the
//! saved store.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{FaceIdError, Result};
use crate::label;
use crate::storage::StorageLocation;
use crate::store::IdentityStore;
use crate::vector::FeatureVector;

/// Entry holding the extractor configuration.
pub const CONFIG_ENTRY: &str = "dataset.json";

/// Entry holding the enumeration order.
pub const MANIFEST_ENTRY: &str = "manifest.json";

const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    entries: Vec<String>,
}

/// Writes `config` and every vector of `store` to `location`.
///
/// Creates the location if needed and overwrites entries with the same
/// label. Stray entries from a previous, differently-labeled save are left
/// in place.
pub fn save<V, C>(store: &IdentityStore<V>, config: &C, location: &dyn StorageLocation) -> Result<()>
where
    V: FeatureVector,
    C: Serialize,
{
    let names: Vec<String> = store.labels().map(label::encode).collect();
    for (label, name) in store.labels().zip(&names) {
        if name.len() > label::MAX_ENTRY_LEN {
            return Err(FaceIdError::LabelTooLong {
                label: label.to_string(),
                len: name.len(),
                max: label::MAX_ENTRY_LEN,
            });
        }
    }

    location.create()?;

    let cfg = serde_json::to_vec_pretty(config)
        .map_err(|e| FaceIdError::InvalidFormat(format!("dataset config: {e}")))?;
    location.write(CONFIG_ENTRY, &cfg)?;

    let mut buf = Vec::new();
    for ((label, vector), name) in store.entries().zip(&names) {
        buf.clear();
        vector.write_to(&mut buf)?;
        location.write(name, &buf)?;
        debug!(label = %label, entry = %name, "saved vector");
    }

    let manifest = Manifest {
        version: MANIFEST_VERSION,
        entries: names,
    };
    let data = serde_json::to_vec(&manifest)
        .map_err(|e| FaceIdError::InvalidFormat(format!("manifest: {e}")))?;
    location.write(MANIFEST_ENTRY, &data)?;

    info!(identities = store.len(), "saved identity store");
    Ok(())
}

/// Like [`save`], then removes every vector entry the saved store does not
/// own, so a later [`load`] returns exactly `store`.
///
/// Stale entries are removed only after the new manifest is in place; an
/// interrupted call leaves them behind as strays.
pub fn save_clean<V, C>(store: &IdentityStore<V>, config: &C, location: &dyn StorageLocation) -> Result<()>
where
    V: FeatureVector,
    C: Serialize,
{
    save(store, config, location)?;

    let keep: HashSet<String> = store.labels().map(label::encode).collect();
    let mut removed = 0;
    for name in location.list()? {
        if label::is_vector_entry(&name) && !keep.contains(&name) {
            location.remove(&name)?;
            removed += 1;
        }
    }
    if removed > 0 {
        info!(removed, "removed stale vector entries");
    }
    Ok(())
}

/// Restores the extractor configuration and the store saved at `location`.
///
/// Fails with [`FaceIdError::CorruptStore`] if the configuration is missing
/// or unreadable, or the manifest is unreadable or names a missing entry.
/// Fails with [`FaceIdError::CorruptEntry`] if any vector does not decode.
/// Nothing partial is ever returned.
pub fn load<V, C>(location: &dyn StorageLocation) -> Result<(C, IdentityStore<V>)>
where
    V: FeatureVector,
    C: DeserializeOwned,
{
    let cfg = location
        .read(CONFIG_ENTRY)?
        .ok_or_else(|| FaceIdError::CorruptStore(format!("missing {CONFIG_ENTRY}")))?;
    let config: C = serde_json::from_slice(&cfg)
        .map_err(|e| FaceIdError::CorruptStore(format!("unreadable {CONFIG_ENTRY}: {e}")))?;

    let present: Vec<String> = location
        .list()?
        .into_iter()
        .filter(|name| label::is_vector_entry(name))
        .collect();

    let order = match location.read(MANIFEST_ENTRY)? {
        Some(data) => manifest_order(&data, present)?,
        None => present,
    };

    let mut store = IdentityStore::new();
    for name in order {
        // Names were filtered through is_vector_entry above.
        let Some(label) = label::decode(&name) else {
            continue;
        };
        let data = location.read(&name)?.ok_or_else(|| FaceIdError::CorruptEntry {
            label: label.clone(),
            reason: "entry disappeared during load".into(),
        })?;

        let mut rest = data.as_slice();
        let vector = V::read_from(&mut rest).map_err(|e| FaceIdError::CorruptEntry {
            label: label.clone(),
            reason: e.to_string(),
        })?;
        if !rest.is_empty() {
            return Err(FaceIdError::CorruptEntry {
                label,
                reason: format!("{} trailing bytes", rest.len()),
            });
        }
        debug!(label = %label, "loaded vector");
        store.insert(label, vector)?;
    }

    info!(identities = store.len(), "loaded identity store");
    Ok((config, store))
}

/// Orders `present` entries by the manifest, then appends entries the
/// manifest does not know about in name order.
fn manifest_order(data: &[u8], present: Vec<String>) -> Result<Vec<String>> {
    let manifest: Manifest = serde_json::from_slice(data)
        .map_err(|e| FaceIdError::CorruptStore(format!("unreadable {MANIFEST_ENTRY}: {e}")))?;
    if manifest.version != MANIFEST_VERSION {
        return Err(FaceIdError::CorruptStore(format!(
            "unsupported manifest version {} (want {MANIFEST_VERSION})",
            manifest.version
        )));
    }

    let available: HashSet<&str> = present.iter().map(String::as_str).collect();
    let mut seen = HashSet::with_capacity(manifest.entries.len());
    for name in &manifest.entries {
        if !label::is_vector_entry(name) {
            return Err(FaceIdError::CorruptStore(format!(
                "manifest lists invalid entry {name:?}"
            )));
        }
        if !available.contains(name.as_str()) {
            return Err(FaceIdError::CorruptStore(format!(
                "manifest lists missing entry {name:?}"
            )));
        }
        if !seen.insert(name.as_str()) {
            return Err(FaceIdError::CorruptStore(format!(
                "manifest lists entry {name:?} twice"
            )));
        }
    }

    let strays: Vec<String> = present
        .iter()
        .filter(|name| !seen.contains(name.as_str()))
        .cloned()
        .collect();
    if !strays.is_empty() {
        warn!(count = strays.len(), "loading entries not listed in manifest");
    }

    let mut order = manifest.entries;
    order.extend(strays);
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::vector::DenseVector;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Cfg {
        radius: u32,
        neighbors: u32,
    }

    const CFG: Cfg = Cfg {
        radius: 3,
        neighbors: 24,
    };

    fn v(values: &[f32]) -> DenseVector {
        DenseVector::new(values.to_vec()).unwrap()
    }

    fn sample() -> IdentityStore<DenseVector> {
        IdentityStore::from_entries([
            ("zoe", v(&[0.25, 1.0, -3.5])),
            ("adam", v(&[1.0, 2.0, 3.0])),
            ("bob.fvec", v(&[0.0, 0.0, 1e-7])),
            ("mia lee", v(&[9.0, 8.0, 7.0])),
        ])
        .unwrap()
    }

    fn load_dense(loc: &MemoryStorage) -> Result<(Cfg, IdentityStore<DenseVector>)> {
        load(loc)
    }

    #[test]
    fn test_round_trip() {
        let loc = MemoryStorage::new();
        let store = sample();
        save(&store, &CFG, &loc).unwrap();

        let (cfg, loaded) = load_dense(&loc).unwrap();
        assert_eq!(cfg, CFG);
        assert_eq!(loaded.len(), store.len());
        assert_eq!(
            loaded.labels().collect::<Vec<_>>(),
            store.labels().collect::<Vec<_>>()
        );
        for (label, vector) in store.entries() {
            assert!(loaded.get(label).unwrap().approx_eq(vector, 0.0), "{label}");
        }
    }

    #[test]
    fn test_layout() {
        let loc = MemoryStorage::new();
        save(&sample(), &CFG, &loc).unwrap();
        assert_eq!(
            loc.list().unwrap(),
            [
                "adam.fvec",
                "bob%2Efvec.fvec",
                "dataset.json",
                "manifest.json",
                "mia%20lee.fvec",
                "zoe.fvec",
            ]
        );
    }

    #[test]
    fn test_round_trip_empty() {
        let loc = MemoryStorage::new();
        save(&IdentityStore::<DenseVector>::new(), &CFG, &loc).unwrap();
        let (_, loaded) = load_dense(&loc).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_missing_config() {
        let loc = MemoryStorage::new();
        let err = load_dense(&loc).unwrap_err();
        assert!(matches!(err, FaceIdError::CorruptStore(_)), "got {err}");
    }

    #[test]
    fn test_unreadable_config() {
        let loc = MemoryStorage::new();
        save(&sample(), &CFG, &loc).unwrap();
        loc.write(CONFIG_ENTRY, b"{\"radius\":").unwrap();
        assert!(matches!(
            load_dense(&loc).unwrap_err(),
            FaceIdError::CorruptStore(_)
        ));
    }

    #[test]
    fn test_truncated_entry() {
        let loc = MemoryStorage::new();
        save(&sample(), &CFG, &loc).unwrap();
        let data = loc.read("adam.fvec").unwrap().unwrap();
        loc.write("adam.fvec", &data[..data.len() - 3]).unwrap();

        match load_dense(&loc).unwrap_err() {
            FaceIdError::CorruptEntry { label, .. } => assert_eq!(label, "adam"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_trailing_bytes() {
        let loc = MemoryStorage::new();
        save(&sample(), &CFG, &loc).unwrap();
        let mut data = loc.read("bob%2Efvec.fvec").unwrap().unwrap();
        data.push(0);
        loc.write("bob%2Efvec.fvec", &data).unwrap();

        match load_dense(&loc).unwrap_err() {
            FaceIdError::CorruptEntry { label, .. } => assert_eq!(label, "bob.fvec"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_stray_entries_are_loaded_after_manifest() {
        let loc = MemoryStorage::new();
        let old = IdentityStore::from_entries([("old", v(&[5.0, 5.0, 5.0]))]).unwrap();
        save(&old, &CFG, &loc).unwrap();
        save(&sample(), &CFG, &loc).unwrap();

        let (_, loaded) = load_dense(&loc).unwrap();
        assert_eq!(
            loaded.labels().collect::<Vec<_>>(),
            ["zoe", "adam", "bob.fvec", "mia lee", "old"]
        );
    }

    #[test]
    fn test_save_clean_drops_previous_labels() {
        let loc = MemoryStorage::new();
        save(&sample(), &CFG, &loc).unwrap();
        loc.write("notes.txt", b"keep me").unwrap();

        let next = IdentityStore::from_entries([("x", v(&[1.0, 2.0]))]).unwrap();
        save_clean(&next, &CFG, &loc).unwrap();

        let (_, loaded) = load_dense(&loc).unwrap();
        assert_eq!(loaded.labels().collect::<Vec<_>>(), ["x"]);
        assert_eq!(loaded.dim(), Some(2));
        assert!(loc.read("notes.txt").unwrap().is_some());
    }

    #[test]
    fn test_label_too_long_writes_nothing() {
        let loc = MemoryStorage::new();
        save(&sample(), &CFG, &loc).unwrap();
        let before = loc.list().unwrap();

        let long = "日".repeat(100);
        let store = IdentityStore::from_entries([
            ("ok", v(&[1.0, 2.0, 3.0])),
            (long.as_str(), v(&[4.0, 5.0, 6.0])),
        ])
        .unwrap();
        match save(&store, &CFG, &loc).unwrap_err() {
            FaceIdError::LabelTooLong { label: rejected, len, max } => {
                assert_eq!(rejected, long);
                assert_eq!(len, 305);
                assert_eq!(max, label::MAX_ENTRY_LEN);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(loc.list().unwrap(), before);
        assert_eq!(load_dense(&loc).unwrap().1.len(), 4);
    }

    #[test]
    fn test_no_manifest_uses_name_order() {
        let loc = MemoryStorage::new();
        save(&sample(), &CFG, &loc).unwrap();
        loc.remove(MANIFEST_ENTRY).unwrap();

        let (_, loaded) = load_dense(&loc).unwrap();
        assert_eq!(
            loaded.labels().collect::<Vec<_>>(),
            ["adam", "bob.fvec", "mia lee", "zoe"]
        );
    }

    #[test]
    fn test_manifest_missing_entry() {
        let loc = MemoryStorage::new();
        save(&sample(), &CFG, &loc).unwrap();
        loc.remove("zoe.fvec").unwrap();
        assert!(matches!(
            load_dense(&loc).unwrap_err(),
            FaceIdError::CorruptStore(_)
        ));
    }

    #[test]
    fn test_manifest_unreadable() {
        let loc = MemoryStorage::new();
        save(&sample(), &CFG, &loc).unwrap();
        loc.write(MANIFEST_ENTRY, b"[]").unwrap();
        assert!(matches!(
            load_dense(&loc).unwrap_err(),
            FaceIdError::CorruptStore(_)
        ));

        loc.write(MANIFEST_ENTRY, br#"{"version":2,"entries":[]}"#).unwrap();
        assert!(matches!(
            load_dense(&loc).unwrap_err(),
            FaceIdError::CorruptStore(_)
        ));
    }

    #[test]
    fn test_foreign_files_ignored() {
        let loc = MemoryStorage::new();
        save(&sample(), &CFG, &loc).unwrap();
        loc.write("README.txt", b"hello").unwrap();
        loc.write("x.npy", b"\x93NUMPY").unwrap();
        let (_, loaded) = load_dense(&loc).unwrap();
        assert_eq!(loaded.len(), 4);
    }
}
