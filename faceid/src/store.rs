use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info};

use crate::error::{FaceIdError, Result};
use crate::extractor::FeatureExtractor;
use crate::vector::FeatureVector;

/// IdentityStore maps each enrolled identity label to exactly one reference
/// vector.
///
/// Enumeration order is the order in which labels were first inserted; a
/// later insert of an existing label replaces its vector in place. That
/// order is what [`crate::nearest`] uses to break distance ties.
///
/// Contents are only ever replaced wholesale: [`IdentityStore::train`]
/// discards everything previously held, it never merges.
#[derive(Clone)]
pub struct IdentityStore<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> Default for IdentityStore<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V: FeatureVector> IdentityStore<V> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from `(label, vector)` pairs, in order.
    /// Repeated labels overwrite earlier ones.
    pub fn from_entries<I, L>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (L, V)>,
        L: Into<String>,
    {
        let mut store = Self::new();
        for (label, vector) in entries {
            store.insert(label.into(), vector)?;
        }
        Ok(store)
    }

    /// Extracts a vector for every `(label, image)` pair of `corpus` and
    /// builds a fresh store from them.
    ///
    /// Fail-fast: the first extraction failure aborts the whole pass with
    /// [`FaceIdError::Extraction`]; a partially trained store is never
    /// returned.
    pub fn build<E, I, L, B>(corpus: I, extractor: &E) -> Result<Self>
    where
        E: FeatureExtractor<Vector = V>,
        I: IntoIterator<Item = (L, B)>,
        L: Into<String>,
        B: Borrow<E::Image>,
    {
        let mut store = Self::new();
        for (label, image) in corpus {
            let label = label.into();
            let vector = extractor
                .extract(image.borrow())
                .map_err(|source| FaceIdError::Extraction {
                    label: label.clone(),
                    source,
                })?;
            debug!(label = %label, dim = vector.dim(), "extracted reference vector");
            store.insert(label, vector)?;
        }
        Ok(store)
    }

    /// Replaces the entire contents with vectors extracted from `corpus`.
    ///
    /// Training is replace-all, never merge: labels from a previous pass that
    /// are absent from `corpus` are gone afterwards. The new contents are
    /// built off to the side, so on error `self` keeps its previous contents
    /// untouched. Returns the new size.
    pub fn train<E, I, L, B>(&mut self, corpus: I, extractor: &E) -> Result<usize>
    where
        E: FeatureExtractor<Vector = V>,
        I: IntoIterator<Item = (L, B)>,
        L: Into<String>,
        B: Borrow<E::Image>,
    {
        *self = Self::build(corpus, extractor)?;
        info!(identities = self.len(), "trained identity store");
        Ok(self.len())
    }

    /// Inserts or replaces the vector for `label`.
    ///
    /// Rejects a vector whose dim differs from the vectors already stored.
    pub(crate) fn insert(&mut self, label: String, vector: V) -> Result<()> {
        if let Some(want) = self.dim() {
            if vector.dim() != want {
                return Err(FaceIdError::IncompatibleVector {
                    expected: want,
                    got: vector.dim(),
                });
            }
        }
        match self.index.get(&label) {
            Some(&i) => self.entries[i].1 = vector,
            None => {
                self.index.insert(label.clone(), self.entries.len());
                self.entries.push((label, vector));
            }
        }
        Ok(())
    }

    /// Returns the reference vector for `label`.
    pub fn get(&self, label: &str) -> Result<&V> {
        self.index
            .get(label)
            .map(|&i| &self.entries[i].1)
            .ok_or_else(|| FaceIdError::NotFound(label.to_string()))
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// All `(label, vector)` pairs in enumeration order.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = (&str, &V)> + '_ {
        self.entries.iter().map(|(l, v)| (l.as_str(), v))
    }

    /// All labels in enumeration order.
    pub fn labels(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    /// Number of enrolled identities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shared vector dim, or `None` for an empty store.
    pub fn dim(&self) -> Option<usize> {
        self.entries.first().map(|(_, v)| v.dim())
    }
}

impl<V> fmt::Debug for IdentityStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityStore")
            .field("len", &self.entries.len())
            .finish()
    }
}
