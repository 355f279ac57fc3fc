use std::borrow::Borrow;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use crate::error::{FaceIdError, Result};
use crate::extractor::FeatureExtractor;
use crate::persist;
use crate::query::{nearest, ResultSet};
use crate::storage::StorageLocation;
use crate::store::IdentityStore;

/// FaceModel ties an injected [`FeatureExtractor`] to the identity store it
/// trains and queries.
///
/// The store is published as an immutable snapshot. Training and loading
/// build a complete replacement off to the side and swap it in atomically,
/// so a concurrent query or save always sees either the old store or the
/// new one, never a mixture. Queries take no locks.
pub struct FaceModel<E: FeatureExtractor> {
    extractor: E,
    store: ArcSwap<IdentityStore<E::Vector>>,
}

impl<E: FeatureExtractor> FaceModel<E> {
    /// Creates a model with an empty store.
    pub fn new(extractor: E) -> Self {
        Self::with_store(extractor, IdentityStore::new())
    }

    /// Creates a model serving an existing store.
    pub fn with_store(extractor: E, store: IdentityStore<E::Vector>) -> Self {
        Self {
            extractor,
            store: ArcSwap::from_pointee(store),
        }
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// The currently published store.
    pub fn snapshot(&self) -> Arc<IdentityStore<E::Vector>> {
        self.store.load_full()
    }

    /// Number of enrolled identities in the current snapshot.
    pub fn len(&self) -> usize {
        self.store.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.load().is_empty()
    }

    /// Replaces the store with one trained from `corpus`.
    ///
    /// Replace-all: identities absent from `corpus` are dropped. On any
    /// extraction failure nothing is published and the previous store keeps
    /// serving. Returns the number of enrolled identities.
    pub fn train<I, L, B>(&self, corpus: I) -> Result<usize>
    where
        I: IntoIterator<Item = (L, B)>,
        L: Into<String>,
        B: Borrow<E::Image>,
    {
        let fresh = IdentityStore::build(corpus, &self.extractor)?;
        let n = fresh.len();
        self.store.store(Arc::new(fresh));
        info!(identities = n, "published trained store");
        Ok(n)
    }

    /// Extracts a probe from `image` and ranks the current store against it.
    ///
    /// `subject` is the identity the probe claims to be; extraction failures
    /// are reported under that label.
    pub fn query(&self, subject: &str, image: &E::Image, limit: Option<usize>) -> Result<ResultSet> {
        let probe = self
            .extractor
            .extract(image)
            .map_err(|source| FaceIdError::Extraction {
                label: subject.to_string(),
                source,
            })?;
        self.query_vector(subject, &probe, limit)
    }

    /// Ranks the current store against an already extracted probe.
    pub fn query_vector(
        &self,
        subject: &str,
        probe: &E::Vector,
        limit: Option<usize>,
    ) -> Result<ResultSet> {
        nearest(&self.store.load(), probe, subject, limit)
    }

    /// Persists the extractor configuration and the current snapshot.
    pub fn save(&self, location: &dyn StorageLocation) -> Result<()> {
        let snapshot = self.snapshot();
        persist::save(&snapshot, &self.extractor.config(), location)
    }

    /// Persists the current snapshot and removes vectors of identities it no
    /// longer holds, so the location mirrors this model after a retrain.
    pub fn save_clean(&self, location: &dyn StorageLocation) -> Result<()> {
        let snapshot = self.snapshot();
        persist::save_clean(&snapshot, &self.extractor.config(), location)
    }

    /// Rebuilds a model from `location`: the extractor from the persisted
    /// configuration, the store from the persisted vectors.
    pub fn load(location: &dyn StorageLocation) -> Result<Self> {
        let (config, store) = persist::load::<E::Vector, E::Config>(location)?;
        let extractor = E::from_config(config).map_err(|e| {
            FaceIdError::CorruptStore(format!("cannot rebuild extractor: {e}"))
        })?;
        Ok(Self::with_store(extractor, store))
    }

    /// Replaces the store with the vectors saved at `location`, keeping the
    /// current extractor. The persisted configuration must still decode as
    /// this extractor's configuration type.
    pub fn reload(&self, location: &dyn StorageLocation) -> Result<usize> {
        let (_, store) = persist::load::<E::Vector, E::Config>(location)?;
        let n = store.len();
        self.store.store(Arc::new(store));
        Ok(n)
    }
}
