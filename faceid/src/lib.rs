//! Identity index over face feature vectors.
//!
//! A probe image is matched against a library of labeled reference vectors:
//!
//! 1. [`FeatureExtractor::extract`]: image -> feature vector (external)
//! 2. [`IdentityStore`]: label -> reference vector, replaced wholesale by training
//! 3. [`nearest`]: exact brute-force ranking of every stored identity
//! 4. [`persist::save`] / [`persist::load`]: round-trip through a [`StorageLocation`]
//!
//! # Usage
//!
//! ```ignore
//! use giztoy_faceid::{DirStorage, FaceModel};
//!
//! let model = FaceModel::new(extractor);
//! model.train(corpus)?;
//! model.save(&DirStorage::new("gallery"))?;
//!
//! let results = model.query("alice", &probe_image, Some(5))?;
//! println!("{results}");
//! ```
//!
//! # On-disk layout
//!
//! ```text
//! dataset.json      extractor configuration (JSON)
//! manifest.json     entry names in store enumeration order
//! <label>.fvec      one serialized vector per identity
//! ```
//!
//! Labels are escaped into entry names by [`label::encode`], so any label
//! survives the round trip, including labels containing `.fvec`.

pub mod corpus;
mod error;
pub mod eval;
mod extractor;
pub mod label;
mod model;
pub mod persist;
mod query;
pub mod storage;
mod store;
mod vector;

pub use corpus::read_dir_corpus;
pub use error::{FaceIdError, Result};
pub use eval::{evaluate, Evaluation};
pub use extractor::{ExtractError, FeatureExtractor};
pub use model::FaceModel;
pub use query::{nearest, Match, ResultSet};
pub use storage::{DirStorage, MemoryStorage, RedbStorage, StorageError, StorageLocation};
pub use store::IdentityStore;
pub use vector::{DenseVector, FeatureVector};
