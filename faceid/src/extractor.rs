use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::vector::FeatureVector;

/// Errors reported by a [`FeatureExtractor`].
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No face (or other subject) was found in the input.
    #[error("no subject detected")]
    NoSubject,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("model error: {0}")]
    Model(String),
}

/// Turns one image into a feature vector.
///
/// Face detection, alignment, illumination normalization and the feature
/// transform all live behind this boundary. The index only sees the
/// resulting vectors and the extractor's configuration, which it persists
/// next to the vectors so the same extractor can be rebuilt on load.
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use.
pub trait FeatureExtractor: Send + Sync {
    /// Input accepted by [`FeatureExtractor::extract`] (a path, raw bytes, a
    /// decoded frame...).
    type Image: ?Sized;

    type Vector: FeatureVector;

    /// Everything needed to reproduce extraction (hyperparameters, fitted
    /// transforms). Persisted as JSON.
    type Config: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    /// Computes the feature vector for one image.
    fn extract(&self, image: &Self::Image) -> Result<Self::Vector, ExtractError>;

    /// Returns the configuration to persist alongside the vectors.
    fn config(&self) -> Self::Config;

    /// Rebuilds an extractor from a persisted configuration.
    fn from_config(config: Self::Config) -> Result<Self, ExtractError>
    where
        Self: Sized;
}
