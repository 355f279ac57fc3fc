//! Extractor for precomputed face embeddings.
//!
//! The CLI does no image processing itself: each corpus or probe file holds
//! the embedding an upstream model already produced for one face, either as
//! a JSON array of numbers (`.json`) or as raw little-endian f32 values (any
//! other extension).

use std::path::Path;

use giztoy_faceid::{DenseVector, ExtractError, FeatureExtractor};
use serde::{Deserialize, Serialize};

/// Persisted with the gallery as `dataset.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Expected vector length. Any length is accepted when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dim: Option<usize>,

    /// Scale every vector to unit L2 norm before indexing.
    #[serde(default)]
    pub normalize: bool,
}

#[derive(Debug, Clone)]
pub struct EmbeddingExtractor {
    config: EmbeddingConfig,
}

impl EmbeddingExtractor {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self { config }
    }

    fn read_values(path: &Path) -> Result<Vec<f32>, ExtractError> {
        let data = std::fs::read(path)
            .map_err(|e| ExtractError::InvalidInput(format!("{}: {e}", path.display())))?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            return serde_json::from_slice(&data)
                .map_err(|e| ExtractError::InvalidInput(format!("{}: {e}", path.display())));
        }

        if data.len() % 4 != 0 {
            return Err(ExtractError::InvalidInput(format!(
                "{}: {} bytes is not a whole number of f32 values",
                path.display(),
                data.len()
            )));
        }
        Ok(data
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }
}

impl FeatureExtractor for EmbeddingExtractor {
    type Image = Path;
    type Vector = DenseVector;
    type Config = EmbeddingConfig;

    fn extract(&self, image: &Path) -> Result<DenseVector, ExtractError> {
        let values = Self::read_values(image)?;
        if values.is_empty() {
            return Err(ExtractError::NoSubject);
        }
        if let Some(dim) = self.config.dim {
            if values.len() != dim {
                return Err(ExtractError::InvalidInput(format!(
                    "{}: expected {dim} values, got {}",
                    image.display(),
                    values.len()
                )));
            }
        }
        let vector = DenseVector::new(values)
            .map_err(|e| ExtractError::InvalidInput(format!("{}: {e}", image.display())))?;
        Ok(if self.config.normalize {
            vector.l2_normalized()
        } else {
            vector
        })
    }

    fn config(&self) -> EmbeddingConfig {
        self.config.clone()
    }

    fn from_config(config: EmbeddingConfig) -> Result<Self, ExtractError> {
        if config.dim == Some(0) {
            return Err(ExtractError::Model("dim must be positive".into()));
        }
        Ok(Self::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use giztoy_faceid::FeatureVector;
    use tempfile::tempdir;

    fn write_f32(path: &Path, values: &[f32]) {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_extract_json_and_raw() {
        let dir = tempdir().unwrap();
        let json = dir.path().join("alice.json");
        std::fs::write(&json, "[1.0, 2, -0.5]").unwrap();
        let raw = dir.path().join("bob.f32");
        write_f32(&raw, &[1.0, 2.0, -0.5]);

        let ex = EmbeddingExtractor::new(EmbeddingConfig {
            dim: Some(3),
            normalize: false,
        });
        let a = ex.extract(&json).unwrap();
        let b = ex.extract(&raw).unwrap();
        assert_eq!(a.as_slice(), &[1.0, 2.0, -0.5]);
        assert!(a.approx_eq(&b, 0.0));
    }

    #[test]
    fn test_extract_normalize() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("carol.json");
        std::fs::write(&path, "[3, 4]").unwrap();

        let ex = EmbeddingExtractor::new(EmbeddingConfig {
            dim: None,
            normalize: true,
        });
        let v = ex.extract(&path).unwrap();
        assert!((v.as_slice()[0] - 0.6).abs() < 1e-6);
        assert!((v.as_slice()[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_extract_errors() {
        let dir = tempdir().unwrap();
        let ex = EmbeddingExtractor::new(EmbeddingConfig {
            dim: Some(2),
            normalize: false,
        });

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, "[]").unwrap();
        assert!(matches!(ex.extract(&empty), Err(ExtractError::NoSubject)));

        let wrong = dir.path().join("wrong.json");
        std::fs::write(&wrong, "[1, 2, 3]").unwrap();
        assert!(matches!(ex.extract(&wrong), Err(ExtractError::InvalidInput(_))));

        let ragged = dir.path().join("ragged.bin");
        std::fs::write(&ragged, [0u8; 7]).unwrap();
        assert!(matches!(ex.extract(&ragged), Err(ExtractError::InvalidInput(_))));

        let missing = dir.path().join("missing.json");
        assert!(matches!(ex.extract(&missing), Err(ExtractError::InvalidInput(_))));
    }

    #[test]
    fn test_from_config() {
        assert!(
            EmbeddingExtractor::from_config(EmbeddingConfig {
                dim: Some(0),
                normalize: false
            })
            .is_err()
        );
        let ex = EmbeddingExtractor::from_config(EmbeddingConfig {
            dim: Some(8),
            normalize: true,
        })
        .unwrap();
        assert_eq!(ex.config().dim, Some(8));
    }
}
