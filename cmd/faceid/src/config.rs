//! CLI configuration file.
//!
//! ```yaml
//! extractor:
//!   dim: 512
//!   normalize: true
//! query:
//!   limit: 10
//!   k: 5
//! storage:
//!   backend: redb
//!   path: /var/lib/faceid/faces.redb
//!   namespace: office
//! ```
//!
//! Every section and field is optional; command-line flags win over the file.

use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::extractor::EmbeddingConfig;

/// Default redb namespace.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Where a gallery lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// One file per identity in a directory.
    #[default]
    Dir,
    /// A namespace inside a single redb database file.
    Redb,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub extractor: EmbeddingConfig,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Maximum matches printed by `query`. Unbounded when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Rank cutoff used by `eval`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: Backend,

    /// Gallery location used when --store is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

/// Loads the config file at `path`, or the defaults when no file is given.
pub fn load_config(path: Option<&str>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let content = std::fs::read_to_string(Path::new(path))
        .with_context(|| format!("read config {path}"))?;
    let cfg = serde_yaml::from_str(&content).with_context(|| format!("parse config {path}"))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let cfg: Config = serde_yaml::from_str(
            r#"
extractor:
  dim: 128
  normalize: true
query:
  limit: 3
  k: 5
storage:
  backend: redb
  path: faces.redb
  namespace: office
"#,
        )
        .unwrap();
        assert_eq!(cfg.extractor.dim, Some(128));
        assert!(cfg.extractor.normalize);
        assert_eq!(cfg.query.limit, Some(3));
        assert_eq!(cfg.query.k, Some(5));
        assert_eq!(cfg.storage.backend, Backend::Redb);
        assert_eq!(cfg.storage.path.as_deref(), Some("faces.redb"));
        assert_eq!(cfg.storage.namespace, "office");
    }

    #[test]
    fn test_parse_empty_sections() {
        let cfg: Config = serde_yaml::from_str("query: {}\n").unwrap();
        assert_eq!(cfg.extractor.dim, None);
        assert!(!cfg.extractor.normalize);
        assert_eq!(cfg.storage.backend, Backend::Dir);
        assert!(cfg.storage.namespace.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_config(Some("/nonexistent/faceid.yaml")).is_err());
        assert_eq!(load_config(None).unwrap().query.limit, None);
    }
}
