//! Utility functions for CLI commands.

use giztoy_faceid::{DirStorage, FaceModel, RedbStorage, StorageLocation};

use crate::Cli;
use crate::config::{Backend, Config, DEFAULT_NAMESPACE, load_config};
use crate::extractor::EmbeddingExtractor;

/// Gets the configuration, from --config or the defaults.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    load_config(cli.config.as_deref())
}

/// Resolved gallery address, reported back in command output.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoreRef {
    pub path: String,
    pub backend: Backend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Resolves the gallery address from flags, falling back to the config file.
pub fn resolve_store(cli: &Cli, cfg: &Config) -> anyhow::Result<StoreRef> {
    let path = cli
        .store
        .clone()
        .or_else(|| cfg.storage.path.clone())
        .ok_or_else(|| anyhow::anyhow!("gallery location is required, use -s flag"))?;
    let backend = cli.backend.unwrap_or(cfg.storage.backend);
    let namespace = match backend {
        Backend::Dir => None,
        Backend::Redb => Some(
            cli.namespace
                .clone()
                .filter(|ns| !ns.is_empty())
                .unwrap_or_else(|| {
                    if cfg.storage.namespace.is_empty() {
                        DEFAULT_NAMESPACE.to_string()
                    } else {
                        cfg.storage.namespace.clone()
                    }
                }),
        ),
    };
    Ok(StoreRef {
        path,
        backend,
        namespace,
    })
}

/// Opens the storage location a [`StoreRef`] points at.
pub fn open_location(store: &StoreRef) -> anyhow::Result<Box<dyn StorageLocation>> {
    let location: Box<dyn StorageLocation> = match store.backend {
        Backend::Redb => {
            let ns = store.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE);
            Box::new(RedbStorage::open(&store.path, ns)?)
        }
        Backend::Dir => Box::new(DirStorage::new(&store.path)),
    };
    Ok(location)
}

/// Loads a saved gallery.
pub fn load_model(store: &StoreRef) -> anyhow::Result<FaceModel<EmbeddingExtractor>> {
    let location = open_location(store)?;
    let model = FaceModel::<EmbeddingExtractor>::load(&*location)?;
    tracing::debug!(path = %store.path, identities = model.len(), "gallery loaded");
    Ok(model)
}

/// Outputs result as JSON or YAML.
pub fn output_result<T: serde::Serialize>(
    result: &T,
    output_path: Option<&str>,
    as_json: bool,
) -> anyhow::Result<()> {
    let output = if as_json {
        serde_json::to_string_pretty(result)?
    } else {
        serde_yaml::to_string(result)?
    };

    match output_path {
        Some(path) => std::fs::write(path, output)?,
        None => print!("{}", output),
    }

    Ok(())
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

/// Prints warning message.
pub fn print_warning(msg: &str) {
    eprintln!("\x1b[33m⚠\x1b[0m {}", msg);
}
