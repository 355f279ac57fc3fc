use thiserror::Error;

use crate::extractor::ExtractError;
use crate::storage::StorageError;

/// Errors returned by faceid operations.
#[derive(Debug, Error)]
pub enum FaceIdError {
    /// Feature extraction failed for one corpus item or probe.
    /// The operation that hit it was aborted without applying anything.
    #[error("faceid: extraction failed for {label:?}: {source}")]
    Extraction {
        label: String,
        #[source]
        source: ExtractError,
    },

    #[error("faceid: identity {0:?} not found")]
    NotFound(String),

    /// The location is missing its configuration or manifest, or they
    /// cannot be decoded.
    #[error("faceid: corrupt store: {0}")]
    CorruptStore(String),

    /// A persisted vector failed to decode.
    #[error("faceid: corrupt entry {label:?}: {reason}")]
    CorruptEntry { label: String, reason: String },

    #[error("faceid: incompatible vector: dimension {got}, want {expected}")]
    IncompatibleVector { expected: usize, got: usize },

    /// The label's entry name exceeds [`crate::label::MAX_ENTRY_LEN`].
    #[error("faceid: label {label:?} needs a {len}-byte entry name (max {max})")]
    LabelTooLong { label: String, len: usize, max: usize },

    #[error("faceid: invalid format: {0}")]
    InvalidFormat(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("faceid: io: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for faceid operations.
pub type Result<T> = std::result::Result<T, FaceIdError>;
