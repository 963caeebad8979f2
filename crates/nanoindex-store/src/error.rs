use nanoindex_core::NanoIndexError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("batch vectors/ids length mismatch: {n_vectors} vectors vs {n_ids} ids")]
    BatchLengthMismatch { n_vectors: usize, n_ids: usize },

    #[error("duplicate external id {0}")]
    DuplicateId(i64),

    #[error("external id {0} not found")]
    IdNotFound(i64),

    #[error("row {0} out of bounds")]
    RowOutOfBounds(usize),

    #[error("store is read-only after a prior fatal storage error")]
    ReadOnly,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt metadata sidecar: {0}")]
    CorruptMeta(String),
}

impl From<StoreError> for NanoIndexError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DimensionMismatch { .. } | StoreError::BatchLengthMismatch { .. } => {
                NanoIndexError::InvalidInput(err.to_string())
            }
            StoreError::DuplicateId(_) => NanoIndexError::Conflict(err.to_string()),
            StoreError::IdNotFound(_) | StoreError::RowOutOfBounds(_) => {
                NanoIndexError::NotFound(err.to_string())
            }
            StoreError::ReadOnly | StoreError::Io(_) => {
                NanoIndexError::StorageFatal(err.to_string())
            }
            StoreError::CorruptMeta(_) => NanoIndexError::CorruptState(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
