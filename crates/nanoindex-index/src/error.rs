use nanoindex_core::NanoIndexError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("clustering failed during training: {0}")]
    Clustering(#[from] nanoindex_cluster::ClusterError),

    #[error("corrupt ivf snapshot: {0}")]
    CorruptSnapshot(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("search exceeded its deadline")]
    Timeout,
}

impl From<IndexError> for NanoIndexError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::DimensionMismatch { .. } => NanoIndexError::InvalidInput(err.to_string()),
            IndexError::Clustering(c) => c.into(),
            IndexError::CorruptSnapshot(msg) => NanoIndexError::CorruptState(msg),
            IndexError::Io(e) => NanoIndexError::StorageFatal(e.to_string()),
            IndexError::Timeout => NanoIndexError::Timeout(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
