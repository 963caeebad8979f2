use nanoindex_core::NanoIndexError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("requested {k} clusters but only {n_sample} training rows are available")]
    TooFewSamples { k: usize, n_sample: usize },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("k must be greater than zero")]
    ZeroClusters,

    #[error("training exceeded its deadline")]
    Timeout,
}

impl From<ClusterError> for NanoIndexError {
    fn from(err: ClusterError) -> Self {
        match err {
            ClusterError::Timeout => NanoIndexError::Timeout(err.to_string()),
            _ => NanoIndexError::InvalidInput(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClusterError>;
