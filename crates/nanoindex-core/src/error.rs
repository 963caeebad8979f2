use thiserror::Error;

/// Unified error type surfaced across the NanoIndex workspace.
///
/// Subsystem crates define their own narrower error enums and convert into
/// this one at their public boundary, so a caller holding a single
/// `NanoIndexError` never needs to know which crate raised it.
#[derive(Debug, Error)]
pub enum NanoIndexError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("storage is fatally broken and must be reopened: {0}")]
    StorageFatal(String),

    #[error("corrupt on-disk state: {0}")]
    CorruptState(String),
}

pub type Result<T> = std::result::Result<T, NanoIndexError>;
