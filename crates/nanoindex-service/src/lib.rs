mod service;
mod types;

pub use nanoindex_core::{NanoIndexConfig, NanoIndexError, Result};
pub use service::SearchService;
pub use types::{AddOutcome, SearchHit, SearchOutcome, TrainOutcome};
