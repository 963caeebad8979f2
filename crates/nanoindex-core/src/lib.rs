pub mod config;
pub mod distance;
pub mod error;

pub use config::{AgentAlgorithm, NanoIndexConfig};
pub use error::{NanoIndexError, Result};
