pub mod error;
mod kmeans;

pub use error::ClusterError;
pub use kmeans::{train, KMeansConfig, KMeansResult};
