pub mod arm;
mod agent;
pub mod error;
mod persistence;
pub mod stats;

pub use agent::AdaptiveAgent;
pub use arm::{ArmSpec, ARMS};
pub use stats::ArmStats;
