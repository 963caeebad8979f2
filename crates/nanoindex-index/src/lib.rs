#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
mod ivf;
mod persistence;

pub use error::IndexError;
pub use ivf::{IVFIndex, ScoredRow, TrainParams};
