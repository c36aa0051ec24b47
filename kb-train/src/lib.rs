//! kb-train: turns recorded sessions into trained models.
//!
//! - `dataset`: supervised examples from sessions
//! - `pipeline`: single-flight background training with copy-on-write publishing
//! - `store`: safetensors persistence of the model set

pub mod dataset;
pub mod models;
pub mod pipeline;
pub mod store;

pub use dataset::{build_training_set, TrainingSet};
pub use models::ModelSet;
pub use pipeline::{evaluate, TrainError, TrainOutcome, TrainReport, TrainingHandle, TrainingPipeline};
pub use store::{load, load_or_init, save, StoreError, MODEL_FORMAT};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod fixtures;
#[cfg(test)]
mod dataset_tests;
