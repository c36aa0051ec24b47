//! kb-models: the two trained models and their result types.

pub mod analysis;
pub mod pattern;
pub mod predictor;

pub use analysis::{PatternAnalysis, PatternAnomaly, PatternTrend, TrendDirection, TREND_EPSILON};
pub use pattern::{DicePattern, PatternRecognizer, PATTERN_DIMS};
pub use predictor::{MLPrediction, MovePredictor, MOVE_DIMS};

use kb_features::CodecError;
use kb_nn::NnError;
use thiserror::Error;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("network: {0}")]
    Nn(#[from] NnError),
    #[error("codec: {0}")]
    Codec(#[from] CodecError),
}
