//! kb-opponent: the difficulty-tiered AI opponent.
//!
//! For each legal dice type and count 1..=5 the engine computes an expected value
//! (mean total, pool synergy, and a per-tier risk term on the variance) and a tier
//! confidence, then plays the candidate maximizing `confidence × expected_value`.

pub mod delay;
pub mod engine;

pub use delay::{thinking_delay, THINKING_JITTER_MS};
pub use engine::{
    expected_value, select_best, AIDecision, Candidate, DecisionContext, DecisionError,
    OpponentDecisionEngine, MAX_DICE_PER_ROLL,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod engine_tests;
