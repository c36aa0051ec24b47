//! kb-core: Knucklebones data model, label sets, difficulty tiers and configuration.

pub mod config;
pub mod labels;
pub mod rng;
pub mod session;

pub use config::{Config, ConfigError};
pub use labels::{ActionType, Difficulty, PatternType, NUM_ACTIONS, NUM_PATTERNS};
pub use rng::seeded_rng;
pub use session::{
    ActionOutcome, ActionRecord, DiceGroup, DiceGroupResult, GameSession, GameStateSnapshot,
    PlayerAction, Round,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
