//! Feature schemas for the two networks.
//!
//! Both vectors are fixed-length, every slot normalized into [0,1].
//!
//! ### Roll sequence (pattern recognizer input, P = 12)
//! - **values**: up to 12 face values of a 6-sided die, `(v - 1) / 5`, left-aligned;
//!   unused trailing slots are 0 and values beyond the 12th are dropped.
//!
//! ### Game state + history (move predictor input, M = 18)
//! Current state (9):
//! - round / max_rounds
//! - player_score / SCORE_NORM
//! - opponent_score / SCORE_NORM
//! - dice_remaining / max_dice
//! - time_remaining_ms / turn_time_limit_ms
//! - risk_level
//! - (board_advantage + 1) / 2
//! - (streak + STREAK_NORM) / (2 * STREAK_NORM), streak clamped to ±STREAK_NORM
//! - pressure_level
//!
//! History over the last HISTORY_WINDOW records (9):
//! - aggressive fraction, conservative fraction
//! - success rate
//! - mean risk level
//! - mean decision_time_ms / DECISION_TIME_NORM
//! - total history length / EXPERIENCE_NORM
//! - consistency: share of the most common action type
//! - adaptability: share of failures followed by a different action type
//! - pressure-response success rate
//!
//! Empty history encodes as nine zeros.

pub use kb_core::config::DEFAULT_LABEL_CONFIDENCE_GATE;

/// Increment this whenever either feature layout changes.
pub const FEATURE_SCHEMA_ID: u32 = 1;

/// Pattern recognizer input length.
pub const PATTERN_FEATURES: usize = 12;

/// Move predictor input length.
pub const MOVE_FEATURES: usize = 18;

/// Current-state features at the front of the move vector.
pub const STATE_FEATURES: usize = 9;

/// History features at the back of the move vector.
pub const HISTORY_FEATURES: usize = 9;

/// Number of most recent actions summarized by the history features.
pub const HISTORY_WINDOW: usize = 10;

/// Faces of the die the roll encoding is defined for.
pub const ENCODED_DIE_FACES: u8 = 6;

/// Normalization scale for scores. Knucklebones boards rarely exceed 150 points.
pub const SCORE_NORM: f64 = 200.0;

/// Streak magnitude mapped to the ends of [0,1].
pub const STREAK_NORM: f64 = 10.0;

/// Decision time mapped to 1.0.
pub const DECISION_TIME_NORM: f64 = 30_000.0;

/// History length mapped to 1.0.
pub const EXPERIENCE_NORM: f64 = 100.0;
