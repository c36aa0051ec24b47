//! kb-features: Feature schema + canonical encoding/decoding for both networks.

pub mod decode;
pub mod encode;
pub mod label;
pub mod schema;

pub use decode::{
    action_target, decode_action_label, decode_pattern_label, pattern_target, CodecError,
};
pub use encode::{encode_dice_sequence, encode_game_state};
pub use label::classify_roll;
pub use schema::{
    DEFAULT_LABEL_CONFIDENCE_GATE, FEATURE_SCHEMA_ID, MOVE_FEATURES, PATTERN_FEATURES,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");


#[cfg(test)]
mod codec_tests;
