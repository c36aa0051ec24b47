//! Roll-sequence pattern recognizer (12→24→8).

use kb_core::PatternType;
use kb_features::schema::PATTERN_FEATURES;
use kb_features::{decode_pattern_label, encode_dice_sequence, DEFAULT_LABEL_CONFIDENCE_GATE};
use kb_nn::{FeedforwardNetwork, NetworkParameters};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ModelError;

pub const PATTERN_HIDDEN: usize = 24;
pub const PATTERN_OUTPUTS: usize = kb_core::NUM_PATTERNS;

/// Layer sizes of the pattern network.
pub const PATTERN_DIMS: (usize, usize, usize) = (PATTERN_FEATURES, PATTERN_HIDDEN, PATTERN_OUTPUTS);

/// A classified roll sequence. Created once per analysis, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DicePattern {
    /// Content id: derived from the values, so equal rolls share an id.
    pub id: String,
    pub pattern_type: PatternType,
    pub values: Vec<u8>,
    /// Decoded confidence, in [0,1].
    pub probability: f64,
}

pub(crate) fn pattern_id(values: &[u8]) -> String {
    let h = kb_logging::hash_bytes(values);
    format!("pat_{}", &h[..16])
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternRecognizer {
    net: FeedforwardNetwork,
    gate: f64,
}

impl PatternRecognizer {
    pub fn new<R: Rng + ?Sized>(learning_rate: f64, rng: &mut R) -> Result<Self, ModelError> {
        let (i, h, o) = PATTERN_DIMS;
        let net = FeedforwardNetwork::new(i, h, o, learning_rate, rng)?;
        Ok(Self {
            net,
            gate: DEFAULT_LABEL_CONFIDENCE_GATE,
        })
    }

    /// Rebuild from stored parameters; they must have the 12→24→8 shape.
    pub fn from_parameters(params: NetworkParameters, learning_rate: f64) -> Result<Self, ModelError> {
        let net = FeedforwardNetwork::from_parameters_with_dims(params, PATTERN_DIMS, learning_rate)?;
        Ok(Self {
            net,
            gate: DEFAULT_LABEL_CONFIDENCE_GATE,
        })
    }

    pub fn with_gate(mut self, gate: f64) -> Self {
        self.gate = gate;
        self
    }

    pub fn gate(&self) -> f64 {
        self.gate
    }

    pub fn network(&self) -> &FeedforwardNetwork {
        &self.net
    }

    pub fn network_mut(&mut self) -> &mut FeedforwardNetwork {
        &mut self.net
    }

    /// Decoded label and confidence for `values`, `Unknown` included.
    pub fn classify(&self, values: &[u8]) -> Result<(PatternType, f64), ModelError> {
        let x = encode_dice_sequence(values);
        let y = self.net.predict(&x)?;
        Ok(decode_pattern_label(&y, self.gate)?)
    }

    /// Classify one roll. `None` when the label is `unknown`.
    pub fn analyze_roll(&self, values: &[u8]) -> Result<Option<DicePattern>, ModelError> {
        let (pattern_type, probability) = self.classify(values)?;
        if pattern_type == PatternType::Unknown {
            return Ok(None);
        }
        Ok(Some(DicePattern {
            id: pattern_id(values),
            pattern_type,
            values: values.to_vec(),
            probability,
        }))
    }
}
