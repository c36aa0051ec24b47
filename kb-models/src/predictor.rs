//! Next-move predictor (18→36→6).

use kb_core::{ActionRecord, ActionType, GameStateSnapshot};
use kb_features::schema::{HISTORY_WINDOW, MOVE_FEATURES};
use kb_features::{decode_action_label, encode_game_state};
use kb_nn::{FeedforwardNetwork, NetworkParameters};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ModelError;

pub const MOVE_HIDDEN: usize = 36;
pub const MOVE_OUTPUTS: usize = kb_core::NUM_ACTIONS;

/// Layer sizes of the move network.
pub const MOVE_DIMS: (usize, usize, usize) = (MOVE_FEATURES, MOVE_HIDDEN, MOVE_OUTPUTS);

/// Alternatives reported after the recommended action.
pub const MAX_ALTERNATIVES: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MLPrediction {
    /// All six actions with normalized probabilities, most likely first.
    pub ranking: Vec<(ActionType, f64)>,
    pub recommended_action: ActionType,
    pub confidence: f64,
    pub alternatives: Vec<(ActionType, f64)>,
    pub reasoning: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovePredictor {
    net: FeedforwardNetwork,
}

impl MovePredictor {
    pub fn new<R: Rng + ?Sized>(learning_rate: f64, rng: &mut R) -> Result<Self, ModelError> {
        let (i, h, o) = MOVE_DIMS;
        Ok(Self {
            net: FeedforwardNetwork::new(i, h, o, learning_rate, rng)?,
        })
    }

    /// Rebuild from stored parameters; they must have the 18→36→6 shape.
    pub fn from_parameters(params: NetworkParameters, learning_rate: f64) -> Result<Self, ModelError> {
        Ok(Self {
            net: FeedforwardNetwork::from_parameters_with_dims(params, MOVE_DIMS, learning_rate)?,
        })
    }

    pub fn network(&self) -> &FeedforwardNetwork {
        &self.net
    }

    pub fn network_mut(&mut self) -> &mut FeedforwardNetwork {
        &mut self.net
    }

    /// Predict the human's next action. Always yields a best action; the
    /// confidence is its share of the normalized output.
    pub fn predict_next_move(
        &self,
        state: &GameStateSnapshot,
        history: &[ActionRecord],
    ) -> Result<MLPrediction, ModelError> {
        let x = encode_game_state(state, history);
        let mut y = self.net.predict(&x)?;
        let total: f64 = y.iter().sum();
        // Sigmoid outputs are clamped away from zero, so `total` is positive.
        for p in &mut y {
            *p /= total;
        }
        let ranking = decode_action_label(&y)?;
        let (recommended_action, confidence) = ranking[0];
        let alternatives = ranking[1..=MAX_ALTERNATIVES].to_vec();
        let reasoning = format!(
            "predicted {} with {:.0}% probability; {}",
            recommended_action,
            confidence * 100.0,
            history_signal(history)
        );
        Ok(MLPrediction {
            ranking,
            recommended_action,
            confidence,
            alternatives,
            reasoning,
            timestamp: kb_logging::now_iso8601(),
        })
    }
}

/// The most pronounced trait of the recent history, as a short phrase.
fn history_signal(history: &[ActionRecord]) -> String {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let window = &history[start..];
    if window.is_empty() {
        return "no play history yet".to_string();
    }
    let n = window.len() as f64;
    let share = |f: fn(&ActionRecord) -> bool| window.iter().filter(|r| f(r)).count() as f64 / n;
    let signals = [
        ("aggressive", share(|r| r.action_type.is_aggressive())),
        ("conservative", share(|r| r.action_type.is_conservative())),
        ("successful", share(|r| r.success)),
    ];
    let mut best = signals[0];
    for s in &signals[1..] {
        if s.1 > best.1 {
            best = *s;
        }
    }
    format!(
        "{:.0}% of the last {} actions were {}",
        best.1 * 100.0,
        window.len(),
        best.0
    )
}
