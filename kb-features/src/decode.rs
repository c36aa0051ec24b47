//! Decoding of network outputs back into domain labels, and one-hot training targets.

use kb_core::{ActionType, PatternType, NUM_ACTIONS, NUM_PATTERNS};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("invalid {what} output length: got {got}, expected {expected}")]
    Length {
        what: &'static str,
        got: usize,
        expected: usize,
    },
}

/// Arg-max pattern label with its output value.
///
/// Ties keep the lowest slot. If the maximum does not exceed `gate`, the label is
/// `Unknown` (the reported confidence is still the arg-max value).
pub fn decode_pattern_label(output: &[f64], gate: f64) -> Result<(PatternType, f64), CodecError> {
    if output.len() != NUM_PATTERNS {
        return Err(CodecError::Length {
            what: "pattern",
            got: output.len(),
            expected: NUM_PATTERNS,
        });
    }
    let mut best = 0usize;
    for (i, &v) in output.iter().enumerate().skip(1) {
        if v > output[best] {
            best = i;
        }
    }
    let confidence = output[best].clamp(0.0, 1.0);
    let label = if confidence > gate {
        PatternType::ALL[best]
    } else {
        PatternType::Unknown
    };
    Ok((label, confidence))
}

/// All six actions ranked by output value, highest first (stable for ties).
pub fn decode_action_label(output: &[f64]) -> Result<Vec<(ActionType, f64)>, CodecError> {
    if output.len() != NUM_ACTIONS {
        return Err(CodecError::Length {
            what: "action",
            got: output.len(),
            expected: NUM_ACTIONS,
        });
    }
    let mut ranked: Vec<(ActionType, f64)> = ActionType::ALL
        .iter()
        .copied()
        .zip(output.iter().copied())
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(ranked)
}

pub fn pattern_target(p: PatternType) -> [f64; NUM_PATTERNS] {
    let mut t = [0.0; NUM_PATTERNS];
    t[p.index()] = 1.0;
    t
}

pub fn action_target(a: ActionType) -> [f64; NUM_ACTIONS] {
    let mut t = [0.0; NUM_ACTIONS];
    t[a.index()] = 1.0;
    t
}
