//! Rule-based pattern labels for recorded rolls.
//!
//! These labels are the training targets for the pattern recognizer and the ground
//! truth for its accuracy estimate. Rules are checked in order; the first match wins:
//!
//! 1. empty roll → `unknown`
//! 2. some face at least 3 times → `triples`
//! 3. a run of at least 3 consecutive distinct faces → `sequential`
//! 4. some face exactly twice → `pairs`
//! 5. outcome risk ≥ `HIGH_RISK_LEVEL` → `high_risk`
//! 6. outcome risk ≤ `CONSERVATIVE_LEVEL` → `conservative`
//! 7. all faces distinct and spread over at least `RANDOM_SPREAD` pips → `random`
//! 8. otherwise → `mixed`

use kb_core::{ActionOutcome, PatternType};

pub const HIGH_RISK_LEVEL: f64 = 0.7;
pub const CONSERVATIVE_LEVEL: f64 = 0.3;
pub const RANDOM_SPREAD: u8 = 4;
/// Minimum run length counted as `sequential`.
pub const SEQUENCE_RUN: usize = 3;

fn longest_run(values: &[u8]) -> usize {
    let mut faces: Vec<u8> = values.to_vec();
    faces.sort_unstable();
    faces.dedup();
    let mut best = 0usize;
    let mut cur = 0usize;
    for (i, &f) in faces.iter().enumerate() {
        cur = if i > 0 && faces[i - 1] as u16 + 1 == f as u16 {
            cur + 1
        } else {
            1
        };
        best = best.max(cur);
    }
    best
}

pub fn classify_roll(values: &[u8], outcome: Option<&ActionOutcome>) -> PatternType {
    if values.is_empty() {
        return PatternType::Unknown;
    }
    let mut counts = [0usize; 256];
    for &v in values {
        counts[v as usize] += 1;
    }
    let max_count = counts.iter().copied().max().unwrap_or(0);
    if max_count >= 3 {
        return PatternType::Triples;
    }
    if longest_run(values) >= SEQUENCE_RUN {
        return PatternType::Sequential;
    }
    if max_count == 2 {
        return PatternType::Pairs;
    }
    if let Some(o) = outcome {
        if o.risk_level >= HIGH_RISK_LEVEL {
            return PatternType::HighRisk;
        }
        if o.risk_level <= CONSERVATIVE_LEVEL {
            return PatternType::Conservative;
        }
    }
    // Only singletons remain here.
    let (lo, hi) = values
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if hi - lo >= RANDOM_SPREAD {
        PatternType::Random
    } else {
        PatternType::Mixed
    }
}
