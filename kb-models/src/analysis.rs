//! Batch pattern analysis over recorded sessions.

use std::collections::BTreeMap;

use kb_core::config::DEFAULT_ANOMALY_DEVIATION_GATE;
use kb_core::{GameSession, PatternType};
use serde::{Deserialize, Serialize};

use crate::pattern::{pattern_id, DicePattern, PatternRecognizer};
use crate::ModelError;

/// Share difference below which a label's trend counts as stable.
pub const TREND_EPSILON: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternTrend {
    pub pattern_type: PatternType,
    /// Share among the most recent half of the analyzed rolls.
    pub recent_share: f64,
    /// Share among all analyzed rolls.
    pub overall_share: f64,
    pub direction: TrendDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAnomaly {
    pub id: String,
    pub pattern_type: PatternType,
    pub values: Vec<u8>,
    pub confidence: f64,
    /// |confidence - mean confidence|.
    pub deviation: f64,
}

/// Result of analyzing a batch of sessions.
///
/// `frequencies` is a count per label over every analyzed roll (its values sum to
/// `rolls_analyzed`), not a probability distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAnalysis {
    pub patterns: Vec<DicePattern>,
    pub frequencies: BTreeMap<PatternType, usize>,
    pub trends: Vec<PatternTrend>,
    pub anomalies: Vec<PatternAnomaly>,
    /// Mean decoded confidence, 0 when nothing was analyzed.
    pub confidence: f64,
    pub rolls_analyzed: usize,
    pub timestamp: String,
}

struct Classified<'a> {
    values: &'a [u8],
    label: PatternType,
    confidence: f64,
}

fn share(items: &[Classified<'_>], label: PatternType) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    items.iter().filter(|c| c.label == label).count() as f64 / items.len() as f64
}

impl PatternRecognizer {
    /// Analyze every roll of `sessions` with the default anomaly gate.
    pub fn analyze_history(&self, sessions: &[GameSession]) -> Result<PatternAnalysis, ModelError> {
        self.analyze_history_with(sessions, DEFAULT_ANOMALY_DEVIATION_GATE)
    }

    /// Analyze every roll of `sessions`, in session order.
    pub fn analyze_history_with(
        &self,
        sessions: &[GameSession],
        anomaly_gate: f64,
    ) -> Result<PatternAnalysis, ModelError> {
        let mut classified = Vec::new();
        for g in sessions.iter().flat_map(|s| s.dice_groups()) {
            let (label, confidence) = self.classify(&g.values)?;
            classified.push(Classified {
                values: &g.values,
                label,
                confidence,
            });
        }

        let n = classified.len();
        let mut frequencies = BTreeMap::new();
        for c in &classified {
            *frequencies.entry(c.label).or_insert(0usize) += 1;
        }

        let patterns = classified
            .iter()
            .filter(|c| c.label != PatternType::Unknown)
            .map(|c| DicePattern {
                id: pattern_id(c.values),
                pattern_type: c.label,
                values: c.values.to_vec(),
                probability: c.confidence,
            })
            .collect();

        let recent = &classified[n / 2..];
        let trends = frequencies
            .keys()
            .map(|&label| {
                let overall_share = share(&classified, label);
                let recent_share = share(recent, label);
                let d = recent_share - overall_share;
                let direction = if d > TREND_EPSILON {
                    TrendDirection::Rising
                } else if d < -TREND_EPSILON {
                    TrendDirection::Falling
                } else {
                    TrendDirection::Stable
                };
                PatternTrend {
                    pattern_type: label,
                    recent_share,
                    overall_share,
                    direction,
                }
            })
            .collect();

        let confidence = if n == 0 {
            0.0
        } else {
            classified.iter().map(|c| c.confidence).sum::<f64>() / n as f64
        };

        let anomalies = classified
            .iter()
            .filter_map(|c| {
                let deviation = (c.confidence - confidence).abs();
                (deviation > anomaly_gate).then(|| PatternAnomaly {
                    id: pattern_id(c.values),
                    pattern_type: c.label,
                    values: c.values.to_vec(),
                    confidence: c.confidence,
                    deviation,
                })
            })
            .collect();

        Ok(PatternAnalysis {
            patterns,
            frequencies,
            trends,
            anomalies,
            confidence,
            rolls_analyzed: n,
            timestamp: kb_logging::now_iso8601(),
        })
    }
}
