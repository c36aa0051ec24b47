//! Candidate enumeration, per-tier confidence and selection.

use std::collections::BTreeMap;

use kb_core::config::OpponentConfig;
use kb_core::{DiceGroup, DiceGroupResult, Difficulty};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest count considered for one roll.
pub const MAX_DICE_PER_ROLL: u8 = 5;
/// Rolls in the expert tier's rolling average.
pub const ROLLING_WINDOW: usize = 3;
/// Pool groups beyond which opening a new dice type is penalized (expert).
pub const COMPLEX_POOL_GROUPS: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecisionError {
    #[error("no legal dice types")]
    NoLegalDiceTypes,
    #[error("invalid dice type d{0}: needs at least 2 faces")]
    InvalidDiceType(u8),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AIDecision {
    pub dice_type: u8,
    pub dice_count: u8,
    /// In [0,1].
    pub confidence: f64,
    pub expected_value: f64,
    pub reasoning: String,
}

/// Everything the engine looks at for one decision. Borrowed, never mutated.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    pub difficulty: Difficulty,
    /// Roll history of the current game, oldest first, both players.
    pub history: &'a [DiceGroupResult],
    pub ai_player_id: &'a str,
    pub pool: &'a [DiceGroup],
    /// Dice types the AI may roll, in preference order for ties.
    pub legal_types: &'a [u8],
}

/// One scored `(dice_type, count)` option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub dice_type: u8,
    pub count: u8,
    pub expected_value: f64,
    pub confidence: f64,
}

impl Candidate {
    pub fn score(&self) -> f64 {
        self.confidence * self.expected_value
    }
}

pub fn die_mean(faces: u8) -> f64 {
    (faces as f64 + 1.0) / 2.0
}

pub fn die_variance(faces: u8) -> f64 {
    let f = faces as f64;
    (f * f - 1.0) / 12.0
}

/// `mean·count + synergy + k·variance` for rolling `count` dice of `faces` into `pool`.
pub fn expected_value(
    faces: u8,
    count: u8,
    pool: &[DiceGroup],
    risk_k: f64,
    tuning: &OpponentConfig,
) -> f64 {
    let same: u32 = pool
        .iter()
        .filter(|g| g.dice_type == faces)
        .map(|g| g.count as u32)
        .sum();
    let other_groups = pool.iter().filter(|g| g.dice_type != faces).count();
    let synergy =
        tuning.synergy_bonus * same as f64 - tuning.diversity_penalty * other_groups as f64;
    die_mean(faces) * count as f64 + synergy + risk_k * die_variance(faces)
}

/// What the engine can tell about the human from the roll history.
#[derive(Debug, Clone, Default, PartialEq)]
struct HumanProfile {
    /// Mean total of the last `recent_window` rolls.
    recent_avg: Option<f64>,
    /// Mean total of the last `ROLLING_WINDOW` rolls.
    rolling_avg: Option<f64>,
    /// Most-rolled dice type; ties keep the smaller type.
    favored_type: Option<u8>,
    /// Mean dice per roll over `MAX_DICE_PER_ROLL`.
    risk_tolerance: Option<f64>,
}

fn mean_total(rolls: &[&DiceGroupResult], window: usize) -> Option<f64> {
    let tail = &rolls[rolls.len().saturating_sub(window)..];
    if tail.is_empty() {
        return None;
    }
    Some(tail.iter().map(|g| g.total() as f64).sum::<f64>() / tail.len() as f64)
}

impl HumanProfile {
    fn observe(ctx: &DecisionContext<'_>, tuning: &OpponentConfig) -> Self {
        let rolls: Vec<&DiceGroupResult> = ctx
            .history
            .iter()
            .filter(|g| g.player_id != ctx.ai_player_id)
            .collect();
        if rolls.is_empty() {
            return Self::default();
        }

        let mut by_type: BTreeMap<u8, usize> = BTreeMap::new();
        for g in &rolls {
            *by_type.entry(g.dice_type).or_default() += 1;
        }
        let mut favored: Option<(u8, usize)> = None;
        for (&t, &n) in &by_type {
            if favored.map_or(true, |(_, best)| n > best) {
                favored = Some((t, n));
            }
        }

        let dice: f64 = rolls.iter().map(|g| g.dice_count as f64).sum();
        Self {
            recent_avg: mean_total(&rolls, tuning.recent_window),
            rolling_avg: mean_total(&rolls, ROLLING_WINDOW),
            favored_type: favored.map(|(t, _)| t),
            risk_tolerance: Some(dice / rolls.len() as f64 / MAX_DICE_PER_ROLL as f64),
        }
    }
}

/// Stateless decision maker; all behavior comes from the tuning table.
#[derive(Debug, Clone, Default)]
pub struct OpponentDecisionEngine {
    tuning: OpponentConfig,
}

impl OpponentDecisionEngine {
    pub fn new(tuning: OpponentConfig) -> Self {
        Self { tuning }
    }

    pub fn tuning(&self) -> &OpponentConfig {
        &self.tuning
    }

    /// Every legal `(type, count)` with its expected value and tier confidence, in
    /// enumeration order (types as supplied, counts ascending).
    pub fn candidates(&self, ctx: &DecisionContext<'_>) -> Result<Vec<Candidate>, DecisionError> {
        if ctx.legal_types.is_empty() {
            return Err(DecisionError::NoLegalDiceTypes);
        }
        if let Some(&bad) = ctx.legal_types.iter().find(|&&t| t < 2) {
            return Err(DecisionError::InvalidDiceType(bad));
        }

        let t = &self.tuning;
        let k = t.risk.for_difficulty(ctx.difficulty);
        let max_mean = ctx.legal_types.iter().map(|&f| die_mean(f)).fold(0.0, f64::max);
        let max_variance = ctx
            .legal_types
            .iter()
            .map(|&f| die_variance(f))
            .fold(0.0, f64::max);
        let human = HumanProfile::observe(ctx, t);

        let mut out = Vec::with_capacity(ctx.legal_types.len() * MAX_DICE_PER_ROLL as usize);
        for &faces in ctx.legal_types {
            for count in 1..=MAX_DICE_PER_ROLL {
                let ev = expected_value(faces, count, ctx.pool, k, t);
                let conf = match ctx.difficulty {
                    Difficulty::Easy => 0.5 + 0.4 * (1.0 - die_variance(faces) / max_variance),
                    Difficulty::Medium => self.medium_confidence(ev, max_mean, &human),
                    Difficulty::Hard => self.hard_confidence(ev, max_mean, faces, count, &human),
                    Difficulty::Expert => {
                        let mut c = self.hard_confidence(ev, max_mean, faces, count, &human);
                        if let Some(avg) = human.rolling_avg {
                            c += if ev > avg { t.rolling_bonus } else { -t.rolling_penalty };
                        }
                        let opens_group = ctx.pool.iter().all(|g| g.dice_type != faces);
                        if opens_group && ctx.pool.len() > COMPLEX_POOL_GROUPS {
                            c -= t.complexity_penalty;
                        }
                        c
                    }
                };
                out.push(Candidate {
                    dice_type: faces,
                    count,
                    expected_value: ev,
                    confidence: conf.clamp(0.0, 1.0),
                });
            }
        }
        Ok(out)
    }

    fn medium_confidence(&self, ev: f64, max_mean: f64, human: &HumanProfile) -> f64 {
        let ev_norm = ev / (max_mean * MAX_DICE_PER_ROLL as f64);
        let history_factor = match human.recent_avg {
            Some(avg) if avg > 0.0 => (ev / avg).min(2.0) / 2.0,
            _ => 0.5,
        };
        0.5 * ev_norm + 0.5 * history_factor
    }

    fn hard_confidence(
        &self,
        ev: f64,
        max_mean: f64,
        faces: u8,
        count: u8,
        human: &HumanProfile,
    ) -> f64 {
        let t = &self.tuning;
        let mut c = self.medium_confidence(ev, max_mean, human);
        if human.favored_type == Some(faces) {
            c -= t.favored_penalty;
        }
        if human
            .risk_tolerance
            .is_some_and(|r| r < t.low_risk_tolerance)
        {
            c += t.exploit_bonus * count as f64 / MAX_DICE_PER_ROLL as f64;
        }
        c
    }

    /// Pick the candidate with the highest `confidence × expected_value`.
    pub fn decide(&self, ctx: &DecisionContext<'_>) -> Result<AIDecision, DecisionError> {
        let candidates = self.candidates(ctx)?;
        let best = select_best(&candidates).ok_or(DecisionError::NoLegalDiceTypes)?;
        Ok(AIDecision {
            dice_type: best.dice_type,
            dice_count: best.count,
            confidence: best.confidence,
            expected_value: best.expected_value,
            reasoning: format!(
                "{} opponent rolls {}d{}: expected value {:.2}, confidence {:.2}",
                ctx.difficulty, best.count, best.dice_type, best.expected_value, best.confidence
            ),
        })
    }
}

/// Highest score wins; ties keep the earliest candidate.
pub fn select_best(candidates: &[Candidate]) -> Option<&Candidate> {
    let mut best: Option<&Candidate> = None;
    for c in candidates {
        match best {
            Some(b) if c.score() <= b.score() => {}
            _ => best = Some(c),
        }
    }
    best
}
