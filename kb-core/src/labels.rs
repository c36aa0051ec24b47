//! Ordered label sets shared by the feature encoder and the output decoders.
//!
//! The slot index of every label is its position in `ALL`. Both directions of the
//! codec go through `index()` / `from_index()`, so the positional meaning of a
//! network output lives in exactly one place.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pattern classes produced by the pattern recognizer (8 output slots).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Sequential,
    Pairs,
    Triples,
    Mixed,
    HighRisk,
    Conservative,
    Random,
    Unknown,
}

/// Number of pattern output slots.
pub const NUM_PATTERNS: usize = 8;

impl PatternType {
    pub const ALL: [PatternType; NUM_PATTERNS] = [
        PatternType::Sequential,
        PatternType::Pairs,
        PatternType::Triples,
        PatternType::Mixed,
        PatternType::HighRisk,
        PatternType::Conservative,
        PatternType::Random,
        PatternType::Unknown,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Sequential => "sequential",
            PatternType::Pairs => "pairs",
            PatternType::Triples => "triples",
            PatternType::Mixed => "mixed",
            PatternType::HighRisk => "high_risk",
            PatternType::Conservative => "conservative",
            PatternType::Random => "random",
            PatternType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate move classes produced by the move predictor (6 output slots).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    AggressiveRoll,
    ConservativeRoll,
    StrategicBlock,
    RiskTaking,
    DefensivePlay,
    RandomPlay,
}

/// Number of action output slots.
pub const NUM_ACTIONS: usize = 6;

impl ActionType {
    pub const ALL: [ActionType; NUM_ACTIONS] = [
        ActionType::AggressiveRoll,
        ActionType::ConservativeRoll,
        ActionType::StrategicBlock,
        ActionType::RiskTaking,
        ActionType::DefensivePlay,
        ActionType::RandomPlay,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::AggressiveRoll => "aggressive_roll",
            ActionType::ConservativeRoll => "conservative_roll",
            ActionType::StrategicBlock => "strategic_block",
            ActionType::RiskTaking => "risk_taking",
            ActionType::DefensivePlay => "defensive_play",
            ActionType::RandomPlay => "random_play",
        }
    }

    /// Aggressive moves for history statistics.
    pub fn is_aggressive(self) -> bool {
        matches!(self, ActionType::AggressiveRoll | ActionType::RiskTaking)
    }

    /// Conservative moves for history statistics.
    pub fn is_conservative(self) -> bool {
        matches!(
            self,
            ActionType::ConservativeRoll | ActionType::DefensivePlay
        )
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opponent difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.as_str() == s)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
