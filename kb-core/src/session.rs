//! Game history records supplied by the game engine.
//!
//! Everything here is read-only input to the learning core: sessions are produced
//! by the engine and never mutated by analysis or training.

use serde::{Deserialize, Serialize};

use crate::labels::ActionType;

/// One roll event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceGroupResult {
    /// Number of faces on the rolled dice.
    pub dice_type: u8,
    pub dice_count: u8,
    /// Face values in roll order.
    pub values: Vec<u8>,
    pub timestamp_ms: u64,
    pub player_id: String,
}

impl DiceGroupResult {
    pub fn total(&self) -> u32 {
        self.values.iter().map(|&v| v as u32).sum()
    }
}

/// Result of a resolved player action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    #[serde(default)]
    pub points: i32,
    /// Risk taken by the action, in [0,1].
    #[serde(default)]
    pub risk_level: f64,
}

/// Game-state view at the moment a move is chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameStateSnapshot {
    pub round: u32,
    pub max_rounds: u32,
    pub player_score: i32,
    pub opponent_score: i32,
    pub dice_remaining: u32,
    pub max_dice: u32,
    pub time_remaining_ms: u64,
    pub turn_time_limit_ms: u64,
    /// In [0,1].
    pub risk_level: f64,
    /// In [-1,1]; positive favors the player.
    pub board_advantage: f64,
    /// Signed win/loss streak.
    pub streak: i32,
    /// In [0,1].
    pub pressure_level: f64,
}

impl Default for GameStateSnapshot {
    fn default() -> Self {
        Self {
            round: 0,
            max_rounds: 10,
            player_score: 0,
            opponent_score: 0,
            dice_remaining: 0,
            max_dice: 9,
            time_remaining_ms: 0,
            turn_time_limit_ms: 30_000,
            risk_level: 0.0,
            board_advantage: 0.0,
            streak: 0,
            pressure_level: 0.0,
        }
    }
}

/// One action taken by a player inside a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAction {
    pub player_id: String,
    pub action_type: ActionType,
    #[serde(default)]
    pub dice_groups: Option<Vec<DiceGroupResult>>,
    #[serde(default)]
    pub outcome: Option<ActionOutcome>,
    #[serde(default)]
    pub state: Option<GameStateSnapshot>,
    #[serde(default)]
    pub decision_time_ms: u64,
    #[serde(default)]
    pub under_pressure: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub index: u32,
    pub actions: Vec<PlayerAction>,
}

/// An ordered sequence of rounds for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub id: String,
    pub started_at_ms: u64,
    pub rounds: Vec<Round>,
}

impl GameSession {
    /// All roll events in session order.
    pub fn dice_groups(&self) -> impl Iterator<Item = &DiceGroupResult> + '_ {
        self.rounds
            .iter()
            .flat_map(|r| r.actions.iter())
            .filter_map(|a| a.dice_groups.as_deref())
            .flatten()
    }
}

/// Compact history entry consumed by the move encoder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action_type: ActionType,
    pub success: bool,
    pub risk_level: f64,
    pub decision_time_ms: u64,
    pub under_pressure: bool,
}

impl From<&PlayerAction> for ActionRecord {
    fn from(a: &PlayerAction) -> Self {
        let (success, risk_level) = match &a.outcome {
            Some(o) => (o.success, o.risk_level),
            None => (false, 0.0),
        };
        Self {
            action_type: a.action_type,
            success,
            risk_level,
            decision_time_ms: a.decision_time_ms,
            under_pressure: a.under_pressure,
        }
    }
}

/// One entry of the current dice pool: `count` dice with `dice_type` faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceGroup {
    pub dice_type: u8,
    pub count: u8,
}
