//! Supervised examples extracted from recorded sessions.

use kb_core::{ActionRecord, GameSession, GameStateSnapshot};
use kb_features::{action_target, classify_roll, encode_dice_sequence, encode_game_state, pattern_target};
use kb_nn::Example;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    /// (encoded roll, one-hot rule label).
    pub pattern: Vec<Example>,
    /// (encoded state + history at action i, one-hot type of action i+1).
    pub moves: Vec<Example>,
}

impl TrainingSet {
    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty() && self.moves.is_empty()
    }
}

pub fn build_training_set(sessions: &[GameSession]) -> TrainingSet {
    let mut set = TrainingSet::default();
    let default_state = GameStateSnapshot::default();

    for round in sessions.iter().flat_map(|s| &s.rounds) {
        for action in &round.actions {
            let (Some(groups), Some(outcome)) = (&action.dice_groups, &action.outcome) else {
                continue;
            };
            for g in groups {
                let label = classify_roll(&g.values, Some(outcome));
                set.pattern.push((
                    encode_dice_sequence(&g.values).to_vec(),
                    pattern_target(label).to_vec(),
                ));
            }
        }

        let records: Vec<ActionRecord> = round.actions.iter().map(ActionRecord::from).collect();
        for (i, pair) in round.actions.windows(2).enumerate() {
            let state = pair[0].state.as_ref().unwrap_or(&default_state);
            set.moves.push((
                encode_game_state(state, &records[..=i]).to_vec(),
                action_target(pair[1].action_type).to_vec(),
            ));
        }
    }
    set
}
