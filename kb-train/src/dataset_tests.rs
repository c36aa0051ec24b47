use kb_core::{ActionRecord, ActionType, GameStateSnapshot, PatternType};
use kb_features::{action_target, encode_dice_sequence, encode_game_state, pattern_target};

use crate::build_training_set;
use crate::fixtures::{opening_state, session, sessions};

#[test]
fn resolved_rolls_become_pattern_examples() {
    let set = build_training_set(&[session("a", 0)]);
    // The third action has no outcome and is skipped.
    assert_eq!(set.pattern.len(), 2);
    assert_eq!(set.pattern[0].0, encode_dice_sequence(&[2, 3, 4]).to_vec());
    assert_eq!(set.pattern[0].1, pattern_target(PatternType::Sequential).to_vec());
    assert_eq!(set.pattern[1].1, pattern_target(PatternType::Pairs).to_vec());
}

#[test]
fn move_examples_pair_each_action_with_the_next() {
    let s = session("a", 0);
    let actions = &s.rounds[0].actions;
    let records: Vec<ActionRecord> = actions.iter().map(ActionRecord::from).collect();

    let set = build_training_set(&[s.clone()]);
    assert_eq!(set.moves.len(), 2);

    assert_eq!(set.moves[0].0, encode_game_state(&opening_state(), &records[..1]).to_vec());
    assert_eq!(set.moves[0].1, action_target(ActionType::ConservativeRoll).to_vec());

    // No snapshot on the second action: the default state stands in.
    assert_eq!(
        set.moves[1].0,
        encode_game_state(&GameStateSnapshot::default(), &records[..2]).to_vec()
    );
    assert_eq!(set.moves[1].1, action_target(ActionType::RiskTaking).to_vec());
}

#[test]
fn single_action_rounds_yield_no_move_examples() {
    let mut s = session("a", 0);
    s.rounds[0].actions.truncate(1);
    let set = build_training_set(&[s]);
    assert_eq!(set.pattern.len(), 1);
    assert!(set.moves.is_empty());
}

#[test]
fn examples_accumulate_across_sessions() {
    let set = build_training_set(&sessions(3));
    assert_eq!(set.pattern.len(), 6);
    assert_eq!(set.moves.len(), 6);
    assert!(build_training_set(&[]).is_empty());
}
