use kb_core::{ActionOutcome, ActionRecord, ActionType, GameStateSnapshot, PatternType};

use crate::schema::{HISTORY_FEATURES, STATE_FEATURES};
use crate::{
    action_target, classify_roll, decode_action_label, decode_pattern_label, encode_dice_sequence,
    encode_game_state, pattern_target, CodecError, DEFAULT_LABEL_CONFIDENCE_GATE, MOVE_FEATURES,
};

fn rec(action_type: ActionType, success: bool) -> ActionRecord {
    ActionRecord {
        action_type,
        success,
        risk_level: 0.5,
        decision_time_ms: 3_000,
        under_pressure: false,
    }
}

fn outcome(risk_level: f64) -> ActionOutcome {
    ActionOutcome {
        success: true,
        points: 0,
        risk_level,
    }
}

#[test]
fn dice_sequence_maps_faces_to_unit_interval() {
    let v = encode_dice_sequence(&[1, 6, 3]);
    assert_eq!(v[0], 0.0);
    assert_eq!(v[1], 1.0);
    assert_eq!(v[2], 0.4);
}

#[test]
fn dice_sequence_truncates_past_twelve() {
    let values: Vec<u8> = (0..15).map(|i| (i % 6) as u8 + 1).collect();
    let v = encode_dice_sequence(&values);
    assert_eq!(v.len(), 12);
    let expected = encode_dice_sequence(&values[..12]);
    assert_eq!(v, expected);
    // slot 11 holds the 12th value (face 6), the 13th (face 1) is dropped.
    assert_eq!(v[11], 1.0);
}

#[test]
fn dice_sequence_zero_pads_short_input() {
    let v = encode_dice_sequence(&[2, 4, 6]);
    for (i, &x) in v.iter().enumerate().skip(3) {
        assert_eq!(x, 0.0, "slot {i}");
    }
    assert_eq!(encode_dice_sequence(&[]), [0.0; 12]);
}

#[test]
fn dice_sequence_clamps_out_of_range_faces() {
    let v = encode_dice_sequence(&[0, 9]);
    assert_eq!(v[0], 0.0);
    assert_eq!(v[1], 1.0);
}

#[test]
fn empty_history_encodes_as_zeros() {
    let v = encode_game_state(&GameStateSnapshot::default(), &[]);
    assert_eq!(v.len(), MOVE_FEATURES);
    assert_eq!(&v[STATE_FEATURES..], &[0.0; HISTORY_FEATURES]);
}

#[test]
fn state_features_are_normalized() {
    let s = GameStateSnapshot {
        round: 5,
        max_rounds: 10,
        player_score: 100,
        opponent_score: 400,
        dice_remaining: 3,
        max_dice: 9,
        time_remaining_ms: 15_000,
        turn_time_limit_ms: 30_000,
        risk_level: 0.25,
        board_advantage: 0.0,
        streak: -20,
        pressure_level: 0.75,
    };
    let v = encode_game_state(&s, &[]);
    assert_eq!(v[0], 0.5);
    assert_eq!(v[1], 0.5);
    assert_eq!(v[2], 1.0); // clamped
    assert!((v[3] - 1.0 / 3.0).abs() < 1e-12);
    assert_eq!(v[4], 0.5);
    assert_eq!(v[5], 0.25);
    assert_eq!(v[6], 0.5);
    assert_eq!(v[7], 0.0); // streak clamped to -10
    assert_eq!(v[8], 0.75);
}

#[test]
fn zero_denominators_do_not_produce_nan() {
    let s = GameStateSnapshot {
        max_rounds: 0,
        max_dice: 0,
        turn_time_limit_ms: 0,
        risk_level: f64::NAN,
        ..GameStateSnapshot::default()
    };
    let v = encode_game_state(&s, &[]);
    for x in v {
        assert!(x.is_finite());
    }
}

#[test]
fn history_features_use_last_ten_records() {
    // 5 old conservative successes get pushed out of the window by 10 newer records.
    let mut history: Vec<ActionRecord> = (0..5)
        .map(|_| rec(ActionType::ConservativeRoll, true))
        .collect();
    history.push(rec(ActionType::AggressiveRoll, false));
    history.push(rec(ActionType::RiskTaking, true)); // switched after failure
    history.push(rec(ActionType::RiskTaking, false));
    history.push(rec(ActionType::RiskTaking, true)); // no switch after failure
    for _ in 0..6 {
        history.push(ActionRecord {
            under_pressure: true,
            ..rec(ActionType::StrategicBlock, true)
        });
    }
    assert_eq!(history.len(), 15);

    let v = encode_game_state(&GameStateSnapshot::default(), &history);
    let h = &v[STATE_FEATURES..];
    assert!((h[0] - 0.4).abs() < 1e-12, "aggressive share {}", h[0]); // 4 of 10
    assert_eq!(h[1], 0.0); // conservative records are outside the window
    assert!((h[2] - 0.8).abs() < 1e-12); // 8 successes of 10
    assert!((h[3] - 0.5).abs() < 1e-12);
    assert!((h[4] - 0.1).abs() < 1e-12); // 3s / 30s
    assert!((h[5] - 0.15).abs() < 1e-12); // 15 records / 100
    assert!((h[6] - 0.6).abs() < 1e-12); // strategic_block x6
    assert!((h[7] - 0.5).abs() < 1e-12); // 1 of 2 failures followed by a switch
    assert_eq!(h[8], 1.0); // all pressured actions succeeded
}

#[test]
fn label_gate_reports_unknown_at_or_below_threshold() {
    let mut out = [0.1; 8];
    out[2] = 0.55;
    let (label, conf) = decode_pattern_label(&out, DEFAULT_LABEL_CONFIDENCE_GATE).unwrap();
    assert_eq!(label, PatternType::Unknown);
    assert_eq!(conf, 0.55);

    out[2] = 0.6;
    let (label, _) = decode_pattern_label(&out, 0.6).unwrap();
    assert_eq!(label, PatternType::Unknown);

    out[2] = 0.61;
    let (label, conf) = decode_pattern_label(&out, 0.6).unwrap();
    assert_eq!(label, PatternType::Triples);
    assert_eq!(conf, 0.61);
}

#[test]
fn label_gate_is_tunable() {
    let mut out = [0.1; 8];
    out[0] = 0.55;
    let (label, _) = decode_pattern_label(&out, 0.5).unwrap();
    assert_eq!(label, PatternType::Sequential);
}

#[test]
fn pattern_argmax_tie_keeps_first_slot() {
    let mut out = [0.1; 8];
    out[1] = 0.9;
    out[4] = 0.9;
    let (label, _) = decode_pattern_label(&out, 0.6).unwrap();
    assert_eq!(label, PatternType::Pairs);
}

#[test]
fn decoders_reject_wrong_lengths() {
    assert_eq!(
        decode_pattern_label(&[0.9; 6], 0.6).unwrap_err(),
        CodecError::Length {
            what: "pattern",
            got: 6,
            expected: 8
        }
    );
    assert!(decode_action_label(&[0.5; 8]).is_err());
}

#[test]
fn action_ranking_is_descending() {
    let out = [0.2, 0.9, 0.1, 0.5, 0.5, 0.3];
    let ranked = decode_action_label(&out).unwrap();
    let labels: Vec<ActionType> = ranked.iter().map(|r| r.0).collect();
    assert_eq!(
        labels,
        vec![
            ActionType::ConservativeRoll,
            ActionType::RiskTaking,
            ActionType::DefensivePlay,
            ActionType::RandomPlay,
            ActionType::AggressiveRoll,
            ActionType::StrategicBlock,
        ]
    );
}

#[test]
fn one_hot_targets() {
    let t = pattern_target(PatternType::HighRisk);
    assert_eq!(t.iter().sum::<f64>(), 1.0);
    assert_eq!(t[4], 1.0);
    let t = action_target(ActionType::RandomPlay);
    assert_eq!(t[5], 1.0);
}

#[test]
fn classify_roll_rules_in_order() {
    assert_eq!(classify_roll(&[], None), PatternType::Unknown);
    assert_eq!(classify_roll(&[4, 4, 4, 1], None), PatternType::Triples);
    assert_eq!(classify_roll(&[3, 5, 4], None), PatternType::Sequential);
    assert_eq!(classify_roll(&[2, 3, 4, 4], None), PatternType::Sequential);
    assert_eq!(classify_roll(&[2, 2, 5], None), PatternType::Pairs);
    assert_eq!(
        classify_roll(&[1, 5], Some(&outcome(0.9))),
        PatternType::HighRisk
    );
    assert_eq!(
        classify_roll(&[1, 5], Some(&outcome(0.1))),
        PatternType::Conservative
    );
    assert_eq!(classify_roll(&[1, 5], Some(&outcome(0.5))), PatternType::Random);
    assert_eq!(classify_roll(&[2, 4], None), PatternType::Mixed);
}
