use std::time::Duration;

use kb_core::config::OpponentConfig;
use kb_core::{seeded_rng, DiceGroup, DiceGroupResult, Difficulty};
use proptest::prelude::*;

use crate::delay::base_thinking_ms;
use crate::engine::{die_variance, Candidate};
use crate::{
    expected_value, select_best, thinking_delay, DecisionContext, DecisionError,
    OpponentDecisionEngine, THINKING_JITTER_MS,
};

const AI: &str = "ai";

fn roll(player: &str, dice_type: u8, values: &[u8]) -> DiceGroupResult {
    DiceGroupResult {
        dice_type,
        dice_count: values.len() as u8,
        values: values.to_vec(),
        timestamp_ms: 0,
        player_id: player.to_string(),
    }
}

fn ctx<'a>(
    difficulty: Difficulty,
    history: &'a [DiceGroupResult],
    pool: &'a [DiceGroup],
    legal_types: &'a [u8],
) -> DecisionContext<'a> {
    DecisionContext {
        difficulty,
        history,
        ai_player_id: AI,
        pool,
        legal_types,
    }
}

fn find(cands: &[Candidate], dice_type: u8, count: u8) -> Candidate {
    *cands
        .iter()
        .find(|c| c.dice_type == dice_type && c.count == count)
        .unwrap()
}

/// Same risk coefficient on every tier, so tier confidences can be compared on equal ev.
fn flat_risk_engine() -> OpponentDecisionEngine {
    let mut t = OpponentConfig::default();
    t.risk.easy = 0.0;
    t.risk.medium = 0.0;
    t.risk.hard = 0.0;
    t.risk.expert = 0.0;
    OpponentDecisionEngine::new(t)
}

#[test]
fn three_d6_into_empty_pool_is_worth_ten_and_a_half() {
    let t = OpponentConfig::default();
    let k = t.risk.for_difficulty(Difficulty::Hard);
    assert_eq!(expected_value(6, 3, &[], k, &t), 10.5);
}

#[test]
fn pool_synergy_and_diversity() {
    let t = OpponentConfig::default();
    let pool = [
        DiceGroup { dice_type: 6, count: 2 },
        DiceGroup { dice_type: 8, count: 1 },
    ];
    let ev = expected_value(6, 1, &pool, 0.0, &t);
    assert!((ev - (3.5 + 0.1 * 2.0 - 0.05)).abs() < 1e-12, "{ev}");
}

#[test]
fn risk_coefficient_scales_variance() {
    let t = OpponentConfig::default();
    let easy = expected_value(8, 2, &[], t.risk.easy, &t);
    let expert = expected_value(8, 2, &[], t.risk.expert, &t);
    assert!((easy - (9.0 - 0.15 * die_variance(8))).abs() < 1e-12);
    assert!(expert > easy);
}

#[test]
fn hard_tier_without_history_rolls_the_largest_pile() {
    let e = OpponentDecisionEngine::default();
    let d = e.decide(&ctx(Difficulty::Hard, &[], &[], &[4, 6])).unwrap();
    assert_eq!((d.dice_type, d.dice_count), (6, 5));
    assert_eq!(d.expected_value, 17.5);
    assert!((d.confidence - 0.75).abs() < 1e-12);
    assert!(d.reasoning.contains("hard"), "{}", d.reasoning);
    assert!(d.reasoning.contains("5d6"), "{}", d.reasoning);
}

#[test]
fn easy_confidence_prefers_low_variance() {
    let e = OpponentDecisionEngine::default();
    let cands = e.candidates(&ctx(Difficulty::Easy, &[], &[], &[4, 8])).unwrap();
    assert_eq!(cands.len(), 10);
    let expected_d4 = 0.5 + 0.4 * (1.0 - die_variance(4) / die_variance(8));
    for c in &cands {
        if c.dice_type == 4 {
            assert!((c.confidence - expected_d4).abs() < 1e-12);
        } else {
            assert!((c.confidence - 0.5).abs() < 1e-12);
        }
    }
}

#[test]
fn medium_confidence_compares_against_recent_rolls() {
    let e = OpponentDecisionEngine::default();
    let history = vec![
        roll("human", 6, &[3]),
        roll("human", 6, &[3]),
        roll("human", 6, &[3]),
    ];
    let cands = e
        .candidates(&ctx(Difficulty::Medium, &history, &[], &[6]))
        .unwrap();
    let c = find(&cands, 6, 1);
    let ev = 3.5 - 0.05 * die_variance(6);
    let expected = 0.5 * ev / 17.5 + 0.5 * ((ev / 3.0).min(2.0) / 2.0);
    assert!((c.expected_value - ev).abs() < 1e-12);
    assert!((c.confidence - expected).abs() < 1e-12);
}

#[test]
fn hard_tier_avoids_the_favored_type_and_exploits_caution() {
    let e = flat_risk_engine();
    // The human sticks to single d6s (tolerance 0.2); the AI's own rolls are ignored.
    let history = vec![
        roll("human", 6, &[4]),
        roll(AI, 8, &[8, 8, 8, 8, 8]),
        roll("human", 6, &[2]),
        roll(AI, 8, &[1, 1, 1, 1, 1]),
        roll("human", 4, &[3]),
        roll(AI, 8, &[2, 2, 2, 2, 2]),
    ];
    let legal = [6, 8];
    let medium = e
        .candidates(&ctx(Difficulty::Medium, &history, &[], &legal))
        .unwrap();
    let hard = e
        .candidates(&ctx(Difficulty::Hard, &history, &[], &legal))
        .unwrap();

    let (m6, h6) = (find(&medium, 6, 5), find(&hard, 6, 5));
    assert!((h6.confidence - (m6.confidence - 0.15 + 0.1)).abs() < 1e-12);
    let (m8, h8) = (find(&medium, 8, 2), find(&hard, 8, 2));
    assert!((h8.confidence - (m8.confidence + 0.1 * 2.0 / 5.0)).abs() < 1e-12);
}

#[test]
fn expert_tier_applies_rolling_and_complexity_terms() {
    let e = flat_risk_engine();
    let history = vec![
        roll("human", 4, &[1, 1]),
        roll("human", 4, &[1, 1]),
        roll("human", 4, &[1, 1]),
    ];
    let pool = [
        DiceGroup { dice_type: 4, count: 1 },
        DiceGroup { dice_type: 8, count: 1 },
        DiceGroup { dice_type: 10, count: 1 },
        DiceGroup { dice_type: 12, count: 1 },
    ];
    let legal = [6, 8];
    let hard = e
        .candidates(&ctx(Difficulty::Hard, &history, &pool, &legal))
        .unwrap();
    let expert = e
        .candidates(&ctx(Difficulty::Expert, &history, &pool, &legal))
        .unwrap();

    // Rolling average total is 2: every candidate beats it.
    // d6 opens a fifth group, d8 joins an existing one.
    for (h, x) in hard.iter().zip(&expert) {
        let mut want = h.confidence + 0.1;
        if h.dice_type == 6 {
            want -= 0.1;
        }
        assert!((x.confidence - want.clamp(0.0, 1.0)).abs() < 1e-12, "{h:?} {x:?}");
    }
}

#[test]
fn ties_keep_the_first_candidate() {
    let c = |dice_type, count| Candidate {
        dice_type,
        count,
        expected_value: 10.0,
        confidence: 0.5,
    };
    let cands = [c(6, 3), c(8, 2), c(4, 5)];
    let best = select_best(&cands).unwrap();
    assert_eq!((best.dice_type, best.count), (6, 3));
    assert!(select_best(&[]).is_none());
}

#[test]
fn duplicate_legal_types_resolve_to_the_first_enumerated() {
    let e = OpponentDecisionEngine::default();
    let a = e.decide(&ctx(Difficulty::Hard, &[], &[], &[6, 6])).unwrap();
    let b = e.decide(&ctx(Difficulty::Hard, &[], &[], &[6])).unwrap();
    assert_eq!(a, b);
}

#[test]
fn invalid_inputs_are_errors() {
    let e = OpponentDecisionEngine::default();
    assert_eq!(
        e.decide(&ctx(Difficulty::Easy, &[], &[], &[])).unwrap_err(),
        DecisionError::NoLegalDiceTypes
    );
    assert_eq!(
        e.decide(&ctx(Difficulty::Easy, &[], &[], &[6, 1])).unwrap_err(),
        DecisionError::InvalidDiceType(1)
    );
}

#[test]
fn thinking_delay_is_seeded_and_bounded() {
    for d in Difficulty::ALL {
        let a = thinking_delay(d, &mut seeded_rng(11));
        let b = thinking_delay(d, &mut seeded_rng(11));
        assert_eq!(a, b);
        let base = Duration::from_millis(base_thinking_ms(d));
        assert!(a >= base && a <= base + Duration::from_millis(THINKING_JITTER_MS));
    }
    assert!(base_thinking_ms(Difficulty::Expert) > base_thinking_ms(Difficulty::Easy));
}

fn arb_difficulty() -> impl Strategy<Value = Difficulty> {
    prop_oneof![
        Just(Difficulty::Easy),
        Just(Difficulty::Medium),
        Just(Difficulty::Hard),
        Just(Difficulty::Expert),
    ]
}

proptest! {
    #[test]
    fn confidences_stay_in_unit_interval(
        difficulty in arb_difficulty(),
        legal in prop::collection::vec(prop::sample::select(vec![4u8, 6, 8, 10, 12, 20]), 1..5),
        pool in prop::collection::vec((prop::sample::select(vec![4u8, 6, 8, 12]), 1u8..4), 0..6),
        rolls in prop::collection::vec((any::<bool>(), prop::collection::vec(1u8..=6, 1..6)), 0..12),
    ) {
        let pool: Vec<DiceGroup> = pool
            .into_iter()
            .map(|(dice_type, count)| DiceGroup { dice_type, count })
            .collect();
        let history: Vec<DiceGroupResult> = rolls
            .iter()
            .map(|(mine, v)| roll(if *mine { AI } else { "human" }, 6, v))
            .collect();
        let e = OpponentDecisionEngine::default();
        let c = ctx(difficulty, &history, &pool, &legal);
        let cands = e.candidates(&c).unwrap();
        prop_assert_eq!(cands.len(), legal.len() * 5);
        for cand in &cands {
            prop_assert!((0.0..=1.0).contains(&cand.confidence));
            prop_assert!(cand.expected_value.is_finite());
        }
        let d = e.decide(&c).unwrap();
        prop_assert!(legal.contains(&d.dice_type));
        prop_assert!((1..=5).contains(&d.dice_count));
    }
}
