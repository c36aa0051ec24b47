//! Feature encoding for both network inputs.

use kb_core::{ActionRecord, GameStateSnapshot, NUM_ACTIONS};

use crate::schema::{
    DECISION_TIME_NORM, ENCODED_DIE_FACES, EXPERIENCE_NORM, HISTORY_WINDOW, MOVE_FEATURES,
    PATTERN_FEATURES, SCORE_NORM, STREAK_NORM,
};

fn unit(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// `num / den`, 0 when the denominator is 0.
fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        unit(num / den)
    }
}

fn push_scalar(out: &mut [f64], offset: &mut usize, v: f64) {
    out[*offset] = unit(v);
    *offset += 1;
}

/// Encode a roll sequence (6-sided dice) into the pattern recognizer input.
///
/// Sequences longer than `PATTERN_FEATURES` are truncated to their first 12 values;
/// shorter ones are zero-padded. Out-of-range faces are clamped to 1..=6.
pub fn encode_dice_sequence(values: &[u8]) -> [f64; PATTERN_FEATURES] {
    let mut out = [0.0f64; PATTERN_FEATURES];
    let max = ENCODED_DIE_FACES as f64 - 1.0;
    for (slot, &v) in out.iter_mut().zip(values) {
        let v = v.clamp(1, ENCODED_DIE_FACES);
        *slot = (v as f64 - 1.0) / max;
    }
    out
}

fn push_state(out: &mut [f64], off: &mut usize, s: &GameStateSnapshot) {
    push_scalar(out, off, ratio(s.round as f64, s.max_rounds as f64));
    push_scalar(out, off, s.player_score as f64 / SCORE_NORM);
    push_scalar(out, off, s.opponent_score as f64 / SCORE_NORM);
    push_scalar(out, off, ratio(s.dice_remaining as f64, s.max_dice as f64));
    push_scalar(
        out,
        off,
        ratio(s.time_remaining_ms as f64, s.turn_time_limit_ms as f64),
    );
    push_scalar(out, off, s.risk_level);
    push_scalar(out, off, (s.board_advantage + 1.0) / 2.0);
    let streak = (s.streak as f64).clamp(-STREAK_NORM, STREAK_NORM);
    push_scalar(out, off, (streak + STREAK_NORM) / (2.0 * STREAK_NORM));
    push_scalar(out, off, s.pressure_level);
}

fn modal_share(window: &[ActionRecord]) -> f64 {
    let mut counts = [0usize; NUM_ACTIONS];
    for r in window {
        counts[r.action_type.index()] += 1;
    }
    let max = counts.iter().copied().max().unwrap_or(0);
    ratio(max as f64, window.len() as f64)
}

fn adaptability(window: &[ActionRecord]) -> f64 {
    let mut failures = 0usize;
    let mut switched = 0usize;
    for w in window.windows(2) {
        if !w[0].success {
            failures += 1;
            if w[1].action_type != w[0].action_type {
                switched += 1;
            }
        }
    }
    ratio(switched as f64, failures as f64)
}

fn push_history(out: &mut [f64], off: &mut usize, history: &[ActionRecord]) {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let window = &history[start..];
    let n = window.len() as f64;

    let count = |f: &dyn Fn(&ActionRecord) -> bool| window.iter().filter(|r| f(*r)).count() as f64;
    let mean = |f: &dyn Fn(&ActionRecord) -> f64| {
        if window.is_empty() {
            0.0
        } else {
            window.iter().map(f).sum::<f64>() / n
        }
    };

    push_scalar(out, off, ratio(count(&|r| r.action_type.is_aggressive()), n));
    push_scalar(out, off, ratio(count(&|r| r.action_type.is_conservative()), n));
    push_scalar(out, off, ratio(count(&|r| r.success), n));
    push_scalar(out, off, mean(&|r| unit(r.risk_level)));
    push_scalar(
        out,
        off,
        mean(&|r| unit(r.decision_time_ms as f64 / DECISION_TIME_NORM)),
    );
    push_scalar(out, off, history.len() as f64 / EXPERIENCE_NORM);
    push_scalar(out, off, modal_share(window));
    push_scalar(out, off, adaptability(window));

    let pressured = count(&|r| r.under_pressure);
    let pressured_ok = count(&|r| r.under_pressure && r.success);
    push_scalar(out, off, ratio(pressured_ok, pressured));
}

/// Encode the current state plus action history into the move predictor input.
pub fn encode_game_state(
    state: &GameStateSnapshot,
    history: &[ActionRecord],
) -> [f64; MOVE_FEATURES] {
    let mut out = [0.0f64; MOVE_FEATURES];
    let mut off = 0usize;
    push_state(&mut out, &mut off, state);
    push_history(&mut out, &mut off, history);
    debug_assert_eq!(off, MOVE_FEATURES);
    out
}
