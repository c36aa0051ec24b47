use std::time::Duration;

use kb_core::Difficulty;
use rand::Rng;

/// Upper bound of the uniform jitter added to every delay.
pub const THINKING_JITTER_MS: u64 = 1_000;

/// Base think time for a tier; stronger opponents take longer.
pub fn base_thinking_ms(difficulty: Difficulty) -> u64 {
    match difficulty {
        Difficulty::Easy => 800,
        Difficulty::Medium => 1_200,
        Difficulty::Hard => 1_600,
        Difficulty::Expert => 2_000,
    }
}

/// Simulated think time before the opponent acts: the tier base plus uniform
/// jitter in `[0, THINKING_JITTER_MS]`, drawn from `rng`.
pub fn thinking_delay<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Duration {
    let jitter = rng.gen_range(0..=THINKING_JITTER_MS);
    Duration::from_millis(base_thinking_ms(difficulty) + jitter)
}
