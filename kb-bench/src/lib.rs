//! Shared inputs for the criterion benches.

use kb_core::DiceGroupResult;

/// Deterministic d6 rolls of 1..=5 dice, alternating between two players.
pub fn gen_rolls(n: usize) -> Vec<DiceGroupResult> {
    // xorshift64 keeps the inputs identical across runs without seeding an RNG.
    let mut x: u64 = 0x1234_5678_9ABC_DEF0;
    let mut next = move || {
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        x
    };
    (0..n)
        .map(|i| {
            let count = (next() % 5) as usize + 1;
            let values: Vec<u8> = (0..count).map(|_| (next() % 6) as u8 + 1).collect();
            let player = if i % 2 == 0 { "human" } else { "ai" };
            DiceGroupResult {
                dice_type: 6,
                dice_count: count as u8,
                values,
                timestamp_ms: i as u64,
                player_id: player.to_string(),
            }
        })
        .collect()
}
