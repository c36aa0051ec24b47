use kb_core::{
    ActionOutcome, ActionType, DiceGroupResult, GameSession, GameStateSnapshot, PlayerAction,
    Round,
};

fn group(player: &str, values: &[u8]) -> DiceGroupResult {
    DiceGroupResult {
        dice_type: 6,
        dice_count: values.len() as u8,
        values: values.to_vec(),
        timestamp_ms: 0,
        player_id: player.to_string(),
    }
}

pub fn opening_state() -> GameStateSnapshot {
    GameStateSnapshot {
        round: 1,
        player_score: 12,
        opponent_score: 8,
        dice_remaining: 6,
        time_remaining_ms: 20_000,
        risk_level: 0.4,
        ..GameStateSnapshot::default()
    }
}

/// One round of three actions: two resolved rolls and an unresolved one.
pub fn session(id: &str, started_at_ms: u64) -> GameSession {
    let actions = vec![
        PlayerAction {
            player_id: "human".to_string(),
            action_type: ActionType::AggressiveRoll,
            dice_groups: Some(vec![group("human", &[2, 3, 4])]),
            outcome: Some(ActionOutcome {
                success: true,
                points: 9,
                risk_level: 0.8,
            }),
            state: Some(opening_state()),
            decision_time_ms: 1_500,
            under_pressure: false,
        },
        PlayerAction {
            player_id: "ai".to_string(),
            action_type: ActionType::ConservativeRoll,
            dice_groups: Some(vec![group("ai", &[5, 5])]),
            outcome: Some(ActionOutcome {
                success: false,
                points: 0,
                risk_level: 0.2,
            }),
            state: None,
            decision_time_ms: 900,
            under_pressure: true,
        },
        PlayerAction {
            player_id: "human".to_string(),
            action_type: ActionType::RiskTaking,
            dice_groups: Some(vec![group("human", &[1, 6])]),
            outcome: None,
            state: None,
            decision_time_ms: 2_500,
            under_pressure: false,
        },
    ];
    GameSession {
        id: id.to_string(),
        started_at_ms,
        rounds: vec![Round { index: 0, actions }],
    }
}

pub fn sessions(n: usize) -> Vec<GameSession> {
    (0..n).map(|i| session(&format!("s{i}"), i as u64 * 1_000)).collect()
}
