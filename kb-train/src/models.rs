use kb_core::{seeded_rng, Config};
use kb_models::{ModelError, MovePredictor, PatternRecognizer};

/// The published pair of models plus training metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSet {
    pub pattern: PatternRecognizer,
    pub moves: MovePredictor,
    /// Accuracy of the last training run on recent sessions.
    pub accuracy: Option<f64>,
    /// ISO-8601 time of the last training run.
    pub last_trained: Option<String>,
}

impl ModelSet {
    /// Untrained models seeded from `cfg.network.seed`; the pattern network draws first.
    pub fn fresh(cfg: &Config) -> Result<Self, ModelError> {
        let mut rng = seeded_rng(cfg.network.seed);
        let pattern = PatternRecognizer::new(cfg.network.pattern_learning_rate, &mut rng)?
            .with_gate(cfg.codec.label_confidence_gate);
        let moves = MovePredictor::new(cfg.network.move_learning_rate, &mut rng)?;
        Ok(Self {
            pattern,
            moves,
            accuracy: None,
            last_trained: None,
        })
    }
}
