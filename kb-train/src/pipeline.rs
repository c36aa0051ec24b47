//! Background training with single-flight and copy-on-write publishing.
//!
//! A run trains a private clone of the live [`ModelSet`] and swaps it in under
//! the write lock when done, so readers always see a complete snapshot. At most
//! one run is in flight: further requests are dropped, not queued.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::JoinHandle;
use std::time::Instant;

use kb_core::{ActionRecord, Config, GameSession, GameStateSnapshot};
use kb_features::schema::FEATURE_SCHEMA_ID;
use kb_logging::{NdjsonError, TrainRunEventV1, VersionInfoV1, EVENT_SCHEMA_VERSION};
use kb_models::{DicePattern, MLPrediction, ModelError, PatternAnalysis};
use kb_nn::{Example, FeedforwardNetwork, NnError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dataset::build_training_set;
use crate::models::ModelSet;
use crate::store::{self, StoreError, MODEL_FORMAT};

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("network: {0}")]
    Nn(#[from] NnError),
    #[error("model: {0}")]
    Model(#[from] ModelError),
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("event log: {0}")]
    Log(#[from] NdjsonError),
    #[error("cancelled")]
    Cancelled,
    #[error("a training run is already in flight")]
    InFlight,
    #[error("training thread panicked")]
    Panicked,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    pub sessions: usize,
    pub pattern_examples: usize,
    pub move_examples: usize,
    pub epochs: u32,
    pub pattern_mse: Option<f64>,
    pub move_mse: Option<f64>,
    pub accuracy: f64,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrainOutcome {
    Trained(TrainReport),
    /// No usable examples; live weights untouched.
    Skipped,
}

/// Handle on a background run. Dropping it detaches the run.
#[derive(Debug)]
pub struct TrainingHandle {
    cancel: Arc<AtomicBool>,
    join: JoinHandle<Result<TrainOutcome, TrainError>>,
}

impl TrainingHandle {
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub fn join(self) -> Result<TrainOutcome, TrainError> {
        match self.join.join() {
            Ok(r) => r,
            Err(_) => Err(TrainError::Panicked),
        }
    }
}

/// Clears the in-flight flag when a run ends, however it ends.
struct FlightGuard(Arc<AtomicBool>);

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// State shared between the pipeline and its training thread.
struct Shared {
    cfg: Config,
    models: Arc<RwLock<ModelSet>>,
}

pub struct TrainingPipeline {
    shared: Arc<Shared>,
    in_flight: Arc<AtomicBool>,
    /// Cancel flag of the most recently started run.
    cancel: Mutex<Arc<AtomicBool>>,
}

impl TrainingPipeline {
    /// Load persisted models from `cfg.training.model_path` when set, else start fresh.
    pub fn new(cfg: Config) -> Result<Self, TrainError> {
        let models = match &cfg.training.model_path {
            Some(p) => store::load_or_init(p, &cfg)?,
            None => ModelSet::fresh(&cfg)?,
        };
        Ok(Self::with_models(cfg, models))
    }

    pub fn with_models(cfg: Config, models: ModelSet) -> Self {
        Self {
            shared: Arc::new(Shared {
                cfg,
                models: Arc::new(RwLock::new(models)),
            }),
            in_flight: Arc::new(AtomicBool::new(false)),
            cancel: Mutex::new(Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn config(&self) -> &Config {
        &self.shared.cfg
    }

    /// The live model set. Hold the read guard only as long as needed.
    pub fn models(&self) -> Arc<RwLock<ModelSet>> {
        Arc::clone(&self.shared.models)
    }

    /// Copy of the last published models.
    pub fn snapshot(&self) -> ModelSet {
        read_models(&self.shared.models).clone()
    }

    pub fn is_training(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Stop the in-flight run at its next epoch boundary.
    pub fn request_cancel(&self) {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .store(true, Ordering::Relaxed);
    }

    /// Claim the in-flight flag and give the new run its own cancel flag.
    fn try_begin(&self) -> Option<(FlightGuard, Arc<AtomicBool>)> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        let cancel = Arc::new(AtomicBool::new(false));
        *self.cancel.lock().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&cancel);
        Some((FlightGuard(Arc::clone(&self.in_flight)), cancel))
    }

    /// Start a background run on `sessions`. `None` if one is already in flight;
    /// the request is then dropped.
    pub fn train_models(&self, sessions: Vec<GameSession>) -> Option<TrainingHandle> {
        let Some((guard, cancel)) = self.try_begin() else {
            debug!("training already in flight; request dropped");
            return None;
        };
        let shared = Arc::clone(&self.shared);
        let run_cancel = Arc::clone(&cancel);
        let join = std::thread::spawn(move || {
            let _guard = guard;
            run_logged(&shared, &run_cancel, &sessions)
        });
        Some(TrainingHandle { cancel, join })
    }

    /// Train on the calling thread. Fails with `InFlight` if a background run is active.
    pub fn train_models_blocking(&self, sessions: &[GameSession]) -> Result<TrainOutcome, TrainError> {
        let (_guard, cancel) = self.try_begin().ok_or(TrainError::InFlight)?;
        run_logged(&self.shared, &cancel, sessions)
    }

    pub fn analyze_roll(&self, values: &[u8]) -> Result<Option<DicePattern>, ModelError> {
        read_models(&self.shared.models).pattern.analyze_roll(values)
    }

    pub fn analyze_history(&self, sessions: &[GameSession]) -> Result<PatternAnalysis, ModelError> {
        let gate = self.shared.cfg.codec.anomaly_deviation_gate;
        read_models(&self.shared.models)
            .pattern
            .analyze_history_with(sessions, gate)
    }

    pub fn predict_next_move(
        &self,
        state: &GameStateSnapshot,
        history: &[ActionRecord],
    ) -> Result<MLPrediction, ModelError> {
        read_models(&self.shared.models)
            .moves
            .predict_next_move(state, history)
    }
}

fn read_models(models: &RwLock<ModelSet>) -> std::sync::RwLockReadGuard<'_, ModelSet> {
    models.read().unwrap_or_else(PoisonError::into_inner)
}

/// Run once and append a `train_run` event for whatever happened. A failed append
/// is only logged: by then the outcome is already published.
fn run_logged(
    shared: &Shared,
    cancel: &AtomicBool,
    sessions: &[GameSession],
) -> Result<TrainOutcome, TrainError> {
    let start = Instant::now();
    let res = run(shared, cancel, sessions);
    let duration_ms = start.elapsed().as_millis() as u64;

    let Some(events_path) = shared.cfg.training.events_path.as_ref().map(PathBuf::from) else {
        return res;
    };
    let mut ev = TrainRunEventV1 {
        event: "train_run".to_string(),
        ts_ms: kb_logging::now_ms(),
        v: VersionInfoV1 {
            event_schema_version: EVENT_SCHEMA_VERSION,
            feature_schema_id: FEATURE_SCHEMA_ID,
            model_format: MODEL_FORMAT.to_string(),
        },
        sessions: sessions.len(),
        pattern_examples: 0,
        move_examples: 0,
        epochs: shared.cfg.training.epochs,
        status: String::new(),
        pattern_mse: None,
        move_mse: None,
        accuracy: None,
        duration_ms,
        error: None,
    };
    match &res {
        Ok(TrainOutcome::Trained(r)) => {
            ev.status = "trained".to_string();
            ev.pattern_examples = r.pattern_examples;
            ev.move_examples = r.move_examples;
            ev.pattern_mse = r.pattern_mse;
            ev.move_mse = r.move_mse;
            ev.accuracy = Some(r.accuracy);
        }
        Ok(TrainOutcome::Skipped) => ev.status = "skipped".to_string(),
        Err(TrainError::Cancelled) => ev.status = "cancelled".to_string(),
        Err(e) => {
            ev.status = "error".to_string();
            ev.error = Some(e.to_string());
        }
    }
    if let Err(e) = kb_logging::append_event(&events_path, &ev) {
        warn!(path = %events_path.display(), error = %e, "failed to append train_run event");
    }
    res
}

fn train_epoch(net: &mut FeedforwardNetwork, examples: &[Example]) -> Result<Option<f64>, NnError> {
    if examples.is_empty() {
        return Ok(None);
    }
    Ok(Some(net.train_batch(examples, 1)?.last_epoch_mse))
}

fn run(shared: &Shared, cancel: &AtomicBool, sessions: &[GameSession]) -> Result<TrainOutcome, TrainError> {
    let start = Instant::now();
    let cfg = &shared.cfg;
    let set = build_training_set(sessions);
    if set.is_empty() {
        info!(sessions = sessions.len(), "no training examples; skipping");
        return Ok(TrainOutcome::Skipped);
    }
    info!(
        sessions = sessions.len(),
        pattern_examples = set.pattern.len(),
        move_examples = set.moves.len(),
        epochs = cfg.training.epochs,
        "training started"
    );

    let mut next = read_models(&shared.models).clone();
    let mut pattern_mse = None;
    let mut move_mse = None;
    for epoch in 0..cfg.training.epochs {
        if cancel.load(Ordering::Relaxed) {
            info!(epoch, "training cancelled");
            return Err(TrainError::Cancelled);
        }
        pattern_mse = train_epoch(next.pattern.network_mut(), &set.pattern)?;
        move_mse = train_epoch(next.moves.network_mut(), &set.moves)?;
        debug!(epoch, ?pattern_mse, ?move_mse, "epoch done");
    }

    let accuracy = evaluate(&next, &recent(sessions, cfg.training.eval_sessions))?;
    next.accuracy = Some(accuracy);
    next.last_trained = Some(kb_logging::now_iso8601());

    *shared
        .models
        .write()
        .unwrap_or_else(PoisonError::into_inner) = next.clone();

    if let Some(path) = &cfg.training.model_path {
        store::save(path, &next)?;
    }

    let report = TrainReport {
        sessions: sessions.len(),
        pattern_examples: set.pattern.len(),
        move_examples: set.moves.len(),
        epochs: cfg.training.epochs,
        pattern_mse,
        move_mse,
        accuracy,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(accuracy, duration_ms = report.duration_ms, "training finished");
    Ok(TrainOutcome::Trained(report))
}

/// The `n` sessions with the latest `started_at_ms`.
pub(crate) fn recent(sessions: &[GameSession], n: usize) -> Vec<GameSession> {
    let mut sorted: Vec<&GameSession> = sessions.iter().collect();
    sorted.sort_by_key(|s| s.started_at_ms);
    let skip = sorted.len().saturating_sub(n);
    sorted.into_iter().skip(skip).cloned().collect()
}

fn argmax(v: &[f64]) -> usize {
    let mut best = 0;
    for (i, x) in v.iter().enumerate() {
        if *x > v[best] {
            best = i;
        }
    }
    best
}

/// Share of recorded rolls whose top-1 pattern prediction matches the rule label.
/// 0 when `sessions` yields no rolls.
pub fn evaluate(models: &ModelSet, sessions: &[GameSession]) -> Result<f64, NnError> {
    let set = build_training_set(sessions);
    if set.pattern.is_empty() {
        return Ok(0.0);
    }
    let net = models.pattern.network();
    let mut hits = 0usize;
    for (x, t) in &set.pattern {
        if argmax(&net.predict(x)?) == argmax(t) {
            hits += 1;
        }
    }
    Ok(hits as f64 / set.pattern.len() as f64)
}
