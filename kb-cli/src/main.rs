//! kb: CLI for the Knucklebones learning core.
//!
//! Subcommands:
//! - train     train both models on a session log and persist them
//! - analyze   pattern analysis of a session log
//! - decide    one AI opponent decision
//! - predict   predict the human's next move from the latest session

use std::env;
use std::process;

use kb_core::{
    seeded_rng, ActionRecord, Config, DiceGroup, DiceGroupResult, Difficulty, GameSession,
    GameStateSnapshot,
};
use kb_opponent::{thinking_delay, DecisionContext, OpponentDecisionEngine};
use kb_train::{ModelSet, TrainOutcome, TrainingPipeline};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{msg}");
    process::exit(1);
}

/// Value following the flag at `args[*i]`; advances `i` past both.
fn take_value(args: &[String], i: &mut usize) -> String {
    let flag = &args[*i];
    let Some(v) = args.get(*i + 1) else {
        fail(format!("Missing value for {flag}"));
    };
    *i += 2;
    v.clone()
}

fn unknown_option(cmd: &str, other: &str) -> ! {
    eprintln!("Unknown option for `kb {cmd}`: {other}");
    eprintln!("Run `kb {cmd} --help` for usage.");
    process::exit(1);
}

fn load_config(path: Option<&str>) -> Config {
    match path {
        Some(p) => Config::load(p).unwrap_or_else(|e| fail(format!("Failed to load config {p}: {e}"))),
        None => Config::default(),
    }
}

fn load_sessions(path: &str) -> Vec<GameSession> {
    kb_history::read_sessions(path)
        .unwrap_or_else(|e| fail(format!("Failed to read sessions from {path}: {e}")))
}

fn load_models(model: Option<&str>, cfg: &Config) -> ModelSet {
    let res = match model {
        Some(p) => kb_train::load_or_init(p, cfg),
        None => ModelSet::fresh(cfg),
    };
    res.unwrap_or_else(|e| fail(format!("Failed to initialize models: {e}")))
}

fn print_json<T: serde::Serialize>(v: &T) {
    match serde_json::to_string_pretty(v) {
        Ok(s) => println!("{s}"),
        Err(e) => fail(format!("Failed to encode output: {e}")),
    }
}

/// The session with the latest start time.
fn latest(sessions: &[GameSession]) -> Option<&GameSession> {
    sessions.iter().max_by_key(|s| s.started_at_ms)
}

fn cmd_train(args: &[String]) {
    let mut history: Option<String> = None;
    let mut model: Option<String> = None;
    let mut config: Option<String> = None;
    let mut events: Option<String> = None;
    let mut epochs: Option<u32> = None;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!(
                    r#"kb train

USAGE:
    kb train --history <sessions.ndjson> --model <path> [--config <yaml>] [--events <ndjson>] [--epochs N]

OPTIONS:
    --history PATH   Session log to train on
    --model PATH     Where the trained models are stored (loaded first if present)
    --config PATH    YAML config (default: built-in defaults)
    --events PATH    Append a train_run event to this NDJSON file
    --epochs N       Override training.epochs
"#
                );
                return;
            }
            "--history" => history = Some(take_value(args, &mut i)),
            "--model" => model = Some(take_value(args, &mut i)),
            "--config" => config = Some(take_value(args, &mut i)),
            "--events" => events = Some(take_value(args, &mut i)),
            "--epochs" => {
                let v = take_value(args, &mut i);
                epochs = Some(v.parse().unwrap_or_else(|_| fail(format!("Invalid --epochs value: {v}"))));
            }
            other => unknown_option("train", other),
        }
    }
    let history = history.unwrap_or_else(|| fail("Missing --history"));
    let model = model.unwrap_or_else(|| fail("Missing --model"));

    let mut cfg = load_config(config.as_deref());
    cfg.training.model_path = Some(model.clone());
    if events.is_some() {
        cfg.training.events_path = events;
    }
    if let Some(n) = epochs {
        cfg.training.epochs = n;
    }
    if let Err(e) = cfg.validate() {
        fail(format!("Invalid config: {e}"));
    }

    let sessions = load_sessions(&history);
    info!(sessions = sessions.len(), history = %history, "loaded sessions");
    let pipeline =
        TrainingPipeline::new(cfg).unwrap_or_else(|e| fail(format!("Failed to set up training: {e}")));
    match pipeline.train_models_blocking(&sessions) {
        Ok(TrainOutcome::Trained(r)) => println!(
            "trained on {} sessions ({} pattern / {} move examples, {} epochs): accuracy={:.3} model={}",
            r.sessions, r.pattern_examples, r.move_examples, r.epochs, r.accuracy, model
        ),
        Ok(TrainOutcome::Skipped) => println!("no training examples in {history}; models unchanged"),
        Err(e) => fail(format!("Training failed: {e}")),
    }
}

fn cmd_analyze(args: &[String]) {
    let mut history: Option<String> = None;
    let mut model: Option<String> = None;
    let mut config: Option<String> = None;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!(
                    r#"kb analyze

USAGE:
    kb analyze --history <sessions.ndjson> [--model <path>] [--config <yaml>]

Prints the pattern analysis of every roll in the log as JSON.
"#
                );
                return;
            }
            "--history" => history = Some(take_value(args, &mut i)),
            "--model" => model = Some(take_value(args, &mut i)),
            "--config" => config = Some(take_value(args, &mut i)),
            other => unknown_option("analyze", other),
        }
    }
    let history = history.unwrap_or_else(|| fail("Missing --history"));
    let cfg = load_config(config.as_deref());
    let models = load_models(model.as_deref(), &cfg);
    let sessions = load_sessions(&history);
    let analysis = models
        .pattern
        .analyze_history_with(&sessions, cfg.codec.anomaly_deviation_gate)
        .unwrap_or_else(|e| fail(format!("Analysis failed: {e}")));
    print_json(&analysis);
}

/// `6x2,8x1` → pool groups.
fn parse_pool(s: &str) -> Result<Vec<DiceGroup>, String> {
    s.split(',')
        .filter(|p| !p.trim().is_empty())
        .map(|p| {
            let (t, c) = p
                .trim()
                .split_once('x')
                .ok_or_else(|| format!("pool entry {p:?} must look like <faces>x<count>"))?;
            Ok(DiceGroup {
                dice_type: t.parse().map_err(|_| format!("bad dice type in {p:?}"))?,
                count: c.parse().map_err(|_| format!("bad count in {p:?}"))?,
            })
        })
        .collect()
}

/// `4,6,8` → dice types.
fn parse_legal(s: &str) -> Result<Vec<u8>, String> {
    s.split(',')
        .filter(|p| !p.trim().is_empty())
        .map(|p| p.trim().parse().map_err(|_| format!("bad dice type {p:?}")))
        .collect()
}

fn cmd_decide(args: &[String]) {
    let mut difficulty: Option<Difficulty> = None;
    let mut legal: Option<Vec<u8>> = None;
    let mut pool: Vec<DiceGroup> = Vec::new();
    let mut history: Option<String> = None;
    let mut config: Option<String> = None;
    let mut ai_id = "ai".to_string();
    let mut seed: u64 = 0;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!(
                    r#"kb decide

USAGE:
    kb decide --difficulty <easy|medium|hard|expert> --legal 4,6,8 [--pool 6x2,8x1] [--history <sessions.ndjson>] [--ai ID] [--seed S] [--config <yaml>]

OPTIONS:
    --difficulty T   Opponent tier
    --legal LIST     Dice types the opponent may roll, in preference order
    --pool LIST      Current pool as <faces>x<count> entries
    --history PATH   Session log; rolls of the latest session are the game history
    --ai ID          Player id of the opponent in the history (default: ai)
    --seed S         Seed for the simulated thinking delay (default: 0)
"#
                );
                return;
            }
            "--difficulty" => {
                let v = take_value(args, &mut i);
                difficulty = Some(
                    Difficulty::parse(&v).unwrap_or_else(|| fail(format!("Invalid --difficulty value: {v}"))),
                );
            }
            "--legal" => {
                let v = take_value(args, &mut i);
                legal = Some(parse_legal(&v).unwrap_or_else(|e| fail(format!("Invalid --legal: {e}"))));
            }
            "--pool" => {
                let v = take_value(args, &mut i);
                pool = parse_pool(&v).unwrap_or_else(|e| fail(format!("Invalid --pool: {e}")));
            }
            "--history" => history = Some(take_value(args, &mut i)),
            "--config" => config = Some(take_value(args, &mut i)),
            "--ai" => ai_id = take_value(args, &mut i),
            "--seed" => {
                let v = take_value(args, &mut i);
                seed = v.parse().unwrap_or_else(|_| fail(format!("Invalid --seed value: {v}")));
            }
            other => unknown_option("decide", other),
        }
    }
    let difficulty = difficulty.unwrap_or_else(|| fail("Missing --difficulty"));
    let legal = legal.unwrap_or_else(|| fail("Missing --legal"));
    let cfg = load_config(config.as_deref());

    let rolls: Vec<DiceGroupResult> = match &history {
        Some(p) => latest(&load_sessions(p))
            .map(|s| s.dice_groups().cloned().collect())
            .unwrap_or_default(),
        None => Vec::new(),
    };

    let engine = OpponentDecisionEngine::new(cfg.opponent);
    let ctx = DecisionContext {
        difficulty,
        history: &rolls,
        ai_player_id: &ai_id,
        pool: &pool,
        legal_types: &legal,
    };
    let decision = engine
        .decide(&ctx)
        .unwrap_or_else(|e| fail(format!("Decision failed: {e}")));
    let delay = thinking_delay(difficulty, &mut seeded_rng(seed));
    print_json(&serde_json::json!({
        "decision": decision,
        "thinking_ms": delay.as_millis() as u64,
    }));
}

fn cmd_predict(args: &[String]) {
    let mut history: Option<String> = None;
    let mut model: Option<String> = None;
    let mut config: Option<String> = None;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!(
                    r#"kb predict

USAGE:
    kb predict --history <sessions.ndjson> [--model <path>] [--config <yaml>]

Predicts the next action after the latest session's last action.
"#
                );
                return;
            }
            "--history" => history = Some(take_value(args, &mut i)),
            "--model" => model = Some(take_value(args, &mut i)),
            "--config" => config = Some(take_value(args, &mut i)),
            other => unknown_option("predict", other),
        }
    }
    let history = history.unwrap_or_else(|| fail("Missing --history"));
    let cfg = load_config(config.as_deref());
    let models = load_models(model.as_deref(), &cfg);
    let sessions = load_sessions(&history);

    let (state, records) = match latest(&sessions) {
        Some(s) => {
            let actions: Vec<_> = s.rounds.iter().flat_map(|r| &r.actions).collect();
            let state = actions
                .iter()
                .rev()
                .find_map(|a| a.state.clone())
                .unwrap_or_default();
            let records: Vec<ActionRecord> = actions.into_iter().map(ActionRecord::from).collect();
            (state, records)
        }
        None => (GameStateSnapshot::default(), Vec::new()),
    };
    let prediction = models
        .moves
        .predict_next_move(&state, &records)
        .unwrap_or_else(|e| fail(format!("Prediction failed: {e}")));
    print_json(&prediction);
}

fn print_help() {
    eprintln!(
        r#"kb - Knucklebones learning core CLI

USAGE:
    kb <COMMAND> [OPTIONS]

COMMANDS:
    train       Train both models on a session log and persist them
    analyze     Pattern analysis of a session log (JSON)
    decide      One AI opponent decision (JSON)
    predict     Predict the human's next move (JSON)

OPTIONS:
    -h, --help       Print this help message
    -V, --version    Print version

Set RUST_LOG (e.g. RUST_LOG=debug) for diagnostic output on stderr.
"#
    );
}

fn print_version() {
    println!("kb {}", env!("CARGO_PKG_VERSION"));
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        process::exit(0);
    }
    init_tracing();

    match args[1].as_str() {
        "-h" | "--help" | "help" => print_help(),
        "-V" | "--version" => print_version(),
        "train" => cmd_train(&args[2..]),
        "analyze" => cmd_analyze(&args[2..]),
        "decide" => cmd_decide(&args[2..]),
        "predict" => cmd_predict(&args[2..]),
        cmd => {
            eprintln!("Unknown command: {cmd}");
            eprintln!("Run `kb --help` for usage.");
            process::exit(1);
        }
    }
}
