//! Safetensors persistence of a [`ModelSet`].
//!
//! One file holds both networks as F64 tensors (`pattern.*`, `move.*`) plus
//! string metadata. Writes go through a tmp file and a rename, so a crash never
//! leaves a torn model behind.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::Path;

use bytemuck::cast_slice;
use kb_core::Config;
use kb_models::{MovePredictor, PatternRecognizer};
use kb_nn::{Matrix, NetworkParameters};
use safetensors::tensor::{Dtype, TensorView};
use safetensors::{SafeTensorError, SafeTensors};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::ModelSet;

/// Value of the `format` metadata key.
pub const MODEL_FORMAT: &str = "kb_models_v1";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("safetensors: {0}")]
    Safetensors(#[from] SafeTensorError),
    #[error("malformed model file: {0}")]
    Malformed(String),
}

fn malformed(msg: impl Into<String>) -> StoreError {
    StoreError::Malformed(msg.into())
}

/// Flattened tensors of one network, keyed by `<prefix>.<name>`.
fn flatten(prefix: &str, p: &NetworkParameters) -> Vec<(String, Vec<usize>, Vec<f64>)> {
    vec![
        (
            format!("{prefix}.weights_ih"),
            vec![p.weights_ih.rows(), p.weights_ih.cols()],
            p.weights_ih.as_slice().to_vec(),
        ),
        (format!("{prefix}.bias_h"), vec![p.bias_h.len()], p.bias_h.clone()),
        (
            format!("{prefix}.weights_ho"),
            vec![p.weights_ho.rows(), p.weights_ho.cols()],
            p.weights_ho.as_slice().to_vec(),
        ),
        (format!("{prefix}.bias_o"), vec![p.bias_o.len()], p.bias_o.clone()),
    ]
}

pub fn to_bytes(models: &ModelSet) -> Result<Vec<u8>, StoreError> {
    let mut flat = flatten("pattern", models.pattern.network().parameters());
    flat.extend(flatten("move", models.moves.network().parameters()));

    let mut tensors: BTreeMap<String, TensorView<'_>> = BTreeMap::new();
    for (name, shape, data) in &flat {
        tensors.insert(
            name.clone(),
            TensorView::new(Dtype::F64, shape.clone(), cast_slice(data))?,
        );
    }

    let mut meta = HashMap::new();
    meta.insert("format".to_string(), MODEL_FORMAT.to_string());
    if let Some(a) = models.accuracy {
        meta.insert("accuracy".to_string(), a.to_string());
    }
    if let Some(ts) = &models.last_trained {
        meta.insert("last_trained".to_string(), ts.clone());
    }
    Ok(safetensors::serialize(&tensors, &Some(meta))?)
}

/// Persist `models` at `path` atomically.
pub fn save(path: impl AsRef<Path>, models: &ModelSet) -> Result<(), StoreError> {
    let path = path.as_ref();
    let bytes = to_bytes(models)?;
    kb_logging::write_atomic(path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "saved models");
    Ok(())
}

fn read_f64(st: &SafeTensors<'_>, name: &str, shape: &[usize]) -> Result<Vec<f64>, StoreError> {
    let t = st.tensor(name)?;
    if t.dtype() != Dtype::F64 {
        return Err(malformed(format!("{name}: dtype {:?}, expected F64", t.dtype())));
    }
    if t.shape() != shape {
        return Err(malformed(format!(
            "{name}: shape {:?}, expected {shape:?}",
            t.shape()
        )));
    }
    // Tensor data is not guaranteed to be 8-byte aligned inside the file buffer.
    Ok(t.data()
        .chunks_exact(8)
        .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
        .collect())
}

fn read_network(
    st: &SafeTensors<'_>,
    prefix: &str,
    (input, hidden, output): (usize, usize, usize),
) -> Result<NetworkParameters, StoreError> {
    let ih = read_f64(st, &format!("{prefix}.weights_ih"), &[hidden, input])?;
    let ho = read_f64(st, &format!("{prefix}.weights_ho"), &[output, hidden])?;
    let weights_ih = Matrix::from_vec(hidden, input, ih)
        .ok_or_else(|| malformed(format!("{prefix}.weights_ih: bad length")))?;
    let weights_ho = Matrix::from_vec(output, hidden, ho)
        .ok_or_else(|| malformed(format!("{prefix}.weights_ho: bad length")))?;
    Ok(NetworkParameters {
        weights_ih,
        bias_h: read_f64(st, &format!("{prefix}.bias_h"), &[hidden])?,
        weights_ho,
        bias_o: read_f64(st, &format!("{prefix}.bias_o"), &[output])?,
    })
}

/// Decode a model file produced by [`to_bytes`]. Learning rates and the label gate
/// come from `cfg`; they are not stored.
pub fn from_bytes(bytes: &[u8], cfg: &Config) -> Result<ModelSet, StoreError> {
    let (_, header) = SafeTensors::read_metadata(bytes)?;
    let meta = header.metadata().clone().unwrap_or_default();
    match meta.get("format").map(String::as_str) {
        Some(MODEL_FORMAT) => {}
        other => return Err(malformed(format!("format {other:?}, expected {MODEL_FORMAT}"))),
    }
    let accuracy = match meta.get("accuracy") {
        Some(s) => Some(
            s.parse::<f64>()
                .map_err(|e| malformed(format!("accuracy {s:?}: {e}")))?,
        ),
        None => None,
    };

    let st = SafeTensors::deserialize(bytes)?;
    let pattern = read_network(&st, "pattern", kb_models::PATTERN_DIMS)?;
    let moves = read_network(&st, "move", kb_models::MOVE_DIMS)?;

    let pattern = PatternRecognizer::from_parameters(pattern, cfg.network.pattern_learning_rate)
        .map_err(|e| malformed(format!("pattern: {e}")))?
        .with_gate(cfg.codec.label_confidence_gate);
    let moves = MovePredictor::from_parameters(moves, cfg.network.move_learning_rate)
        .map_err(|e| malformed(format!("move: {e}")))?;

    Ok(ModelSet {
        pattern,
        moves,
        accuracy,
        last_trained: meta.get("last_trained").cloned(),
    })
}

/// `Ok(None)` if nothing is stored at `path`, an error if the file is unreadable.
pub fn load(path: impl AsRef<Path>, cfg: &Config) -> Result<Option<ModelSet>, StoreError> {
    let bytes = match std::fs::read(path.as_ref()) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    from_bytes(&bytes, cfg).map(Some)
}

/// Stored models if present and readable, fresh ones otherwise.
pub fn load_or_init(path: impl AsRef<Path>, cfg: &Config) -> Result<ModelSet, kb_models::ModelError> {
    let path = path.as_ref();
    match load(path, cfg) {
        Ok(Some(m)) => {
            debug!(path = %path.display(), "loaded models");
            Ok(m)
        }
        Ok(None) => ModelSet::fresh(cfg),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "model file unreadable; starting from fresh weights");
            ModelSet::fresh(cfg)
        }
    }
}
