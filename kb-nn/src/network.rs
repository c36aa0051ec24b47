//! Single-hidden-layer feedforward network with sigmoid activations on both layers.
//!
//! Training is online (per-example) backpropagation on squared error. Inputs are
//! never padded or truncated here: a length mismatch is an error, and fixed-length
//! encoding is the feature codec's job.

use rand::distributions::Open01;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matrix::{
    add_bias, axpy, map_sigmoid, mat_t_vec, mat_vec, sigmoid_derivative, Matrix,
};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NnError {
    #[error("invalid network configuration: {0}")]
    Configuration(String),
    #[error("shape mismatch for {what}: got {got}, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
}

/// Weights and biases of one network: input→hidden and hidden→output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkParameters {
    /// hidden × input.
    pub weights_ih: Matrix,
    pub bias_h: Vec<f64>,
    /// output × hidden.
    pub weights_ho: Matrix,
    pub bias_o: Vec<f64>,
}

impl NetworkParameters {
    /// (input, hidden, output) implied by `weights_ih` / `weights_ho`, if all four
    /// tensors agree; otherwise a configuration error naming the first disagreement.
    pub fn dims(&self) -> Result<(usize, usize, usize), NnError> {
        let input = self.weights_ih.cols();
        let hidden = self.weights_ih.rows();
        let output = self.weights_ho.rows();
        if input == 0 || hidden == 0 || output == 0 {
            return Err(NnError::Configuration(format!(
                "layer sizes must be > 0 (input={input}, hidden={hidden}, output={output})"
            )));
        }
        if self.weights_ho.cols() != hidden {
            return Err(NnError::Configuration(format!(
                "weights_ho has {} cols, expected hidden={hidden}",
                self.weights_ho.cols()
            )));
        }
        if self.bias_h.len() != hidden {
            return Err(NnError::Configuration(format!(
                "bias_h has {} entries, expected hidden={hidden}",
                self.bias_h.len()
            )));
        }
        if self.bias_o.len() != output {
            return Err(NnError::Configuration(format!(
                "bias_o has {} entries, expected output={output}",
                self.bias_o.len()
            )));
        }
        Ok((input, hidden, output))
    }
}

/// One `(input, target)` training pair.
pub type Example = (Vec<f64>, Vec<f64>);

/// Summary of a `train_batch` call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrainStats {
    pub epochs: u32,
    pub examples: usize,
    /// Mean squared error over the examples of the last epoch (pre-update outputs).
    pub last_epoch_mse: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedforwardNetwork {
    input_size: usize,
    hidden_size: usize,
    output_size: usize,
    learning_rate: f64,
    params: NetworkParameters,
}

fn check_learning_rate(lr: f64) -> Result<(), NnError> {
    if !(lr.is_finite() && lr > 0.0) {
        return Err(NnError::Configuration(format!(
            "learning_rate must be finite and > 0, got {lr}"
        )));
    }
    Ok(())
}

/// Uniform draw from the open interval (-1, 1).
fn init_weight<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u: f64 = rng.sample(Open01);
    2.0 * u - 1.0
}

impl FeedforwardNetwork {
    /// Fresh network with weights and biases drawn from `rng`.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
        learning_rate: f64,
        rng: &mut R,
    ) -> Result<Self, NnError> {
        if input_size == 0 || hidden_size == 0 || output_size == 0 {
            return Err(NnError::Configuration(format!(
                "layer sizes must be > 0 (input={input_size}, hidden={hidden_size}, output={output_size})"
            )));
        }
        check_learning_rate(learning_rate)?;

        let weights_ih = Matrix::from_fn(hidden_size, input_size, || init_weight(rng));
        let bias_h = (0..hidden_size).map(|_| init_weight(rng)).collect();
        let weights_ho = Matrix::from_fn(output_size, hidden_size, || init_weight(rng));
        let bias_o = (0..output_size).map(|_| init_weight(rng)).collect();

        Ok(Self {
            input_size,
            hidden_size,
            output_size,
            learning_rate,
            params: NetworkParameters {
                weights_ih,
                bias_h,
                weights_ho,
                bias_o,
            },
        })
    }

    /// Rebuild a network from stored parameters. Shape disagreements are fatal.
    pub fn from_parameters(params: NetworkParameters, learning_rate: f64) -> Result<Self, NnError> {
        let (input_size, hidden_size, output_size) = params.dims()?;
        check_learning_rate(learning_rate)?;
        let all_finite = params
            .weights_ih
            .as_slice()
            .iter()
            .chain(&params.bias_h)
            .chain(params.weights_ho.as_slice())
            .chain(&params.bias_o)
            .all(|w| w.is_finite());
        if !all_finite {
            return Err(NnError::NonFinite("parameters"));
        }
        Ok(Self {
            input_size,
            hidden_size,
            output_size,
            learning_rate,
            params,
        })
    }

    /// Like `from_parameters`, but also requires the declared layer sizes.
    pub fn from_parameters_with_dims(
        params: NetworkParameters,
        dims: (usize, usize, usize),
        learning_rate: f64,
    ) -> Result<Self, NnError> {
        let got = params.dims()?;
        if got != dims {
            return Err(NnError::Configuration(format!(
                "parameters have shape {got:?}, expected {dims:?}"
            )));
        }
        Self::from_parameters(params, learning_rate)
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn parameters(&self) -> &NetworkParameters {
        &self.params
    }

    fn check_input(&self, input: &[f64]) -> Result<(), NnError> {
        if input.len() != self.input_size {
            return Err(NnError::ShapeMismatch {
                what: "input",
                got: input.len(),
                expected: self.input_size,
            });
        }
        if !input.iter().all(|x| x.is_finite()) {
            return Err(NnError::NonFinite("input"));
        }
        Ok(())
    }

    fn check_target(&self, target: &[f64]) -> Result<(), NnError> {
        if target.len() != self.output_size {
            return Err(NnError::ShapeMismatch {
                what: "target",
                got: target.len(),
                expected: self.output_size,
            });
        }
        if !target.iter().all(|x| x.is_finite()) {
            return Err(NnError::NonFinite("target"));
        }
        Ok(())
    }

    /// (hidden activations, output activations). Input must already be validated.
    fn forward(&self, input: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let p = &self.params;
        let mut hidden = mat_vec(&p.weights_ih, input);
        add_bias(&mut hidden, &p.bias_h);
        map_sigmoid(&mut hidden);

        let mut output = mat_vec(&p.weights_ho, &hidden);
        add_bias(&mut output, &p.bias_o);
        map_sigmoid(&mut output);
        (hidden, output)
    }

    /// Forward pass. Every output component lies in (0,1).
    pub fn predict(&self, input: &[f64]) -> Result<Vec<f64>, NnError> {
        self.check_input(input)?;
        Ok(self.forward(input).1)
    }

    /// One online backprop step; returns the squared error of the pre-update output.
    fn train_one(&mut self, input: &[f64], target: &[f64]) -> f64 {
        let (hidden, output) = self.forward(input);

        let mut sq_err = 0.0;
        let delta_o: Vec<f64> = output
            .iter()
            .zip(target)
            .map(|(&o, &t)| {
                let e = t - o;
                sq_err += e * e;
                e * sigmoid_derivative(o)
            })
            .collect();

        // Hidden error uses the weights before this step's update.
        let error_h = mat_t_vec(&self.params.weights_ho, &delta_o);
        let delta_h: Vec<f64> = error_h
            .iter()
            .zip(&hidden)
            .map(|(&e, &h)| e * sigmoid_derivative(h))
            .collect();

        let lr = self.learning_rate;
        let p = &mut self.params;
        p.weights_ho.outer_add(lr, &delta_o, &hidden);
        axpy(&mut p.bias_o, lr, &delta_o);
        p.weights_ih.outer_add(lr, &delta_h, input);
        axpy(&mut p.bias_h, lr, &delta_h);

        sq_err / self.output_size as f64
    }

    /// Train on `examples` for `epochs` passes, one update per example.
    ///
    /// Shapes are validated before any update, so on error the parameters are untouched.
    pub fn train_batch(&mut self, examples: &[Example], epochs: u32) -> Result<TrainStats, NnError> {
        for (x, t) in examples {
            self.check_input(x)?;
            self.check_target(t)?;
        }
        let mut stats = TrainStats {
            epochs,
            examples: examples.len(),
            last_epoch_mse: 0.0,
        };
        if examples.is_empty() {
            return Ok(stats);
        }
        for _ in 0..epochs {
            let mut total = 0.0;
            for (x, t) in examples {
                total += self.train_one(x, t);
            }
            stats.last_epoch_mse = total / examples.len() as f64;
        }
        if !stats.last_epoch_mse.is_finite() {
            return Err(NnError::NonFinite("training error"));
        }
        Ok(stats)
    }
}
