//! Dense vector/matrix primitives used by the network.
//!
//! Everything is row-major `f64` and allocation happens only where a new vector is
//! returned. Shape checks here are `assert!`s: callers (the network) validate
//! shapes up front and return errors, so a failed assert is a bug.

use serde::{Deserialize, Serialize};

/// Lower/upper bound applied to sigmoid activations so they stay strictly inside (0,1).
pub const SIGMOID_EPS: f64 = 1e-12;

/// Row-major dense matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Returns `None` if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Option<Self> {
        if data.len() != rows * cols {
            return None;
        }
        Some(Self { rows, cols, data })
    }

    /// Fill from `f()` in row-major order.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut() -> f64) -> Self {
        let data = (0..rows * cols).map(|_| f()).collect();
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.cols + c]
    }

    pub fn row(&self, r: usize) -> &[f64] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// `self += scale * (a ⊗ b)`, where `a.len() == rows` and `b.len() == cols`.
    pub fn outer_add(&mut self, scale: f64, a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), self.rows, "outer_add: row vector length");
        assert_eq!(b.len(), self.cols, "outer_add: col vector length");
        for (r, &ar) in a.iter().enumerate() {
            let s = scale * ar;
            let row = &mut self.data[r * self.cols..(r + 1) * self.cols];
            for (w, &bc) in row.iter_mut().zip(b) {
                *w += s * bc;
            }
        }
    }
}

/// `m · x`.
pub fn mat_vec(m: &Matrix, x: &[f64]) -> Vec<f64> {
    assert_eq!(x.len(), m.cols, "mat_vec: input length");
    (0..m.rows)
        .map(|r| m.row(r).iter().zip(x).map(|(w, v)| w * v).sum())
        .collect()
}

/// `mᵀ · y`.
pub fn mat_t_vec(m: &Matrix, y: &[f64]) -> Vec<f64> {
    assert_eq!(y.len(), m.rows, "mat_t_vec: input length");
    let mut out = vec![0.0; m.cols];
    for (r, &yr) in y.iter().enumerate() {
        for (o, &w) in out.iter_mut().zip(m.row(r)) {
            *o += w * yr;
        }
    }
    out
}

pub fn add_bias(v: &mut [f64], bias: &[f64]) {
    assert_eq!(v.len(), bias.len(), "add_bias: length");
    for (x, b) in v.iter_mut().zip(bias) {
        *x += b;
    }
}

/// `v += scale * d`.
pub fn axpy(v: &mut [f64], scale: f64, d: &[f64]) {
    assert_eq!(v.len(), d.len(), "axpy: length");
    for (x, y) in v.iter_mut().zip(d) {
        *x += scale * y;
    }
}

/// Logistic function, clamped to `[SIGMOID_EPS, 1 - SIGMOID_EPS]`.
pub fn sigmoid(x: f64) -> f64 {
    let s = 1.0 / (1.0 + (-x).exp());
    s.clamp(SIGMOID_EPS, 1.0 - SIGMOID_EPS)
}

/// Derivative of the sigmoid expressed through its output `s = sigmoid(x)`.
pub fn sigmoid_derivative(s: f64) -> f64 {
    s * (1.0 - s)
}

pub fn map_sigmoid(v: &mut [f64]) {
    for x in v.iter_mut() {
        *x = sigmoid(*x);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mat_vec_matches_hand_computation() {
        // [[1,2,3],[4,5,6]] · [1,0,-1] = [-2,-2]
        let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(mat_vec(&m, &[1.0, 0.0, -1.0]), vec![-2.0, -2.0]);
        // transpose: [[1,4],[2,5],[3,6]] · [1,1] = [5,7,9]
        assert_eq!(mat_t_vec(&m, &[1.0, 1.0]), vec![5.0, 7.0, 9.0]);
    }

    #[test]
    fn from_vec_rejects_wrong_length() {
        assert!(Matrix::from_vec(2, 2, vec![0.0; 3]).is_none());
    }

    #[test]
    fn outer_add_is_rank_one_update() {
        let mut m = Matrix::zeros(2, 2);
        m.outer_add(0.5, &[1.0, 2.0], &[3.0, 4.0]);
        assert_eq!(m.as_slice(), &[1.5, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn sigmoid_is_strictly_inside_unit_interval() {
        assert_eq!(sigmoid(0.0), 0.5);
        for x in [-1.0e6, -800.0, -40.0, 40.0, 800.0, 1.0e6] {
            let s = sigmoid(x);
            assert!(s > 0.0 && s < 1.0, "sigmoid({x}) = {s}");
        }
        assert!((sigmoid_derivative(0.5) - 0.25).abs() < 1e-15);
    }

    #[test]
    fn bias_and_axpy() {
        let mut v = vec![1.0, 1.0];
        add_bias(&mut v, &[0.5, -0.5]);
        assert_eq!(v, vec![1.5, 0.5]);
        axpy(&mut v, 2.0, &[1.0, 1.0]);
        assert_eq!(v, vec![3.5, 2.5]);
    }
}
