//! kb-nn: Dense matrix primitives + a from-scratch feedforward network.
//!
//! Two fixed architectures use this crate (12→24→8 and 18→36→6); nothing here is
//! meant as a general ML framework.

pub mod matrix;
pub mod network;

pub use matrix::Matrix;
pub use network::{Example, FeedforwardNetwork, NetworkParameters, NnError, TrainStats};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
