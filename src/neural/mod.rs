//! Variable-topology feed-forward networks.
//!
//! Implements:
//! - The network data model and its structural invariants
//! - The activation catalogue
//! - Forward propagation (full trace and fast scalar path)
//! - Structural edits (add/remove layers and neurons)
//! - Interpolation between networks for the solution reveal

mod activation;
mod forward;
mod interpolate;
mod mutations;
mod network;

pub use activation::Activation;
pub use forward::{evaluate_full, evaluate_scalar, ScalarEvaluator, Trace};
pub use interpolate::{ease_out_cubic, interpolate, ArchitectureMismatch, RevealAnimation};
pub use mutations::{MutationError, NEW_LAYER_NEURONS};
pub use network::{InputValues, InvariantError, Layer, Network, Neuron, INPUT_WIDTH};
