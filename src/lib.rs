//! # nn-builder
//!
//! Engine behind an interactive feed-forward network sandbox: build a small
//! network by hand, watch its output as a heatmap over [-5, 5]², and match it
//! against target functions.
//!
//! ## Features
//!
//! - **Variable topology**: add and remove layers and neurons while every
//!   weight vector stays sized to its previous layer
//! - **Fast sampling**: allocation-free scalar forward pass, parallel grid
//!   sampling via Rayon
//! - **Forgiving editing**: text drafts hold half-typed numbers without
//!   touching the committed network
//! - **Safe import**: versioned JSON with full validation of untrusted input
//!
//! ## Quick Start
//!
//! ```rust
//! use nn_builder::{challenge, grid, score, Network};
//!
//! let mut net = Network::identity();
//! net.layers[0].neurons[0].weights = vec![1.0, 0.0];
//!
//! let slope = challenge::find("slope").unwrap();
//! let target = slope.target_grid(grid::GRID_RESOLUTION);
//! let output = grid::sample_network(&net, grid::GRID_RESOLUTION);
//!
//! assert_eq!(score::score(&output, &target), 100.0);
//! ```
//!
//! ## Editing session
//!
//! ```rust
//! use nn_builder::{Config, Sandbox};
//! use nn_builder::draft::ParameterAddress;
//!
//! let mut sandbox = Sandbox::new(Config::default()).unwrap();
//! sandbox.add_hidden_layer().unwrap();
//!
//! let bias = ParameterAddress::Bias { layer: 1, neuron: 0 };
//! sandbox.edit(bias, "-").unwrap();
//! assert!(sandbox.is_paused());
//!
//! sandbox.edit(bias, "-1.5").unwrap();
//! assert!(!sandbox.is_paused());
//! ```

pub mod challenge;
pub mod codec;
pub mod config;
pub mod draft;
pub mod grid;
pub mod neural;
pub mod sandbox;
pub mod score;

// Re-export main types
pub use config::Config;
pub use neural::{Activation, InputValues, Network};
pub use sandbox::Sandbox;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
