//! Built-in target functions to match.
//!
//! Each challenge pairs a target `f(x1, x2)` with display metadata and, where
//! one exists, a pre-authored network that reproduces it.

use crate::grid::{sample_grid, Grid};
use crate::neural::{Activation, Layer, Network, Neuron, INPUT_WIDTH};
use std::fmt;

/// How hard a challenge is expected to be
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        };
        f.write_str(label)
    }
}

/// A target function with metadata
pub struct Challenge {
    pub id: &'static str,
    pub name: &'static str,
    /// Formula as shown to the user
    pub formula: &'static str,
    pub difficulty: Difficulty,
    target: fn(f64, f64) -> f64,
    solution: Option<fn() -> Network>,
}

impl fmt::Debug for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Challenge")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("difficulty", &self.difficulty)
            .finish()
    }
}

impl Challenge {
    /// Evaluate the target function
    #[inline]
    pub fn target(&self, x1: f64, x2: f64) -> f64 {
        (self.target)(x1, x2)
    }

    /// Sample the target over the domain
    pub fn target_grid(&self, resolution: usize) -> Grid {
        sample_grid(resolution, self.target)
    }

    /// Pre-authored network reproducing the target, if any
    pub fn solution(&self) -> Option<Network> {
        self.solution.map(|build| build())
    }
}

/// All built-in challenges, easiest first
pub static CHALLENGES: [Challenge; 7] = [
    Challenge {
        id: "slope",
        name: "Slope",
        formula: "x1",
        difficulty: Difficulty::Easy,
        target: |x1, _| x1,
        solution: Some(slope_solution),
    },
    Challenge {
        id: "plane",
        name: "Tilted Plane",
        formula: "0.5·x1 − x2 + 1",
        difficulty: Difficulty::Easy,
        target: |x1, x2| 0.5 * x1 - x2 + 1.0,
        solution: Some(plane_solution),
    },
    Challenge {
        id: "ridge",
        name: "Ridge",
        formula: "max(0, x1 + x2)",
        difficulty: Difficulty::Easy,
        target: |x1, x2| (x1 + x2).max(0.0),
        solution: Some(ridge_solution),
    },
    Challenge {
        id: "cliff",
        name: "Soft Cliff",
        formula: "σ(2·x1)",
        difficulty: Difficulty::Medium,
        target: |x1, _| Activation::Sigmoid.apply(2.0 * x1),
        solution: Some(cliff_solution),
    },
    Challenge {
        id: "valley",
        name: "Valley",
        formula: "|x1|",
        difficulty: Difficulty::Medium,
        target: |x1, _| x1.abs(),
        solution: Some(valley_solution),
    },
    Challenge {
        id: "pyramid",
        name: "Pyramid",
        formula: "5 − |x1| − |x2|",
        difficulty: Difficulty::Hard,
        target: |x1, x2| 5.0 - x1.abs() - x2.abs(),
        solution: Some(pyramid_solution),
    },
    Challenge {
        id: "ring",
        name: "Ring",
        formula: "tanh(x1² + x2² − 9)",
        difficulty: Difficulty::Hard,
        target: |x1, x2| (x1 * x1 + x2 * x2 - 9.0).tanh(),
        solution: None,
    },
];

/// Look up a challenge by id
pub fn find(id: &str) -> Option<&'static Challenge> {
    CHALLENGES.iter().find(|c| c.id == id)
}

fn neuron(bias: f64, weights: &[f64]) -> Neuron {
    Neuron {
        bias,
        weights: weights.to_vec(),
    }
}

fn single_output(activation: Activation, bias: f64, weights: [f64; INPUT_WIDTH]) -> Network {
    Network {
        input_width: INPUT_WIDTH,
        layers: vec![Layer {
            activation,
            neurons: vec![neuron(bias, &weights)],
        }],
    }
}

fn slope_solution() -> Network {
    single_output(Activation::Linear, 0.0, [1.0, 0.0])
}

fn plane_solution() -> Network {
    single_output(Activation::Linear, 1.0, [0.5, -1.0])
}

fn ridge_solution() -> Network {
    single_output(Activation::Relu, 0.0, [1.0, 1.0])
}

fn cliff_solution() -> Network {
    single_output(Activation::Sigmoid, 0.0, [2.0, 0.0])
}

fn valley_solution() -> Network {
    Network {
        input_width: INPUT_WIDTH,
        layers: vec![
            Layer {
                activation: Activation::Relu,
                neurons: vec![neuron(0.0, &[1.0, 0.0]), neuron(0.0, &[-1.0, 0.0])],
            },
            Layer {
                activation: Activation::Linear,
                neurons: vec![neuron(0.0, &[1.0, 1.0])],
            },
        ],
    }
}

fn pyramid_solution() -> Network {
    Network {
        input_width: INPUT_WIDTH,
        layers: vec![
            Layer {
                activation: Activation::Relu,
                neurons: vec![
                    neuron(0.0, &[1.0, 0.0]),
                    neuron(0.0, &[-1.0, 0.0]),
                    neuron(0.0, &[0.0, 1.0]),
                    neuron(0.0, &[0.0, -1.0]),
                ],
            },
            Layer {
                activation: Activation::Linear,
                neurons: vec![neuron(5.0, &[-1.0, -1.0, -1.0, -1.0])],
            },
        ],
    }
}
