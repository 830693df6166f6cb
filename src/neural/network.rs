//! Network structure and invariants.
//!
//! Layer indices in the public API use full-network numbering: index 0 is the
//! input layer, which only has a width, and index `layer_count() - 1` is the
//! single-neuron output layer. `Network::layers` stores the non-input layers,
//! so full index `l` lives at `layers[l - 1]`.

use super::activation::Activation;
use std::fmt;

/// Width of the input layer
pub const INPUT_WIDTH: usize = 2;

/// The current sandbox input point
pub type InputValues = [f64; INPUT_WIDTH];

/// Neurons created by structural edits start at zero
#[derive(Clone, Debug, PartialEq)]
pub struct Neuron {
    pub bias: f64,
    /// One weight per neuron of the previous layer
    pub weights: Vec<f64>,
}

impl Neuron {
    /// Zero bias and `width` zero weights
    pub fn zeroed(width: usize) -> Self {
        Self {
            bias: 0.0,
            weights: vec![0.0; width],
        }
    }
}

/// A hidden or output layer
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub activation: Activation,
    pub neurons: Vec<Neuron>,
}

impl Layer {
    /// A layer of `count` zero neurons fed by `prev_width` inputs
    pub fn zeroed(activation: Activation, count: usize, prev_width: usize) -> Self {
        Self {
            activation,
            neurons: (0..count).map(|_| Neuron::zeroed(prev_width)).collect(),
        }
    }

    /// Number of neurons
    #[inline]
    pub fn width(&self) -> usize {
        self.neurons.len()
    }
}

/// Variable-topology feed-forward network
#[derive(Clone, Debug, PartialEq)]
pub struct Network {
    /// Width of layer 0
    pub input_width: usize,
    /// Hidden layers followed by the output layer
    pub layers: Vec<Layer>,
}

impl Default for Network {
    fn default() -> Self {
        Self::identity()
    }
}

impl Network {
    /// The startup network: two inputs feeding one linear output neuron,
    /// with zero weights and zero bias
    pub fn identity() -> Self {
        Self {
            input_width: INPUT_WIDTH,
            layers: vec![Layer::zeroed(Activation::Linear, 1, INPUT_WIDTH)],
        }
    }

    /// Layer count including the input layer
    #[inline]
    pub fn layer_count(&self) -> usize {
        self.layers.len() + 1
    }

    /// Full index of the output layer
    #[inline]
    pub fn output_index(&self) -> usize {
        self.layers.len()
    }

    /// Non-input layer at full index `index`
    pub fn layer(&self, index: usize) -> Option<&Layer> {
        index.checked_sub(1).and_then(|i| self.layers.get(i))
    }

    /// Mutable access to the non-input layer at full index `index`
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        index.checked_sub(1).and_then(move |i| self.layers.get_mut(i))
    }

    /// Width of the layer at full index `index` (input width for 0)
    pub fn width_of(&self, index: usize) -> usize {
        if index == 0 {
            self.input_width
        } else {
            self.layer(index).map_or(0, Layer::width)
        }
    }

    /// Widest layer, input layer included
    pub fn max_width(&self) -> usize {
        self.layers
            .iter()
            .map(Layer::width)
            .fold(self.input_width, usize::max)
    }

    /// Total number of weights across all non-input layers
    pub fn total_weights(&self) -> usize {
        self.layers
            .iter()
            .flat_map(|l| &l.neurons)
            .map(|n| n.weights.len())
            .sum()
    }

    /// Total number of parameters (weights + biases)
    pub fn parameter_count(&self) -> usize {
        self.total_weights() + self.layers.iter().map(Layer::width).sum::<usize>()
    }

    /// Hidden neuron count (complexity metric)
    pub fn complexity(&self) -> usize {
        self.layers[..self.layers.len().saturating_sub(1)]
            .iter()
            .map(Layer::width)
            .sum()
    }

    /// Check if every parameter is finite
    pub fn is_valid(&self) -> bool {
        self.layers.iter().flat_map(|l| &l.neurons).all(|n| {
            n.bias.is_finite() && n.weights.iter().all(|w| w.is_finite())
        })
    }

    /// Same architecture with every bias and weight set to zero
    pub fn zeroed_like(&self) -> Self {
        let mut prev = self.input_width;
        let layers = self
            .layers
            .iter()
            .map(|layer| {
                let zeroed = Layer::zeroed(layer.activation, layer.width(), prev);
                prev = layer.width();
                zeroed
            })
            .collect();

        Self {
            input_width: self.input_width,
            layers,
        }
    }

    /// Verify the structural invariants: at least one non-input layer, every
    /// layer non-empty, a single output neuron, and every weight vector sized
    /// to the previous layer's width
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.layers.is_empty() {
            return Err(InvariantError::NoOutputLayer);
        }

        let mut prev = self.input_width;
        for (i, layer) in self.layers.iter().enumerate() {
            let index = i + 1;
            if layer.neurons.is_empty() {
                return Err(InvariantError::EmptyLayer { layer: index });
            }
            for (n, neuron) in layer.neurons.iter().enumerate() {
                if neuron.weights.len() != prev {
                    return Err(InvariantError::WeightCount {
                        layer: index,
                        neuron: n,
                        expected: prev,
                        found: neuron.weights.len(),
                    });
                }
            }
            prev = layer.width();
        }

        let outputs = self.layers[self.layers.len() - 1].width();
        if outputs != 1 {
            return Err(InvariantError::OutputWidth { found: outputs });
        }

        Ok(())
    }
}

/// A structural invariant of [`Network`] does not hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantError {
    NoOutputLayer,
    EmptyLayer { layer: usize },
    OutputWidth { found: usize },
    WeightCount { layer: usize, neuron: usize, expected: usize, found: usize },
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOutputLayer => write!(f, "network has no output layer"),
            Self::EmptyLayer { layer } => write!(f, "layer {} has no neurons", layer),
            Self::OutputWidth { found } => {
                write!(f, "output layer must have exactly 1 neuron, found {}", found)
            }
            Self::WeightCount { layer, neuron, expected, found } => write!(
                f,
                "layer {} neuron {} has {} weights, expected {}",
                layer, neuron, found, expected
            ),
        }
    }
}

impl std::error::Error for InvariantError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_network() {
        let net = Network::identity();
        assert_eq!(net.layer_count(), 2);
        assert_eq!(net.output_index(), 1);
        assert_eq!(net.width_of(0), 2);
        assert_eq!(net.width_of(1), 1);
        assert_eq!(net.total_weights(), 2);
        assert_eq!(net.parameter_count(), 3);
        assert_eq!(net.complexity(), 0);
        assert_eq!(net.layers[0].activation, Activation::Linear);
        assert!(net.check_invariants().is_ok());
    }

    #[test]
    fn test_layer_indexing() {
        let net = Network::identity();
        assert!(net.layer(0).is_none());
        assert!(net.layer(1).is_some());
        assert!(net.layer(2).is_none());
        assert_eq!(net.width_of(7), 0);
    }

    #[test]
    fn test_invariant_weight_count() {
        let mut net = Network::identity();
        net.layers[0].neurons[0].weights.push(1.0);

        assert_eq!(
            net.check_invariants(),
            Err(InvariantError::WeightCount { layer: 1, neuron: 0, expected: 2, found: 3 })
        );
    }

    #[test]
    fn test_invariant_output_width() {
        let mut net = Network::identity();
        net.layers[0].neurons.push(Neuron::zeroed(2));
        assert_eq!(net.check_invariants(), Err(InvariantError::OutputWidth { found: 2 }));
    }

    #[test]
    fn test_zeroed_like_keeps_shape() {
        let mut net = Network::identity();
        net.layers.insert(0, Layer::zeroed(Activation::Tanh, 4, 2));
        net.layers[1].neurons[0].weights = vec![1.0, 2.0, 3.0, 4.0];
        net.layers[1].neurons[0].bias = 0.5;

        let zeroed = net.zeroed_like();
        assert!(zeroed.check_invariants().is_ok());
        assert_eq!(zeroed.layers[0].activation, Activation::Tanh);
        assert_eq!(zeroed.layers[1].neurons[0].weights, vec![0.0; 4]);
        assert_eq!(zeroed.layers[1].neurons[0].bias, 0.0);
    }

    #[test]
    fn test_validity() {
        let mut net = Network::identity();
        assert!(net.is_valid());
        net.layers[0].neurons[0].bias = f64::NAN;
        assert!(!net.is_valid());
    }
}
