//! Structural edits.
//!
//! Every operation takes a network and returns a new one in which each
//! neuron's weight vector still matches its previous layer's width. Global
//! size limits are not enforced here; callers check the candidate with
//! [`crate::config::LimitsConfig::check`] before committing it.

use super::activation::Activation;
use super::network::{Layer, Network, Neuron};
use std::fmt;

/// Neurons in a freshly inserted hidden layer
pub const NEW_LAYER_NEURONS: usize = 3;

/// A structural edit that is not allowed on the given network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationError {
    /// The input and output layers cannot be removed or resized
    ProtectedLayer { layer: usize },
    /// A layer must keep at least one neuron
    LastNeuron { layer: usize },
    LayerOutOfRange { layer: usize, count: usize },
    NeuronOutOfRange { layer: usize, neuron: usize, count: usize },
    /// The network has no output layer to insert before
    NoOutputLayer,
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProtectedLayer { layer } => {
                write!(f, "layer {} is the input or output layer and cannot be edited", layer)
            }
            Self::LastNeuron { layer } => {
                write!(f, "layer {} must keep at least one neuron", layer)
            }
            Self::LayerOutOfRange { layer, count } => {
                write!(f, "layer {} does not exist (network has {} layers)", layer, count)
            }
            Self::NeuronOutOfRange { layer, neuron, count } => write!(
                f,
                "neuron {} does not exist in layer {} ({} neurons)",
                neuron, layer, count
            ),
            Self::NoOutputLayer => write!(f, "network has no output layer"),
        }
    }
}

impl std::error::Error for MutationError {}

impl Network {
    /// Full index of a hidden layer, or why it cannot be edited
    fn hidden_layer_index(&self, layer: usize) -> Result<usize, MutationError> {
        if layer >= self.layer_count() {
            return Err(MutationError::LayerOutOfRange {
                layer,
                count: self.layer_count(),
            });
        }
        if layer == 0 || layer == self.output_index() {
            return Err(MutationError::ProtectedLayer { layer });
        }
        Ok(layer)
    }

    /// Insert a ReLU layer of three zero neurons before the output layer.
    ///
    /// The output neurons are reset to three zero weights; their previous
    /// weights are discarded.
    pub fn add_hidden_layer(&self) -> Result<Network, MutationError> {
        let output = self
            .layers
            .len()
            .checked_sub(1)
            .ok_or(MutationError::NoOutputLayer)?;
        let mut net = self.clone();
        let prev_width = net.width_of(output);

        net.layers.insert(
            output,
            Layer::zeroed(Activation::Relu, NEW_LAYER_NEURONS, prev_width),
        );
        for neuron in &mut net.layers[output + 1].neurons {
            neuron.weights = vec![0.0; NEW_LAYER_NEURONS];
        }

        Ok(net)
    }

    /// Append a zero neuron to hidden layer `layer` and give every neuron of
    /// the following layer an extra zero weight
    pub fn add_neuron(&self, layer: usize) -> Result<Network, MutationError> {
        let layer = self.hidden_layer_index(layer)?;
        let mut net = self.clone();
        let prev_width = net.width_of(layer - 1);

        net.layers[layer - 1].neurons.push(Neuron::zeroed(prev_width));
        for neuron in &mut net.layers[layer].neurons {
            neuron.weights.push(0.0);
        }

        Ok(net)
    }

    /// Remove hidden layer `layer`.
    ///
    /// The following layer's neurons get fresh zero weight vectors sized to
    /// their new previous layer.
    pub fn remove_layer(&self, layer: usize) -> Result<Network, MutationError> {
        let layer = self.hidden_layer_index(layer)?;
        let mut net = self.clone();

        net.layers.remove(layer - 1);
        let prev_width = net.width_of(layer - 1);
        if let Some(next) = net.layer_mut(layer) {
            for neuron in &mut next.neurons {
                neuron.weights = vec![0.0; prev_width];
            }
        }

        Ok(net)
    }

    /// Remove neuron `neuron` from hidden layer `layer` along with the
    /// matching weight of every neuron in the following layer
    pub fn remove_neuron(&self, layer: usize, neuron: usize) -> Result<Network, MutationError> {
        let layer = self.hidden_layer_index(layer)?;
        let count = self.width_of(layer);
        if neuron >= count {
            return Err(MutationError::NeuronOutOfRange { layer, neuron, count });
        }
        if count == 1 {
            return Err(MutationError::LastNeuron { layer });
        }

        let mut net = self.clone();
        net.layers[layer - 1].neurons.remove(neuron);
        for next in &mut net.layers[layer].neurons {
            if neuron < next.weights.len() {
                next.weights.remove(neuron);
            }
        }

        Ok(net)
    }

    /// Change the activation of a non-input layer
    pub fn set_activation(
        &self,
        layer: usize,
        activation: Activation,
    ) -> Result<Network, MutationError> {
        if layer == 0 {
            return Err(MutationError::ProtectedLayer { layer });
        }
        let mut net = self.clone();
        let count = net.layer_count();
        let target = net
            .layer_mut(layer)
            .ok_or(MutationError::LayerOutOfRange { layer, count })?;
        target.activation = activation;
        Ok(net)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_layer() -> Network {
        let mut net = Network::identity();
        net.layers[0].neurons[0].weights = vec![1.0, 0.0];
        net.add_hidden_layer().unwrap()
    }

    #[test]
    fn test_add_hidden_layer_on_identity() {
        let mut net = Network::identity();
        net.layers[0].neurons[0].weights = vec![1.0, 0.5];

        let grown = net.add_hidden_layer().unwrap();
        assert_eq!(grown.layer_count(), 3);

        let hidden = grown.layer(1).unwrap();
        assert_eq!(hidden.activation, Activation::Relu);
        assert_eq!(hidden.width(), 3);
        assert!(hidden.neurons.iter().all(|n| n.weights == vec![0.0, 0.0] && n.bias == 0.0));

        let output = grown.layer(2).unwrap();
        assert_eq!(output.width(), 1);
        assert_eq!(output.neurons[0].weights, vec![0.0, 0.0, 0.0]);
        assert!(grown.check_invariants().is_ok());
    }

    #[test]
    fn test_add_hidden_layer_keeps_output_bias_and_activation() {
        let mut net = Network::identity();
        net.layers[0].activation = Activation::Sigmoid;
        net.layers[0].neurons[0].bias = 2.0;

        let grown = net.add_hidden_layer().unwrap();
        let output = grown.layer(2).unwrap();
        assert_eq!(output.activation, Activation::Sigmoid);
        assert_eq!(output.neurons[0].bias, 2.0);
    }

    #[test]
    fn test_add_hidden_layer_without_output_layer() {
        let net = Network {
            input_width: 2,
            layers: Vec::new(),
        };
        assert_eq!(net.add_hidden_layer(), Err(MutationError::NoOutputLayer));
    }

    #[test]
    fn test_add_neuron() {
        let net = three_layer();
        let grown = net.add_neuron(1).unwrap();

        assert_eq!(grown.width_of(1), 4);
        assert_eq!(grown.layer(1).unwrap().neurons[3], Neuron::zeroed(2));
        assert_eq!(grown.layer(2).unwrap().neurons[0].weights.len(), 4);
        assert!(grown.check_invariants().is_ok());
    }

    #[test]
    fn test_add_neuron_protected_layers() {
        let net = three_layer();
        assert_eq!(net.add_neuron(0), Err(MutationError::ProtectedLayer { layer: 0 }));
        assert_eq!(net.add_neuron(2), Err(MutationError::ProtectedLayer { layer: 2 }));
        assert!(matches!(net.add_neuron(9), Err(MutationError::LayerOutOfRange { .. })));
    }

    #[test]
    fn test_remove_neuron_drops_matching_weight() {
        let mut net = three_layer();
        net.layers[1].neurons[0].weights = vec![10.0, 20.0, 30.0];

        let shrunk = net.remove_neuron(1, 1).unwrap();
        assert_eq!(shrunk.width_of(1), 2);
        assert_eq!(shrunk.layer(2).unwrap().neurons[0].weights, vec![10.0, 30.0]);
        assert!(shrunk.check_invariants().is_ok());
    }

    #[test]
    fn test_remove_last_neuron_rejected() {
        let net = three_layer();
        let net = net.remove_neuron(1, 0).unwrap();
        let net = net.remove_neuron(1, 0).unwrap();
        assert_eq!(net.width_of(1), 1);
        assert_eq!(net.remove_neuron(1, 0), Err(MutationError::LastNeuron { layer: 1 }));
    }

    #[test]
    fn test_remove_neuron_out_of_range() {
        let net = three_layer();
        assert!(matches!(
            net.remove_neuron(1, 3),
            Err(MutationError::NeuronOutOfRange { layer: 1, neuron: 3, count: 3 })
        ));
    }

    #[test]
    fn test_add_then_remove_neuron_restores_count() {
        let net = three_layer();
        let grown = net.add_neuron(1).unwrap();
        let restored = grown.remove_neuron(1, 3).unwrap();
        assert_eq!(restored.width_of(1), net.width_of(1));
        assert!(restored.check_invariants().is_ok());
        assert_eq!(restored, net);
    }

    #[test]
    fn test_remove_layer_resets_next_weights() {
        let net = three_layer().add_hidden_layer().unwrap();
        assert_eq!(net.layer_count(), 4);

        let mut net = net.add_neuron(2).unwrap();
        net.layers[2].neurons[0].weights = vec![1.0, 2.0, 3.0, 4.0];

        let removed = net.remove_layer(2).unwrap();
        assert_eq!(removed.layer_count(), 3);
        assert_eq!(removed.layer(2).unwrap().neurons[0].weights, vec![0.0; 3]);
        assert!(removed.check_invariants().is_ok());
    }

    #[test]
    fn test_remove_only_hidden_layer() {
        let net = three_layer();
        let removed = net.remove_layer(1).unwrap();
        assert_eq!(removed.layer_count(), 2);
        assert_eq!(removed.layer(1).unwrap().neurons[0].weights, vec![0.0, 0.0]);
        assert!(removed.check_invariants().is_ok());
    }

    #[test]
    fn test_remove_layer_protected() {
        let net = three_layer();
        assert_eq!(net.remove_layer(0), Err(MutationError::ProtectedLayer { layer: 0 }));
        assert_eq!(net.remove_layer(2), Err(MutationError::ProtectedLayer { layer: 2 }));
    }

    #[test]
    fn test_set_activation() {
        let net = three_layer();
        let changed = net.set_activation(2, Activation::Tanh).unwrap();
        assert_eq!(changed.layer(2).unwrap().activation, Activation::Tanh);
        assert!(net.set_activation(0, Activation::Tanh).is_err());
        assert!(net.set_activation(3, Activation::Tanh).is_err());
    }
}
