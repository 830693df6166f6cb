//! Forward propagation.
//!
//! Two paths share one weighted-sum routine so the scalar result is always
//! bit-identical to the output entry of the full trace.

use super::network::{InputValues, Network, Neuron};

/// Per-layer, per-neuron record of one forward pass.
///
/// Entry 0 of both vectors is the input vector.
#[derive(Clone, Debug, PartialEq)]
pub struct Trace {
    pub activations: Vec<Vec<f64>>,
    pub pre_activations: Vec<Vec<f64>>,
}

impl Trace {
    /// Activation of the output neuron
    pub fn output(&self) -> f64 {
        self.activations
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or(0.0)
    }
}

/// `bias + Σ weight_i * prev_i`, with missing weights counted as zero
#[inline]
fn weighted_sum(neuron: &Neuron, prev: &[f64]) -> f64 {
    let mut sum = neuron.bias;
    for (i, &a) in prev.iter().enumerate() {
        sum += neuron.weights.get(i).copied().unwrap_or(0.0) * a;
    }
    sum
}

/// Evaluate the network for one input point, keeping every intermediate value
pub fn evaluate_full(net: &Network, inputs: &InputValues) -> Trace {
    let mut activations = Vec::with_capacity(net.layer_count());
    let mut pre_activations = Vec::with_capacity(net.layer_count());
    activations.push(inputs.to_vec());
    pre_activations.push(inputs.to_vec());

    for layer in &net.layers {
        let prev = &activations[activations.len() - 1];
        let pre: Vec<f64> = layer.neurons.iter().map(|n| weighted_sum(n, prev)).collect();
        let act: Vec<f64> = pre.iter().map(|&z| layer.activation.apply(z)).collect();
        pre_activations.push(pre);
        activations.push(act);
    }

    Trace {
        activations,
        pre_activations,
    }
}

/// Evaluate the network at `(x1, x2)` and return only the output activation
pub fn evaluate_scalar(net: &Network, x1: f64, x2: f64) -> f64 {
    ScalarEvaluator::new(net).eval(x1, x2)
}

/// Reusable scratch space for repeated scalar evaluation of one network.
///
/// Buffers are sized once from the widest layer, so [`ScalarEvaluator::eval`]
/// performs no allocation.
pub struct ScalarEvaluator<'a> {
    net: &'a Network,
    current: Vec<f64>,
    next: Vec<f64>,
}

impl<'a> ScalarEvaluator<'a> {
    pub fn new(net: &'a Network) -> Self {
        let width = net.max_width();
        Self {
            net,
            current: Vec::with_capacity(width),
            next: Vec::with_capacity(width),
        }
    }

    /// Output activation at `(x1, x2)`
    #[inline]
    pub fn eval(&mut self, x1: f64, x2: f64) -> f64 {
        self.current.clear();
        self.current.push(x1);
        self.current.push(x2);
        // Extra input slots beyond the sampled plane read as zero
        self.current.resize(self.net.input_width, 0.0);

        for layer in &self.net.layers {
            self.next.clear();
            for neuron in &layer.neurons {
                let z = weighted_sum(neuron, &self.current);
                self.next.push(layer.activation.apply(z));
            }
            std::mem::swap(&mut self.current, &mut self.next);
        }

        self.current.first().copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::{Activation, Layer};

    fn identity_x1() -> Network {
        let mut net = Network::identity();
        net.layers[0].neurons[0].weights = vec![1.0, 0.0];
        net
    }

    #[test]
    fn test_identity_example() {
        let net = identity_x1();
        assert_eq!(evaluate_scalar(&net, 3.0, -2.0), 3.0);
        assert_eq!(evaluate_full(&net, &[3.0, -2.0]).output(), 3.0);
    }

    #[test]
    fn test_trace_layer_zero_is_input() {
        let net = identity_x1();
        let trace = evaluate_full(&net, &[0.25, 4.0]);
        assert_eq!(trace.activations[0], vec![0.25, 4.0]);
        assert_eq!(trace.pre_activations[0], vec![0.25, 4.0]);
        assert_eq!(trace.activations.len(), 2);
    }

    #[test]
    fn test_hidden_layer_trace() {
        let mut net = Network::identity();
        net.layers.insert(0, Layer::zeroed(Activation::Relu, 2, 2));
        net.layers[0].neurons[0].weights = vec![1.0, 0.0];
        net.layers[0].neurons[1].weights = vec![-1.0, 0.0];
        net.layers[1].neurons[0].weights = vec![1.0, 1.0];

        let trace = evaluate_full(&net, &[-3.0, 0.0]);
        assert_eq!(trace.pre_activations[1], vec![-3.0, 3.0]);
        assert_eq!(trace.activations[1], vec![0.0, 3.0]);
        assert_eq!(trace.output(), 3.0);
        assert_eq!(evaluate_scalar(&net, -3.0, 0.0), 3.0);
    }

    #[test]
    fn test_missing_weights_count_as_zero() {
        let mut net = Network::identity();
        net.layers[0].neurons[0].weights = vec![2.0];
        net.layers[0].neurons[0].bias = 1.0;
        assert_eq!(evaluate_scalar(&net, 3.0, 100.0), 7.0);
        assert_eq!(evaluate_full(&net, &[3.0, 100.0]).output(), 7.0);
    }

    #[test]
    fn test_evaluator_reuse_matches_fresh() {
        let mut net = Network::identity();
        net.layers.insert(0, Layer::zeroed(Activation::Tanh, 5, 2));
        for (i, n) in net.layers[0].neurons.iter_mut().enumerate() {
            n.weights = vec![0.3 * i as f64, -0.7];
            n.bias = 0.1;
        }
        net.layers[1].neurons[0].weights = vec![1.0, -1.0, 0.5, 0.25, 2.0];

        let mut evaluator = ScalarEvaluator::new(&net);
        for &(x1, x2) in &[(0.0, 0.0), (1.5, -2.5), (-5.0, 5.0)] {
            let fast = evaluator.eval(x1, x2);
            let full = evaluate_full(&net, &[x1, x2]).output();
            assert_eq!(fast.to_bits(), full.to_bits());
        }
    }
}
