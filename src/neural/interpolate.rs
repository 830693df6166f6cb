//! Elementwise interpolation between networks of identical architecture,
//! and the reveal animation that drives it.

use super::network::Network;
use std::fmt;
use std::time::Duration;

/// The two networks do not share an architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchitectureMismatch;

impl fmt::Display for ArchitectureMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "networks have different architectures")
    }
}

impl std::error::Error for ArchitectureMismatch {}

impl Network {
    /// Same input width, activations, neuron counts and weight lengths
    pub fn same_architecture(&self, other: &Network) -> bool {
        self.input_width == other.input_width
            && self.layers.len() == other.layers.len()
            && self.layers.iter().zip(&other.layers).all(|(a, b)| {
                a.activation == b.activation
                    && a.neurons.len() == b.neurons.len()
                    && a
                        .neurons
                        .iter()
                        .zip(&b.neurons)
                        .all(|(n, m)| n.weights.len() == m.weights.len())
            })
    }
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Linearly interpolate every bias and weight from `start` to `end`
pub fn interpolate(start: &Network, end: &Network, t: f64) -> Result<Network, ArchitectureMismatch> {
    if !start.same_architecture(end) {
        return Err(ArchitectureMismatch);
    }

    let mut out = start.clone();
    for (layer, target) in out.layers.iter_mut().zip(&end.layers) {
        for (neuron, goal) in layer.neurons.iter_mut().zip(&target.neurons) {
            neuron.bias = lerp(neuron.bias, goal.bias, t);
            for (w, &g) in neuron.weights.iter_mut().zip(&goal.weights) {
                *w = lerp(*w, g, t);
            }
        }
    }

    Ok(out)
}

/// Cubic ease-out: fast start, gentle landing
#[inline]
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Animates a network towards a target over a fixed duration.
///
/// The caller advances it once per frame with the elapsed frame time and
/// installs the returned network. Dropping it cancels the animation.
#[derive(Clone, Debug)]
pub struct RevealAnimation {
    start: Network,
    end: Network,
    duration: Duration,
    elapsed: Duration,
}

impl RevealAnimation {
    /// Start from `current`, or from a zeroed copy of `target` when the
    /// architectures differ
    pub fn new(current: &Network, target: Network, duration: Duration) -> Self {
        let start = if current.same_architecture(&target) {
            current.clone()
        } else {
            target.zeroed_like()
        };

        Self {
            start,
            end: target,
            duration,
            elapsed: Duration::ZERO,
        }
    }

    /// Raw progress in [0, 1]
    pub fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    /// Network the animation starts from
    pub fn start(&self) -> &Network {
        &self.start
    }

    /// Network the animation lands on
    pub fn target(&self) -> &Network {
        &self.end
    }

    /// Network for the current progress; the exact target once finished
    pub fn frame(&self) -> Network {
        if self.is_finished() {
            return self.end.clone();
        }
        let eased = ease_out_cubic(self.progress());
        interpolate(&self.start, &self.end, eased).unwrap_or_else(|_| self.end.clone())
    }

    /// Advance by one frame's worth of time and return the frame to display
    pub fn advance(&mut self, dt: Duration) -> Network {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::{Activation, Layer};

    fn target() -> Network {
        let mut net = Network::identity().add_hidden_layer().unwrap();
        for n in &mut net.layers[0].neurons {
            n.weights = vec![2.0, -4.0];
            n.bias = 1.0;
        }
        net.layers[1].neurons[0].weights = vec![1.0, 1.0, 1.0];
        net
    }

    #[test]
    fn test_interpolate_midpoint() {
        let end = target();
        let start = end.zeroed_like();
        let mid = interpolate(&start, &end, 0.5).unwrap();

        assert_eq!(mid.layers[0].neurons[0].weights, vec![1.0, -2.0]);
        assert_eq!(mid.layers[0].neurons[0].bias, 0.5);
        assert_eq!(mid.layers[1].neurons[0].weights, vec![0.5, 0.5, 0.5]);
        assert_eq!(mid.input_width, end.input_width);
    }

    #[test]
    fn test_interpolate_endpoints() {
        let end = target();
        let start = end.zeroed_like();
        assert_eq!(interpolate(&start, &end, 0.0).unwrap(), start);
        assert_eq!(interpolate(&start, &end, 1.0).unwrap(), end);
    }

    #[test]
    fn test_interpolate_rejects_mismatch() {
        let end = target();
        assert_eq!(
            interpolate(&Network::identity(), &end, 0.5),
            Err(ArchitectureMismatch)
        );

        let mut other = end.clone();
        other.layers[0].activation = Activation::Tanh;
        assert!(!end.same_architecture(&other));
    }

    #[test]
    fn test_easing() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert_eq!(ease_out_cubic(0.5), 0.875);
        assert_eq!(ease_out_cubic(2.0), 1.0);
    }

    #[test]
    fn test_reveal_substitutes_zeroed_start() {
        let anim = RevealAnimation::new(&Network::identity(), target(), Duration::from_millis(100));
        assert_eq!(anim.start(), &target().zeroed_like());
        assert_eq!(anim.frame(), target().zeroed_like());
    }

    #[test]
    fn test_reveal_lands_exactly_on_target() {
        let mut start = target();
        start.layers.insert(0, Layer::zeroed(Activation::Relu, 1, 2));
        let mut anim = RevealAnimation::new(&start, target(), Duration::from_millis(90));

        let mut frames = 0;
        let mut last = anim.frame();
        while !anim.is_finished() {
            last = anim.advance(Duration::from_millis(16));
            frames += 1;
        }

        assert_eq!(frames, 6);
        assert_eq!(last, target());
    }

    #[test]
    fn test_reveal_zero_duration() {
        let anim = RevealAnimation::new(&Network::identity(), target(), Duration::ZERO);
        assert!(anim.is_finished());
        assert_eq!(anim.frame(), target());
    }
}
