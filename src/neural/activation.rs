//! Catalogue of scalar activation functions.

use std::fmt;

/// Registered activation functions.
///
/// The set is closed: an id that does not parse with [`Activation::from_id`]
/// is invalid everywhere, including in imported payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Activation {
    Linear,
    Relu,
    LeakyRelu,
    Sigmoid,
    Tanh,
}

impl Activation {
    /// Every registered activation, in display order
    pub const ALL: [Activation; 5] = [
        Activation::Linear,
        Activation::Relu,
        Activation::LeakyRelu,
        Activation::Sigmoid,
        Activation::Tanh,
    ];

    /// Stable id used in the wire format
    pub fn id(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Relu => "relu",
            Self::LeakyRelu => "lrelu",
            Self::Sigmoid => "sigmoid",
            Self::Tanh => "tanh",
        }
    }

    /// Look up an activation by id
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.id() == id)
    }

    /// Human readable name
    pub fn label(self) -> &'static str {
        match self {
            Self::Linear => "Linear",
            Self::Relu => "ReLU",
            Self::LeakyRelu => "Leaky ReLU",
            Self::Sigmoid => "Sigmoid",
            Self::Tanh => "Tanh",
        }
    }

    /// Short form for compact diagrams
    pub fn abbreviation(self) -> &'static str {
        match self {
            Self::Linear => "lin",
            Self::Relu => "ReLU",
            Self::LeakyRelu => "LReLU",
            Self::Sigmoid => "σ",
            Self::Tanh => "tanh",
        }
    }

    /// Apply the activation to a pre-activation value
    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::Linear => x,
            Self::Relu => x.max(0.0),
            Self::LeakyRelu => {
                if x > 0.0 {
                    x
                } else {
                    0.01 * x
                }
            }
            Self::Sigmoid => 1.0 / (1.0 + (-x.clamp(-500.0, 500.0)).exp()),
            Self::Tanh => x.tanh(),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_roundtrip() {
        for act in Activation::ALL {
            assert_eq!(Activation::from_id(act.id()), Some(act));
        }
    }

    #[test]
    fn test_unknown_ids_rejected() {
        assert_eq!(Activation::from_id("sin"), None);
        assert_eq!(Activation::from_id("cos"), None);
        assert_eq!(Activation::from_id("ReLU"), None);
        assert_eq!(Activation::from_id(""), None);
    }

    #[test]
    fn test_functions() {
        assert_eq!(Activation::Linear.apply(-3.5), -3.5);
        assert_eq!(Activation::Relu.apply(-2.0), 0.0);
        assert_eq!(Activation::Relu.apply(2.0), 2.0);
        assert_eq!(Activation::LeakyRelu.apply(-2.0), -0.02);
        assert_eq!(Activation::LeakyRelu.apply(4.0), 4.0);
        assert_eq!(Activation::Sigmoid.apply(0.0), 0.5);
        assert_eq!(Activation::Tanh.apply(0.0), 0.0);
    }

    #[test]
    fn test_sigmoid_is_clamped() {
        let low = Activation::Sigmoid.apply(-1e6);
        let high = Activation::Sigmoid.apply(1e6);
        assert!(low.is_finite() && low >= 0.0);
        assert_eq!(high, 1.0);
        assert_eq!(low, Activation::Sigmoid.apply(-500.0));
    }
}
